mod error;
mod handlers;
mod router;
mod types;

pub use handlers::search::debounce_fire;
pub use router::handle_request;
pub use types::{AppState, Request};
