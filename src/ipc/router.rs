use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

pub async fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    if let Some(resp) = handlers::core::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::setup::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::catalog::try_handle(state, &req).await {
        return resp;
    }
    if let Some(resp) = handlers::search::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::lesson::try_handle(state, &req).await {
        return resp;
    }
    if let Some(resp) = handlers::onboarding::try_handle(state, &req) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
