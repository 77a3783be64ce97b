use crate::ipc::error::{err, ok};
use crate::ipc::handlers::search::search_payload;
use crate::ipc::handlers::setup::load_catalog_settings;
use crate::ipc::types::{AppState, Request};
use crate::render;
use crate::search::QueryState;
use crate::store::{self, Catalog};
use serde_json::json;
use std::path::Path;
use tracing::{error, info};

/// Load the full lesson list, once per call, and keep only publishable
/// linked lessons. Source: an explicit file path, an explicit endpoint, or
/// the configured lessons endpoint, in that order. No retry on failure.
async fn handle_catalog_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.debounce_deadline = None;

    let path = req.params.get("path").and_then(|v| v.as_str());
    let endpoint = req
        .params
        .get("endpoint")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .or_else(|| load_catalog_settings(state.db.as_ref()).lessons_endpoint);

    let records = match (path, endpoint) {
        (Some(p), _) => store::read_records(Path::new(p)),
        (None, Some(ep)) => store::fetch_records(&state.http, &ep).await,
        (None, None) => {
            return err(
                &req.id,
                "bad_params",
                "no lessons endpoint configured; pass params.endpoint or set lessonsEndpoint",
                None,
            )
        }
    };

    match records {
        Ok(records) => {
            let total = records.len();
            let catalog = Catalog::from_records(records);
            info!(
                "loaded lesson catalog: {} publishable of {} fetched",
                catalog.len(),
                total
            );
            state.query = QueryState::default();
            let payload = search_payload(&catalog, &state.query);
            state.catalog = Some(catalog);
            ok(&req.id, payload)
        }
        Err(e) => {
            error!("failed to load lessons: {e}");
            err(
                &req.id,
                "fetch_failed",
                e.to_string(),
                Some(json!({ "html": render::error_html() })),
            )
        }
    }
}

/// Markup the UI swaps in around the load lifecycle: the loading state goes
/// up before `catalog.load` is awaited.
fn handle_render_placeholders(req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "loadingHtml": render::loading_html(),
            "errorHtml": render::error_html(),
            "emptyHtml": render::empty_html(),
        }),
    )
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "catalog.load" => Some(handle_catalog_load(state, req).await),
        "render.placeholders" => Some(handle_render_placeholders(req)),
        _ => None,
    }
}
