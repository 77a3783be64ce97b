use crate::ipc::error::{err, event, ok};
use crate::ipc::types::{AppState, Request};
use crate::render;
use crate::search::{self, Facet, QueryState};
use crate::store::Catalog;
use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;

/// Quiet period for keystroke coalescing.
pub const DEBOUNCE_MS: u64 = 300;

/// One full recomputation: derived view, rendered hits, and all three facet
/// panels, against the current query state.
pub fn search_payload(catalog: &Catalog, state: &QueryState) -> serde_json::Value {
    let view = search::derive_view(&catalog.lessons, state);
    let count = view.len();

    let mut facets = serde_json::Map::new();
    for facet in Facet::ALL {
        let counts = search::facet_counts(&catalog.lessons, state, facet);
        facets.insert(
            facet.key().to_string(),
            json!({
                "counts": counts,
                "html": render::facet_html(&counts),
            }),
        );
    }

    json!({
        "count": count,
        "countLabel": render::result_count_label(count),
        "hitsHtml": render::hits_html(&view, &state.query),
        "facets": facets,
        "state": state,
    })
}

fn parse_state(req: &Request) -> Result<QueryState, serde_json::Value> {
    let Some(raw) = req.params.get("state") else {
        return Err(err(&req.id, "bad_params", "missing state", None));
    };
    serde_json::from_value(raw.clone())
        .map_err(|e| err(&req.id, "bad_params", format!("invalid state: {e}"), None))
}

fn catalog<'a>(state: &'a AppState, req: &Request) -> Result<&'a Catalog, serde_json::Value> {
    state
        .catalog
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_catalog", "load the catalog first", None))
}

/// Checkbox toggle, sort change, and similar interactions: replace the whole
/// query state, recompute immediately.
fn handle_search_sync(state: &mut AppState, req: &Request) -> serde_json::Value {
    let next = match parse_state(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    state.query = next;
    // A synchronous recomputation supersedes any staged keystroke.
    state.debounce_deadline = None;
    match catalog(state, req) {
        Ok(cat) => ok(&req.id, search_payload(cat, &state.query)),
        Err(resp) => resp,
    }
}

/// A keystroke: stage the state and re-arm the quiet-period deadline. The
/// recomputation fires from the event loop once input stops arriving.
fn handle_search_input(state: &mut AppState, req: &Request) -> serde_json::Value {
    let next = match parse_state(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Err(resp) = catalog(state, req) {
        return resp;
    }
    state.query = next;
    state.debounce_deadline = Some(Instant::now() + Duration::from_millis(DEBOUNCE_MS));
    ok(
        &req.id,
        json!({ "pending": true, "debounceMs": DEBOUNCE_MS }),
    )
}

fn handle_search_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.query.clear_filters();
    state.debounce_deadline = None;
    match catalog(state, req) {
        Ok(cat) => ok(&req.id, search_payload(cat, &state.query)),
        Err(resp) => resp,
    }
}

/// Called by the event loop when the quiet period elapses: exactly one
/// recomputation for the last staged state, pushed as an event.
pub fn debounce_fire(state: &mut AppState) -> Option<serde_json::Value> {
    state.debounce_deadline = None;
    let cat = state.catalog.as_ref()?;
    Some(event("search.results", search_payload(cat, &state.query)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "search.sync" => Some(handle_search_sync(state, req)),
        "search.input" => Some(handle_search_input(state, req)),
        "search.clear" => Some(handle_search_clear(state, req)),
        _ => None,
    }
}
