use crate::auth::{AuthGate, HttpAuthGate};
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::setup::load_catalog_settings;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn gate(state: &AppState) -> HttpAuthGate {
    let settings = load_catalog_settings(state.db.as_ref());
    HttpAuthGate::new(
        state.http.clone(),
        settings.auth_session_endpoint,
        settings.auth_sign_out_endpoint,
        settings.auth_timeout,
    )
}

fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// The gated view action. Signed in: the UI opens the folder link in a new
/// context. Signed out (or any check failure): the link is parked under the
/// fixed pending key and the UI routes to the provider's sign-in prompt.
async fn handle_lesson_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let link = match required_str(req, "link") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    if gate(state).is_authenticated().await {
        return ok(&req.id, json!({ "action": "open", "url": link }));
    }

    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match db::pending_link_set(conn, &link) {
        Ok(()) => ok(&req.id, json!({ "action": "signIn" })),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

/// After the provider reports a completed sign-in: open the parked link at
/// most once, clearing it first so a repeat call cannot open it again.
async fn handle_auth_complete_sign_in(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    if !gate(state).is_authenticated().await {
        return ok(&req.id, json!({ "action": "none", "authenticated": false }));
    }

    let pending = match db::pending_link_get(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let Some(url) = pending else {
        return ok(&req.id, json!({ "action": "none", "authenticated": true }));
    };
    if let Err(e) = db::pending_link_clear(conn) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "action": "open", "url": url }))
}

async fn handle_auth_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let authenticated = gate(state).is_authenticated().await;
    ok(&req.id, json!({ "authenticated": authenticated }))
}

async fn handle_auth_sign_out(state: &mut AppState, req: &Request) -> serde_json::Value {
    gate(state).sign_out().await;
    ok(&req.id, json!({ "ok": true }))
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "lesson.open" => Some(handle_lesson_open(state, req).await),
        "auth.status" => Some(handle_auth_status(state, req).await),
        "auth.completeSignIn" => Some(handle_auth_complete_sign_in(state, req).await),
        "auth.signOut" => Some(handle_auth_sign_out(state, req).await),
        _ => None,
    }
}
