use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

/// Upsert the caller's onboarding answers, keyed by the auth provider's user
/// id. Fire-and-forget from the page's perspective; the daemon still reports
/// success or failure.
fn handle_onboarding_track(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let user_id = match req.params.get("userId").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing userId", None),
    };
    let is_teacher = req.params.get("isTeacher").and_then(|v| v.as_bool());
    let grade_level = req
        .params
        .get("gradeLevel")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let school = req
        .params
        .get("school")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match db::upsert_user_profile(conn, &user_id, is_teacher, grade_level, school) {
        Ok(()) => ok(&req.id, json!({ "success": true })),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

fn handle_track_event(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let event_type = match req.params.get("eventType").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing eventType", None),
    };
    let user_id = req
        .params
        .get("userId")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let event_data = req
        .params
        .get("eventData")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty());

    match db::insert_tracking_event(conn, user_id, &event_type, event_data) {
        Ok(()) => ok(&req.id, json!({ "success": true })),
        Err(e) => err(&req.id, "db_insert_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "onboarding.track" => Some(handle_onboarding_track(state, req)),
        "track.event" => Some(handle_track_event(state, req)),
        _ => None,
    }
}
