use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::{json, Map, Value};
use std::time::Duration;

const CATALOG_SETTINGS_KEY: &str = "setup.catalog";

const DEFAULT_AUTH_TIMEOUT_MS: i64 = 2000;

/// Parsed view of the catalog settings section, with defaults applied.
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub lessons_endpoint: Option<String>,
    pub auth_session_endpoint: Option<String>,
    pub auth_sign_out_endpoint: Option<String>,
    pub auth_timeout: Duration,
}

pub fn load_catalog_settings(conn: Option<&Connection>) -> CatalogSettings {
    let obj = conn
        .and_then(|c| db::settings_get_json(c, CATALOG_SETTINGS_KEY).ok().flatten())
        .and_then(|v| v.as_object().cloned())
        .unwrap_or_default();

    let endpoint = |key: &str| {
        obj.get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let auth_timeout_ms = obj
        .get("authTimeoutMs")
        .and_then(|v| v.as_i64())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_AUTH_TIMEOUT_MS);

    CatalogSettings {
        lessons_endpoint: endpoint("lessonsEndpoint"),
        auth_session_endpoint: endpoint("authSessionEndpoint"),
        auth_sign_out_endpoint: endpoint("authSignOutEndpoint"),
        auth_timeout: Duration::from_millis(auth_timeout_ms as u64),
    }
}

fn default_catalog_section() -> Value {
    json!({
        "lessonsEndpoint": null,
        "authSessionEndpoint": null,
        "authSignOutEndpoint": null,
        "authTimeoutMs": DEFAULT_AUTH_TIMEOUT_MS
    })
}

fn load_section(conn: &Connection) -> anyhow::Result<Value> {
    Ok(db::settings_get_json(conn, CATALOG_SETTINGS_KEY)?
        .unwrap_or_else(default_catalog_section))
}

fn parse_nullable_endpoint(v: &Value, key: &str) -> Result<Value, String> {
    if v.is_null() {
        return Ok(Value::Null);
    }
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.len() > 2048 {
        return Err(format!("{} length must be <= 2048", key));
    }
    Ok(Value::String(s.to_string()))
}

fn merge_catalog_patch(current: &mut Value, patch: &Map<String, Value>) -> Result<(), String> {
    let obj = current
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())?;
    for (k, v) in patch {
        match k.as_str() {
            "lessonsEndpoint" | "authSessionEndpoint" | "authSignOutEndpoint" => {
                obj.insert(k.clone(), parse_nullable_endpoint(v, k)?);
            }
            "authTimeoutMs" => {
                let n = v
                    .as_i64()
                    .ok_or_else(|| "authTimeoutMs must be integer".to_string())?;
                if !(100..=60_000).contains(&n) {
                    return Err("authTimeoutMs must be in 100..=60000".to_string());
                }
                obj.insert(k.clone(), Value::from(n));
            }
            _ => return Err(format!("unknown catalog field: {}", k)),
        }
    }
    Ok(())
}

fn handle_setup_catalog_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match load_section(conn) {
        Ok(section) => ok(&req.id, json!({ "catalog": section })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_setup_catalog_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_section(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if let Err(msg) = merge_catalog_patch(&mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = db::settings_set_json(conn, CATALOG_SETTINGS_KEY, &current) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "catalog": current }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.catalog.get" => Some(handle_setup_catalog_get(state, req)),
        "setup.catalog.update" => Some(handle_setup_catalog_update(state, req)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_stored() {
        let settings = load_catalog_settings(None);
        assert!(settings.lessons_endpoint.is_none());
        assert!(settings.auth_session_endpoint.is_none());
        assert_eq!(settings.auth_timeout, Duration::from_millis(2000));
    }

    #[test]
    fn patch_merge_validates_fields() {
        let mut current = default_catalog_section();
        let patch: Map<String, Value> = serde_json::from_value(json!({
            "lessonsEndpoint": "http://localhost:9000/api/lessons",
            "authTimeoutMs": 500
        }))
        .expect("patch");
        merge_catalog_patch(&mut current, &patch).expect("merge");
        assert_eq!(
            current["lessonsEndpoint"],
            json!("http://localhost:9000/api/lessons")
        );
        assert_eq!(current["authTimeoutMs"], json!(500));

        let bad: Map<String, Value> =
            serde_json::from_value(json!({ "authTimeoutMs": 5 })).expect("patch");
        assert!(merge_catalog_patch(&mut current, &bad).is_err());

        let unknown: Map<String, Value> =
            serde_json::from_value(json!({ "resultsPerPage": 20 })).expect("patch");
        assert!(merge_catalog_patch(&mut current, &unknown).is_err());
    }

    #[test]
    fn blank_endpoints_read_as_unset() {
        let conn = rusqlite::Connection::open_in_memory().expect("db");
        conn.execute(
            "CREATE TABLE settings(key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .expect("schema");
        db::settings_set_json(
            &conn,
            CATALOG_SETTINGS_KEY,
            &json!({ "lessonsEndpoint": "   ", "authTimeoutMs": 750 }),
        )
        .expect("seed");

        let settings = load_catalog_settings(Some(&conn));
        assert!(settings.lessons_endpoint.is_none());
        assert_eq!(settings.auth_timeout, Duration::from_millis(750));
    }
}
