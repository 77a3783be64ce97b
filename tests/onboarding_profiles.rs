
use serde_json::json;
use test_support::{db_path, request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn onboarding_track_upserts_one_profile_per_user() {
    let workspace = temp_dir("lessonbook-onboarding");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "onboarding.track",
        json!({
            "userId": "user_2k1",
            "isTeacher": true,
            "gradeLevel": "3",
            "school": "Maple Elementary"
        }),
    );
    assert_eq!(first["success"].as_bool(), Some(true));

    // Answering again replaces the profile fields in place.
    let second = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "onboarding.track",
        json!({ "userId": "user_2k1", "isTeacher": false, "school": "Oak Elementary" }),
    );
    assert_eq!(second["success"].as_bool(), Some(true));

    let conn = rusqlite::Connection::open(db_path(&workspace)).expect("open db");
    let (count, school, completed): (i64, String, i64) = conn
        .query_row(
            "SELECT COUNT(*), MAX(school), MAX(onboarding_completed) FROM user_profiles
             WHERE user_id = 'user_2k1'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .expect("query profile");
    assert_eq!(count, 1);
    assert_eq!(school, "Oak Elementary");
    assert_eq!(completed, 1);

    let _ = child.kill();
}

#[test]
fn onboarding_track_requires_a_user_id() {
    let workspace = temp_dir("lessonbook-onboarding-bad");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "onboarding.track",
        json!({ "isTeacher": true }),
    );
    assert_eq!(error["code"].as_str(), Some("bad_params"));

    let _ = child.kill();
}

#[test]
fn tracking_needs_a_workspace() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "onboarding.track",
        json!({ "userId": "user_1" }),
    );
    assert_eq!(error["code"].as_str(), Some("no_workspace"));
    let _ = child.kill();
}

#[test]
fn track_event_appends_rows() {
    let workspace = temp_dir("lessonbook-track-events");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "track.event",
        json!({ "eventType": "lesson_open", "userId": "user_2k1", "eventData": "{\"title\":\"Loops Intro\"}" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "track.event",
        json!({ "eventType": "page_view" }),
    );
    let error = request_err(&mut stdin, &mut reader, "4", "track.event", json!({}));
    assert_eq!(error["code"].as_str(), Some("bad_params"));

    let conn = rusqlite::Connection::open(db_path(&workspace)).expect("open db");
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM tracking_events", [], |r| r.get(0))
        .expect("count events");
    assert_eq!(count, 2);

    let _ = child.kill();
}
