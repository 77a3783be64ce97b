
use serde_json::json;
use test_support::{read_message, request_ok, send, spawn_sidecar, temp_dir, write_lessons_fixture};

#[test]
fn rapid_keystrokes_coalesce_into_one_recomputation() {
    let workspace = temp_dir("lessonbook-debounce");
    let fixture = write_lessons_fixture(&workspace);
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "catalog.load",
        json!({ "path": fixture.to_string_lossy() }),
    );

    // Three keystrokes well inside one 300 ms quiet period.
    for (id, q) in [("2", "p"), ("3", "pat"), ("4", "patterns")] {
        send(&mut stdin, id, "search.input", json!({ "state": { "query": q } }));
    }
    for id in ["2", "3", "4"] {
        let ack = read_message(&mut reader);
        assert_eq!(ack["id"].as_str(), Some(id));
        assert_eq!(ack["result"]["pending"].as_bool(), Some(true));
        assert_eq!(ack["result"]["debounceMs"].as_i64(), Some(300));
    }

    // Exactly one recomputation fires, for the value after the last keystroke.
    let event = read_message(&mut reader);
    assert_eq!(event["event"].as_str(), Some("search.results"));
    assert_eq!(event["result"]["state"]["query"].as_str(), Some("patterns"));
    assert_eq!(event["result"]["count"].as_i64(), Some(1));
    assert!(event["result"]["hitsHtml"]
        .as_str()
        .unwrap()
        .contains("<mark>Patterns</mark>"));

    // No second event is queued: the next message is the health response.
    let health = request_ok(&mut stdin, &mut reader, "5", "health", json!({}));
    assert_eq!(health["catalogLoaded"].as_bool(), Some(true));

    let _ = child.kill();
}

#[test]
fn synchronous_interactions_supersede_a_staged_keystroke() {
    let workspace = temp_dir("lessonbook-debounce-cancel");
    let fixture = write_lessons_fixture(&workspace);
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "catalog.load",
        json!({ "path": fixture.to_string_lossy() }),
    );

    send(
        &mut stdin,
        "2",
        "search.input",
        json!({ "state": { "query": "loo" } }),
    );
    let ack = read_message(&mut reader);
    assert_eq!(ack["result"]["pending"].as_bool(), Some(true));

    // A checkbox-style interaction recomputes immediately and cancels the
    // staged keystroke.
    let synced = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "search.sync",
        json!({ "state": { "query": "loops" } }),
    );
    assert_eq!(synced["count"].as_i64(), Some(1));

    // Wait out the quiet period, then confirm nothing fired in between.
    std::thread::sleep(std::time::Duration::from_millis(450));
    let next = request_ok(&mut stdin, &mut reader, "4", "health", json!({}));
    assert_eq!(next["catalogLoaded"].as_bool(), Some(true));

    let _ = child.kill();
}

#[test]
fn keystroke_before_load_is_rejected_not_staged() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let error = test_support::request_err(
        &mut stdin,
        &mut reader,
        "1",
        "search.input",
        json!({ "state": { "query": "x" } }),
    );
    assert_eq!(error["code"].as_str(), Some("no_catalog"));
    let _ = child.kill();
}
