mod auth;
mod db;
mod ipc;
mod render;
mod search;
mod store;

use std::io::Write;
use tokio::io::AsyncBufReadExt;

fn write_line(stdout: &mut std::io::Stdout, value: &serde_json::Value) {
    let _ = writeln!(
        stdout,
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{\"ok\":false}".to_string())
    );
    let _ = stdout.flush();
}

// The UI runtime model: one thread, one event source, two suspension points
// (lesson fetch, auth check). stdout carries the protocol; logs go to stderr.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut state = ipc::AppState::new();
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();

    loop {
        // While a keystroke recomputation is staged, wait on whichever comes
        // first: the next request or the quiet-period deadline. A new line
        // re-arms the deadline inside its handler; the fire path runs the
        // recomputation exactly once for the last staged state.
        let line = if let Some(deadline) = state.debounce_deadline {
            tokio::select! {
                line = lines.next_line() => line,
                _ = tokio::time::sleep_until(deadline) => {
                    if let Some(evt) = ipc::debounce_fire(&mut state) {
                        write_line(&mut stdout, &evt);
                    }
                    continue;
                }
            }
        } else {
            lines.next_line().await
        };

        let line = match line {
            Ok(Some(v)) => v,
            _ => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id; ignore.
                let _ = writeln!(
                    stdout,
                    "{{\"ok\":false,\"error\":{{\"code\":\"bad_json\",\"message\":\"{}\"}}}}",
                    e
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req).await;
        write_line(&mut stdout, &resp);
    }
}
