mod auth;
mod calc;
mod config;
mod error;
mod ipc;
mod ledger;
mod overrides;
mod session;

use anyhow::Context;
use serde_json::json;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "GRADEBOOKD_LOG";

fn init_tracing() {
    // stdout carries the protocol, so logs go to stderr.
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("gradebookd=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let scheme = config::GradingScheme::from_env().context("failed to load grading scheme")?;
    let mut state = ipc::AppState::new(scheme);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        credential_required = state.policy.requires_credential(),
        "gradebookd ready"
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("stdin read failed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => {
                // Can't echo an id we could not parse.
                tracing::warn!("bad request line: {}", e);
                json!({
                    "id": serde_json::Value::Null,
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() },
                })
            }
        };

        writeln!(stdout, "{}", resp).context("failed to write response")?;
        stdout.flush().context("failed to flush response")?;
    }

    tracing::info!(sessions = state.sessions.len(), "stdin closed, exiting");
    Ok(())
}
