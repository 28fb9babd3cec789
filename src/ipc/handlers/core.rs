use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "sessionCount": state.sessions.len(),
            "credentialRequired": state.policy.requires_credential(),
        }),
    )
}

/// Grade levels, weights and tiers, so the host can fill its pickers.
fn handle_scheme_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "scheme": state.scheme }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "scheme.get" => Some(handle_scheme_get(state, req)),
        _ => None,
    }
}
