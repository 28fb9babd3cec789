use crate::ipc::error::{err, gradebook_err, ok};
use crate::ipc::helpers::{required_str, session_mut};
use crate::ipc::types::{AppState, Request};
use crate::session::Action;
use serde_json::json;

/// `params` carries the action inline: `{ "kind": "setOverride", "student": ..,
/// "grade": .., "reason": .. }`, `{ "kind": "resetEntries" }` or
/// `{ "kind": "resetOverrides" }`. `sessionId` is ignored by the parse.
fn parse_action(req: &Request) -> Result<Action, serde_json::Value> {
    serde_json::from_value::<Action>(req.params.clone()).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("invalid action: {}", e),
            Some(json!({ "kinds": ["setOverride", "resetEntries", "resetOverrides"] })),
        )
    })
}

fn handle_propose(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let action = match parse_action(req) {
        Ok(a) => a,
        Err(e) => return e,
    };
    match session.propose(&state.scheme, action) {
        Ok(pending) => {
            tracing::info!(session = %session.id, token = %pending.token, "action proposed");
            ok(&req.id, json!({ "pending": pending }))
        }
        Err(e) => gradebook_err(&req.id, &e),
    }
}

fn handle_confirm(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let token = match required_str(req, "token") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match session.confirm(&state.scheme, &token) {
        Ok(applied) => {
            tracing::info!(session = %session.id, token = %token, ?applied, "action confirmed");
            ok(&req.id, json!({ "applied": applied }))
        }
        Err(e) => gradebook_err(&req.id, &e),
    }
}

fn handle_cancel(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let token = match required_str(req, "token") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match session.cancel(&token) {
        Ok(pending) => {
            tracing::debug!(session = %session.id, token = %token, "action cancelled");
            ok(&req.id, json!({ "cancelled": pending }))
        }
        Err(e) => gradebook_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "actions.propose" => Some(handle_propose(state, req)),
        "actions.confirm" => Some(handle_confirm(state, req)),
        "actions.cancel" => Some(handle_cancel(state, req)),
        _ => None,
    }
}
