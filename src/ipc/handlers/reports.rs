use crate::calc;
use crate::ipc::error::ok;
use crate::ipc::helpers::session_mut;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let rows = calc::report(&state.scheme, &session.ledger, &session.overrides);
    ok(&req.id, json!({ "students": rows }))
}

fn handle_audit_log(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    ok(&req.id, json!({ "entries": calc::audit_log(&session.ledger) }))
}

fn handle_overrides_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let active: Vec<_> = session.overrides.iter().collect();
    ok(
        &req.id,
        json!({ "active": active, "pending": session.pending() }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.summary" => Some(handle_summary(state, req)),
        "reports.auditLog" => Some(handle_audit_log(state, req)),
        "overrides.list" => Some(handle_overrides_list(state, req)),
        _ => None,
    }
}
