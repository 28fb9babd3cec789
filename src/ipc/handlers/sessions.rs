use crate::ipc::error::{err, gradebook_err, ok};
use crate::ipc::helpers::{required_str, session_id};
use crate::ipc::types::{AppState, Request};
use crate::session::Session;
use serde_json::json;

fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let seed_demo = req
        .params
        .get("seedDemo")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let mut session = Session::new(state.policy.requires_credential());
    if seed_demo {
        if let Err(e) = session.seed_demo(&state.scheme) {
            return gradebook_err(&req.id, &e);
        }
    }
    let session_id = session.id.clone();
    let locked = session.locked;
    state.sessions.insert(session_id.clone(), session);
    tracing::info!(session = %session_id, seed_demo, locked, "session opened");

    ok(
        &req.id,
        json!({ "sessionId": session_id, "locked": locked }),
    )
}

fn handle_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match session_id(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    if state.sessions.remove(&id).is_none() {
        return err(
            &req.id,
            "no_session",
            "unknown sessionId",
            Some(json!({ "sessionId": id })),
        );
    }
    tracing::info!(session = %id, "session closed");
    ok(&req.id, json!({ "ok": true }))
}

fn handle_unlock(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match session_id(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let credential = match required_str(req, "credential") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(session) = state.sessions.get_mut(&id) else {
        return err(
            &req.id,
            "no_session",
            "unknown sessionId",
            Some(json!({ "sessionId": id })),
        );
    };
    if !state.policy.verify(&credential) {
        tracing::warn!(session = %id, "unlock refused");
        return err(&req.id, "access_denied", "credential rejected", None);
    }
    session.locked = false;
    tracing::info!(session = %id, "session unlocked");
    ok(&req.id, json!({ "locked": false }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.open" => Some(handle_open(state, req)),
        "session.close" => Some(handle_close(state, req)),
        "session.unlock" => Some(handle_unlock(state, req)),
        _ => None,
    }
}
