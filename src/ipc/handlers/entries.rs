use crate::error::GradebookError;
use crate::ipc::error::{err, gradebook_err, ok};
use crate::ipc::helpers::{optional_str, required_i64, required_str, session_mut};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_record(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let student = match required_str(req, "student") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let value = match required_i64(req, "value") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let category = match optional_str(req, "category") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let timestamp = match optional_str(req, "timestamp") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match session.ledger.record(
        &state.scheme,
        &student,
        value,
        category.as_deref(),
        timestamp.as_deref(),
    ) {
        Ok(entry_id) => {
            tracing::info!(
                session = %session.id,
                student = %student,
                entry_id,
                value,
                category = category.as_deref().unwrap_or("-"),
                "grade recorded"
            );
            let top_mark = state.scheme.grade_levels.iter().map(|l| l.value).max() == Some(value);
            ok(&req.id, json!({ "entryId": entry_id, "topMark": top_mark }))
        }
        Err(e) => gradebook_err(&req.id, &e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let Some(entry_id) = req.params.get("entryId").and_then(|v| v.as_u64()) else {
        return err(
            &req.id,
            "bad_params",
            "entryId must be a non-negative integer",
            None,
        );
    };
    match session.ledger.delete(entry_id) {
        Ok(entry) => {
            tracing::info!(session = %session.id, entry_id, "entry deleted");
            ok(&req.id, json!({ "deleted": entry }))
        }
        Err(e) => gradebook_err(&req.id, &e),
    }
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let student = match optional_str(req, "student") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Some(name) = student.as_deref() {
        if session.ledger.student(name).is_none() {
            return gradebook_err(
                &req.id,
                &GradebookError::validation(format!("unknown student: {}", name)),
            );
        }
    }
    let entries: Vec<serde_json::Value> = session
        .ledger
        .entries(student.as_deref())
        .map(|(name, e)| {
            json!({
                "student": name,
                "id": e.id,
                "value": e.value,
                "category": e.category,
                "timestamp": e.timestamp,
            })
        })
        .collect();
    ok(&req.id, json!({ "entries": entries }))
}

fn handle_reset_all(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let dropped = session.ledger.reset_all();
    tracing::info!(session = %session.id, dropped, "all entries reset");
    ok(
        &req.id,
        json!({ "dropped": dropped, "lastEntryId": session.ledger.last_id() }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "entries.record" => Some(handle_record(state, req)),
        "entries.delete" => Some(handle_delete(state, req)),
        "entries.list" => Some(handle_list(state, req)),
        "entries.resetAll" => Some(handle_reset_all(state, req)),
        _ => None,
    }
}
