use crate::error::GradebookError;
use crate::ipc::error::{gradebook_err, ok};
use crate::ipc::helpers::{required_str, session_mut};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_enroll(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Err(e) = session.ledger.enroll(&name) {
        return gradebook_err(&req.id, &e);
    }
    tracing::info!(session = %session.id, student = %name, "student enrolled");
    ok(&req.id, json!({ "student": name }))
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let students: Vec<serde_json::Value> = session
        .ledger
        .students()
        .map(|s| {
            json!({
                "name": s.name(),
                "entryCount": s.entries().len(),
                "overrideState": session.override_state(s.name()).as_str(),
            })
        })
        .collect();
    ok(&req.id, json!({ "students": students }))
}

fn handle_history(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let name = match required_str(req, "student") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(student) = session.ledger.student(&name) else {
        return gradebook_err(
            &req.id,
            &GradebookError::validation(format!("unknown student: {}", name)),
        );
    };
    let entries: Vec<serde_json::Value> = student
        .entries()
        .iter()
        .map(|e| {
            json!({
                "id": e.id,
                "value": e.value,
                "label": state.scheme.grade_label(e.value),
                "category": e.category,
                "timestamp": e.timestamp,
            })
        })
        .collect();
    ok(
        &req.id,
        json!({ "student": student.name(), "entries": entries }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.enroll" => Some(handle_enroll(state, req)),
        "students.list" => Some(handle_list(state, req)),
        "students.history" => Some(handle_history(state, req)),
        _ => None,
    }
}
