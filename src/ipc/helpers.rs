use crate::ipc::error::err;
use crate::ipc::types::Request;
use crate::session::Session;
use serde_json::json;
use std::collections::HashMap;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// Absent and `null` both read as `None`; any other non-string is rejected.
pub fn optional_str(req: &Request, key: &str) -> Result<Option<String>, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v.as_str().map(|s| Some(s.to_string())).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be string or null", key),
                None,
            )
        }),
    }
}

pub fn required_i64(req: &Request, key: &str) -> Result<i64, serde_json::Value> {
    let Some(v) = req.params.get(key) else {
        return Err(err(&req.id, "bad_params", format!("missing {}", key), None));
    };
    v.as_i64().ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            format!("{} must be an integer", key),
            Some(json!({ "key": key, "value": v })),
        )
    })
}

pub fn session_id(req: &Request) -> Result<String, serde_json::Value> {
    required_str(req, "sessionId")
}

/// Looks up the request's session, refusing locked ones.
pub fn session_mut<'a>(
    sessions: &'a mut HashMap<String, Session>,
    req: &Request,
) -> Result<&'a mut Session, serde_json::Value> {
    let id = session_id(req)?;
    let Some(session) = sessions.get_mut(&id) else {
        return Err(err(
            &req.id,
            "no_session",
            "unknown sessionId; open a session first",
            Some(json!({ "sessionId": id })),
        ));
    };
    if session.locked {
        return Err(err(
            &req.id,
            "locked",
            "session is locked; unlock it first",
            None,
        ));
    }
    Ok(session)
}
