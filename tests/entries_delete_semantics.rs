use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .env_remove("GRADEBOOKD_CONFIG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

fn open_session(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>) -> String {
    let opened = request_ok(stdin, reader, "open", "session.open", json!({}));
    opened
        .get("sessionId")
        .and_then(|v| v.as_str())
        .expect("sessionId")
        .to_string()
}

fn entry_ids(listed: &serde_json::Value) -> Vec<u64> {
    listed
        .get("entries")
        .and_then(|v| v.as_array())
        .expect("entries")
        .iter()
        .filter_map(|e| e.get("id").and_then(|v| v.as_u64()))
        .collect()
}

#[test]
fn delete_never_recycles_ids_and_is_idempotent() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let sid = open_session(&mut stdin, &mut reader);

    for (i, name) in ["Ana", "Bo"].iter().enumerate() {
        request_ok(
            &mut stdin,
            &mut reader,
            &format!("enroll-{}", i),
            "students.enroll",
            json!({ "sessionId": sid, "name": name }),
        );
    }
    for i in 0..5 {
        let student = if i % 2 == 0 { "Ana" } else { "Bo" };
        let recorded = request_ok(
            &mut stdin,
            &mut reader,
            &format!("record-{}", i),
            "entries.record",
            json!({ "sessionId": sid, "student": student, "value": 4, "category": "Test" }),
        );
        assert_eq!(
            recorded.get("entryId").and_then(|v| v.as_u64()),
            Some(i as u64 + 1)
        );
    }

    // Entry 3 belongs to Ana; the id alone is enough to find it.
    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "del-1",
        "entries.delete",
        json!({ "sessionId": sid, "entryId": 3 }),
    );
    assert_eq!(
        deleted
            .get("deleted")
            .and_then(|d| d.get("id"))
            .and_then(|v| v.as_u64()),
        Some(3)
    );
    let again = request(
        &mut stdin,
        &mut reader,
        "del-2",
        "entries.delete",
        json!({ "sessionId": sid, "entryId": 3 }),
    );
    assert_eq!(error_code(&again), Some("not_found"));
    let missing = request(
        &mut stdin,
        &mut reader,
        "del-3",
        "entries.delete",
        json!({ "sessionId": sid, "entryId": 42 }),
    );
    assert_eq!(error_code(&missing), Some("not_found"));

    let next = request_ok(
        &mut stdin,
        &mut reader,
        "record-after",
        "entries.record",
        json!({ "sessionId": sid, "student": "Bo", "value": 6 }),
    );
    assert_eq!(next.get("entryId").and_then(|v| v.as_u64()), Some(6));

    let all = request_ok(
        &mut stdin,
        &mut reader,
        "list-all",
        "entries.list",
        json!({ "sessionId": sid }),
    );
    assert_eq!(entry_ids(&all), vec![1, 5, 2, 4, 6]);

    let bo = request_ok(
        &mut stdin,
        &mut reader,
        "list-bo",
        "entries.list",
        json!({ "sessionId": sid, "student": "Bo" }),
    );
    assert_eq!(entry_ids(&bo), vec![2, 4, 6]);

    let unknown = request(
        &mut stdin,
        &mut reader,
        "list-unknown",
        "entries.list",
        json!({ "sessionId": sid, "student": "Cy" }),
    );
    assert_eq!(error_code(&unknown), Some("validation_failed"));
}

#[test]
fn reset_all_keeps_roster_and_counter() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let sid = open_session(&mut stdin, &mut reader);

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.enroll",
        json!({ "sessionId": sid, "name": "Ana" }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.enroll",
        json!({ "sessionId": sid, "name": "Bo" }),
    );
    for i in 0..3 {
        request_ok(
            &mut stdin,
            &mut reader,
            &format!("r{}", i),
            "entries.record",
            json!({ "sessionId": sid, "student": "Ana", "value": 5 }),
        );
    }

    let reset = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "entries.resetAll",
        json!({ "sessionId": sid }),
    );
    assert_eq!(reset.get("dropped").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(reset.get("lastEntryId").and_then(|v| v.as_u64()), Some(3));

    let roster = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.list",
        json!({ "sessionId": sid }),
    );
    let names: Vec<&str> = roster
        .get("students")
        .and_then(|v| v.as_array())
        .expect("students")
        .iter()
        .filter_map(|s| s.get("name").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(names, vec!["Ana", "Bo"]);

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "entries.list",
        json!({ "sessionId": sid }),
    );
    assert!(entry_ids(&listed).is_empty());

    let recorded = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "entries.record",
        json!({ "sessionId": sid, "student": "Bo", "value": 3 }),
    );
    assert_eq!(recorded.get("entryId").and_then(|v| v.as_u64()), Some(4));
}

#[test]
fn audit_log_lists_newest_first_across_students() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let sid = open_session(&mut stdin, &mut reader);

    for name in ["Ana", "Bo"] {
        request_ok(
            &mut stdin,
            &mut reader,
            name,
            "students.enroll",
            json!({ "sessionId": sid, "name": name }),
        );
    }
    let rows = [
        ("Ana", 5, "Homework", "2024-09-10 08:15:00"),
        ("Bo", 3, "Test", "2024-09-12 11:00:00"),
        ("Ana", 6, "Project", "2024-09-11 13:45:00"),
    ];
    for (i, (student, value, category, ts)) in rows.iter().enumerate() {
        request_ok(
            &mut stdin,
            &mut reader,
            &format!("rec-{}", i),
            "entries.record",
            json!({
                "sessionId": sid,
                "student": student,
                "value": value,
                "category": category,
                "timestamp": ts,
            }),
        );
    }

    let audit = request_ok(
        &mut stdin,
        &mut reader,
        "audit",
        "reports.auditLog",
        json!({ "sessionId": sid }),
    );
    let entries = audit
        .get("entries")
        .and_then(|v| v.as_array())
        .expect("entries");
    let order: Vec<(u64, &str)> = entries
        .iter()
        .map(|e| {
            (
                e.get("id").and_then(|v| v.as_u64()).expect("id"),
                e.get("student").and_then(|v| v.as_str()).expect("student"),
            )
        })
        .collect();
    assert_eq!(order, vec![(2, "Bo"), (3, "Ana"), (1, "Ana")]);
    assert_eq!(
        entries[0].get("timestamp").and_then(|v| v.as_str()),
        Some("2024-09-12 11:00:00")
    );
    assert_eq!(entries[0].get("category").and_then(|v| v.as_str()), Some("Test"));
    assert_eq!(entries[0].get("value").and_then(|v| v.as_i64()), Some(3));
}

#[test]
fn supplied_timestamps_are_normalized_or_rejected() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let sid = open_session(&mut stdin, &mut reader);
    request_ok(
        &mut stdin,
        &mut reader,
        "enroll",
        "students.enroll",
        json!({ "sessionId": sid, "name": "Ana" }),
    );

    let bad = request(
        &mut stdin,
        &mut reader,
        "bad-ts",
        "entries.record",
        json!({ "sessionId": sid, "student": "Ana", "value": 4, "timestamp": "yesterday" }),
    );
    assert_eq!(error_code(&bad), Some("validation_failed"));

    for (i, ts) in ["2024-03-01 9:00:00", "2024-03-01 10:00:00"].iter().enumerate() {
        request_ok(
            &mut stdin,
            &mut reader,
            &format!("rec-{}", i),
            "entries.record",
            json!({ "sessionId": sid, "student": "Ana", "value": 5, "timestamp": ts }),
        );
    }

    let audit = request_ok(
        &mut stdin,
        &mut reader,
        "audit",
        "reports.auditLog",
        json!({ "sessionId": sid }),
    );
    let stamps: Vec<(u64, &str)> = audit
        .get("entries")
        .and_then(|v| v.as_array())
        .expect("entries")
        .iter()
        .map(|e| {
            (
                e.get("id").and_then(|v| v.as_u64()).expect("id"),
                e.get("timestamp").and_then(|v| v.as_str()).expect("timestamp"),
            )
        })
        .collect();
    assert_eq!(
        stamps,
        vec![(2, "2024-03-01 10:00:00"), (1, "2024-03-01 09:00:00")]
    );
}
