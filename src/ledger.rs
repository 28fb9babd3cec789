use crate::config::GradingScheme;
use crate::error::GradebookError;
use serde::Serialize;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One recorded grade. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeEntry {
    pub id: u64,
    pub value: i64,
    pub category: Option<String>,
    pub timestamp: String,
}

const ISO_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses a caller timestamp (`2024-03-01 9:00:00` or `2024-03-01T09:00:00`)
/// into the canonical zero-padded form.
fn normalize_timestamp(raw: &str) -> Result<String, GradebookError> {
    chrono::NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(raw, ISO_TIMESTAMP_FORMAT))
        .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
        .map_err(|_| {
            GradebookError::validation(format!(
                "timestamp '{}' must look like YYYY-MM-DD HH:MM:SS",
                raw
            ))
        })
}

#[derive(Debug, Clone)]
pub struct Student {
    name: String,
    entries: Vec<GradeEntry>,
}

impl Student {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[GradeEntry] {
        &self.entries
    }
}

/// All grade entries of one session, keyed by student name.
///
/// Entry ids come from a single counter shared by every student. The counter
/// only moves forward: deletes and resets never hand an id out twice.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    students: Vec<Student>,
    last_id: u64,
}

impl Ledger {
    pub fn enroll(&mut self, name: &str) -> Result<(), GradebookError> {
        if name.trim().is_empty() {
            return Err(GradebookError::validation("student name must not be blank"));
        }
        if self.student(name).is_some() {
            return Err(GradebookError::Duplicate(name.to_string()));
        }
        self.students.push(Student {
            name: name.to_string(),
            entries: Vec::new(),
        });
        Ok(())
    }

    /// Appends a grade and returns its id. A missing or blank timestamp is
    /// replaced with the current local time; a supplied one is re-formatted
    /// to `TIMESTAMP_FORMAT` so stored timestamps sort chronologically.
    pub fn record(
        &mut self,
        scheme: &GradingScheme,
        student: &str,
        value: i64,
        category: Option<&str>,
        timestamp: Option<&str>,
    ) -> Result<u64, GradebookError> {
        if !scheme.is_grade_level(value) {
            return Err(GradebookError::validation(format!(
                "grade value {} is not a defined grade level",
                value
            )));
        }
        if let Some(c) = category {
            if scheme.weights.weight_of(Some(c)).is_none() {
                return Err(GradebookError::validation(format!("unknown category: {}", c)));
            }
        }
        let timestamp = match timestamp.map(str::trim) {
            Some(t) if !t.is_empty() => normalize_timestamp(t)?,
            _ => chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
        };

        let Some(idx) = self.students.iter().position(|s| s.name == student) else {
            return Err(GradebookError::validation(format!("unknown student: {}", student)));
        };

        self.last_id += 1;
        let id = self.last_id;
        self.students[idx].entries.push(GradeEntry {
            id,
            value,
            category: category.map(|c| c.to_string()),
            timestamp,
        });
        Ok(id)
    }

    /// Removes an entry by its global id, whichever student owns it.
    pub fn delete(&mut self, entry_id: u64) -> Result<GradeEntry, GradebookError> {
        for s in &mut self.students {
            if let Some(pos) = s.entries.iter().position(|e| e.id == entry_id) {
                return Ok(s.entries.remove(pos));
            }
        }
        Err(GradebookError::not_found(format!("entry {} not found", entry_id)))
    }

    /// Empties every student's entries. Keeps the roster and the id counter.
    /// Returns how many entries were dropped.
    pub fn reset_all(&mut self) -> usize {
        let mut dropped = 0;
        for s in &mut self.students {
            dropped += s.entries.len();
            s.entries.clear();
        }
        dropped
    }

    /// Entries in roster order, then insertion order, optionally for one student.
    /// Each call starts a fresh pass.
    pub fn entries<'a>(
        &'a self,
        student: Option<&'a str>,
    ) -> impl Iterator<Item = (&'a str, &'a GradeEntry)> + 'a {
        self.students
            .iter()
            .filter(move |s| student.map(|n| s.name == n).unwrap_or(true))
            .flat_map(|s| s.entries.iter().map(move |e| (s.name.as_str(), e)))
    }

    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.students.iter()
    }

    pub fn student(&self, name: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.name == name)
    }

    /// Id of the most recently allocated entry, 0 before the first record.
    pub fn last_id(&self) -> u64 {
        self.last_id
    }
}
