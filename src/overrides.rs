use crate::config::GradingScheme;
use crate::error::GradebookError;
use crate::ledger::Ledger;
use serde::Serialize;
use std::collections::BTreeMap;

/// A teacher-asserted final grade that replaces the computed one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualOverride {
    pub student: String,
    pub grade: i64,
    pub reason: String,
}

/// Lifecycle of a student's override.
///
/// `Confirmed` only exists inside a confirm call, between the check and the
/// store. Resetting every override is the only way back to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OverrideState {
    None,
    Pending,
    Confirmed,
    Active,
}

impl OverrideState {
    pub fn as_str(self) -> &'static str {
        match self {
            OverrideState::None => "none",
            OverrideState::Pending => "pending",
            OverrideState::Confirmed => "confirmed",
            OverrideState::Active => "active",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OverrideBook {
    active: BTreeMap<String, ManualOverride>,
}

impl OverrideBook {
    /// Checks a candidate override against the roster and grade scale.
    pub fn validate(
        scheme: &GradingScheme,
        ledger: &Ledger,
        student: &str,
        grade: i64,
        reason: &str,
    ) -> Result<ManualOverride, GradebookError> {
        if ledger.student(student).is_none() {
            return Err(GradebookError::validation(format!("unknown student: {}", student)));
        }
        if !scheme.is_grade_level(grade) {
            return Err(GradebookError::validation(format!(
                "override grade {} is not a defined grade level",
                grade
            )));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(GradebookError::validation("override reason must not be blank"));
        }
        Ok(ManualOverride {
            student: student.to_string(),
            grade,
            reason: reason.to_string(),
        })
    }

    /// Stores a confirmed override, replacing any earlier one for the student.
    pub fn activate(&mut self, manual: ManualOverride) -> Option<ManualOverride> {
        self.active.insert(manual.student.clone(), manual)
    }

    pub fn get(&self, student: &str) -> Option<&ManualOverride> {
        self.active.get(student)
    }

    /// Active overrides ordered by student name.
    pub fn iter(&self) -> impl Iterator<Item = &ManualOverride> {
        self.active.values()
    }

    pub fn reset_all(&mut self) -> usize {
        let n = self.active.len();
        self.active.clear();
        n
    }
}
