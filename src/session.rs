use crate::config::GradingScheme;
use crate::error::GradebookError;
use crate::ledger::Ledger;
use crate::overrides::{ManualOverride, OverrideBook, OverrideState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A destructive or grade-changing action that needs a second confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Action {
    #[serde(rename_all = "camelCase")]
    SetOverride {
        student: String,
        grade: i64,
        reason: String,
    },
    ResetEntries,
    ResetOverrides,
}

impl Action {
    /// Whether both actions would change the same thing.
    fn same_target(&self, other: &Action) -> bool {
        match (self, other) {
            (Action::SetOverride { student: a, .. }, Action::SetOverride { student: b, .. }) => {
                a == b
            }
            (Action::ResetEntries, Action::ResetEntries) => true,
            (Action::ResetOverrides, Action::ResetOverrides) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAction {
    pub token: String,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Applied {
    OverrideActivated {
        #[serde(rename = "override")]
        manual: ManualOverride,
        replaced: bool,
    },
    EntriesReset {
        dropped: usize,
    },
    OverridesReset {
        cleared: usize,
    },
}

/// Everything one gradebook user works on. Sessions share nothing but the
/// process-wide grading scheme.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub ledger: Ledger,
    pub overrides: OverrideBook,
    pub locked: bool,
    pending: Vec<PendingAction>,
}

impl Session {
    pub fn new(locked: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            ledger: Ledger::default(),
            overrides: OverrideBook::default(),
            locked,
            pending: Vec::new(),
        }
    }

    /// Validates and parks an action until it is confirmed or cancelled.
    pub fn propose(
        &mut self,
        scheme: &GradingScheme,
        action: Action,
    ) -> Result<PendingAction, GradebookError> {
        let action = match action {
            Action::SetOverride {
                student,
                grade,
                reason,
            } => {
                let m = OverrideBook::validate(scheme, &self.ledger, &student, grade, &reason)?;
                Action::SetOverride {
                    student: m.student,
                    grade: m.grade,
                    reason: m.reason,
                }
            }
            other => other,
        };
        let pending = PendingAction {
            token: Uuid::new_v4().to_string(),
            action,
        };
        // One parked action per target; a newer proposal supersedes the older.
        self.pending.retain(|p| !pending.action.same_target(&p.action));
        self.pending.push(pending.clone());
        Ok(pending)
    }

    /// Applies a parked action. The action stays parked if it no longer
    /// validates against the current state.
    pub fn confirm(
        &mut self,
        scheme: &GradingScheme,
        token: &str,
    ) -> Result<Applied, GradebookError> {
        let Some(pos) = self.pending.iter().position(|p| p.token == token) else {
            return Err(GradebookError::not_found(format!("no pending action {}", token)));
        };

        let applied = match &self.pending[pos].action {
            Action::SetOverride {
                student,
                grade,
                reason,
            } => {
                let manual =
                    OverrideBook::validate(scheme, &self.ledger, student, *grade, reason)?;
                tracing::debug!(
                    student = %manual.student,
                    state = OverrideState::Confirmed.as_str(),
                    "override confirmed"
                );
                let replaced = self.overrides.activate(manual.clone()).is_some();
                Applied::OverrideActivated { manual, replaced }
            }
            Action::ResetEntries => Applied::EntriesReset {
                dropped: self.ledger.reset_all(),
            },
            Action::ResetOverrides => Applied::OverridesReset {
                cleared: self.overrides.reset_all(),
            },
        };
        self.pending.remove(pos);
        Ok(applied)
    }

    pub fn cancel(&mut self, token: &str) -> Result<PendingAction, GradebookError> {
        let Some(pos) = self.pending.iter().position(|p| p.token == token) else {
            return Err(GradebookError::not_found(format!("no pending action {}", token)));
        };
        Ok(self.pending.remove(pos))
    }

    pub fn pending(&self) -> &[PendingAction] {
        &self.pending
    }

    pub fn override_state(&self, student: &str) -> OverrideState {
        if self.overrides.get(student).is_some() {
            return OverrideState::Active;
        }
        let proposed = self.pending.iter().any(|p| {
            matches!(&p.action, Action::SetOverride { student: s, .. } if s == student)
        });
        if proposed {
            OverrideState::Pending
        } else {
            OverrideState::None
        }
    }

    /// Enrolls the demo class the gradebook has always started with.
    pub fn seed_demo(&mut self, scheme: &GradingScheme) -> Result<(), GradebookError> {
        let roster: [(&str, [(i64, &str); 2]); 4] = [
            ("Ivan", [(6, "Active Participation"), (4, "Test")]),
            ("Maria", [(6, "Final Exam"), (5, "Control Work")]),
            ("Georgi", [(2, "Control Work"), (5, "Homework")]),
            ("Elena", [(6, "Homework"), (6, "Project")]),
        ];
        for (name, grades) in roster {
            self.ledger.enroll(name)?;
            for (value, category) in grades {
                self.ledger
                    .record(scheme, name, value, Some(category), None)?;
            }
        }
        Ok(())
    }
}
