use crate::calc::{CategoryWeight, StatusTiers, Tier, WeightTable};
use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_ENV: &str = "GRADEBOOKD_CONFIG";

/// Grade values a scheme may define.
pub const GRADE_RANGE: std::ops::RangeInclusive<i64> = 2..=6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GradeLevel {
    pub value: i64,
    pub label: String,
}

/// Grading constants shared by every session in the process.
///
/// Missing keys in a config file fall back to the built-in defaults, so a file
/// only needs to carry what it changes. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct GradingScheme {
    pub grade_levels: Vec<GradeLevel>,
    pub weights: WeightTable,
    pub status_tiers: StatusTiers,
    pub pass_fail: StatusTiers,
    pub no_data_label: String,
    pub default_reason: String,
    /// Lowercase hex SHA-256 of the shared access credential. Never echoed back.
    #[serde(skip_serializing)]
    pub credential_sha256: Option<String>,
}

impl Default for GradingScheme {
    fn default() -> Self {
        let grade_levels = [
            (6, "Excellent"),
            (5, "Very Good"),
            (4, "Good"),
            (3, "Satisfactory"),
            (2, "Poor"),
        ]
        .into_iter()
        .map(|(value, label)| GradeLevel {
            value,
            label: label.to_string(),
        })
        .collect();

        Self {
            grade_levels,
            weights: WeightTable::default(),
            status_tiers: StatusTiers {
                tiers: vec![
                    Tier::new(5.5, "Elite Scholar"),
                    Tier::new(3.5, "Good Standing"),
                    Tier::new(3.0, "At Risk"),
                ],
                fallback: "Academic Probation".to_string(),
            },
            pass_fail: StatusTiers {
                tiers: vec![Tier::new(3.0, "PASS")],
                fallback: "FAIL".to_string(),
            },
            no_data_label: "No Records Found".to_string(),
            default_reason: "Calculated from weighted average".to_string(),
            credential_sha256: None,
        }
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        let categories = [
            ("Active Participation", 0.5),
            ("Homework", 1.0),
            ("Oral Test", 1.5),
            ("Test", 2.0),
            ("Project", 2.0),
            ("Control Work", 2.5),
            ("Final Exam", 3.0),
        ]
        .into_iter()
        .map(|(name, weight)| CategoryWeight {
            name: name.to_string(),
            weight,
        })
        .collect();
        Self {
            categories,
            default_weight: 1.0,
        }
    }
}

impl GradingScheme {
    /// Loads the scheme named by `GRADEBOOKD_CONFIG`, or the defaults when unset.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(p) if !p.is_empty() => Self::load(Path::new(&p)),
            _ => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.to_string_lossy()))?;
        let scheme: GradingScheme = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.to_string_lossy()))?;
        scheme.validate()?;
        Ok(scheme)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.grade_levels.is_empty() {
            bail!("gradeLevels must not be empty");
        }
        for (i, level) in self.grade_levels.iter().enumerate() {
            if !GRADE_RANGE.contains(&level.value) {
                bail!(
                    "grade level {} is outside {}..={}",
                    level.value,
                    GRADE_RANGE.start(),
                    GRADE_RANGE.end()
                );
            }
            if self.grade_levels[..i].iter().any(|l| l.value == level.value) {
                bail!("duplicate grade level value {}", level.value);
            }
        }
        if self.weights.categories.is_empty() {
            bail!("weights.categories must not be empty");
        }
        for (i, c) in self.weights.categories.iter().enumerate() {
            if c.name.trim().is_empty() {
                bail!("category names must not be blank");
            }
            if self.weights.categories[..i].iter().any(|o| o.name == c.name) {
                bail!("duplicate category '{}'", c.name);
            }
            if !(c.weight > 0.0 && c.weight.is_finite()) {
                bail!("category '{}' must have a positive weight", c.name);
            }
        }
        if !(self.weights.default_weight > 0.0 && self.weights.default_weight.is_finite()) {
            bail!("weights.defaultWeight must be positive");
        }
        if self.status_tiers.tiers.is_empty() || self.pass_fail.tiers.is_empty() {
            bail!("statusTiers and passFail need at least one tier");
        }
        if let Some(d) = &self.credential_sha256 {
            let ok = d.len() == 64 && d.chars().all(|c| c.is_ascii_hexdigit());
            if !ok {
                return Err(anyhow!("credentialSha256 must be 64 hex characters"));
            }
        }
        Ok(())
    }

    pub fn is_grade_level(&self, value: i64) -> bool {
        self.grade_levels.iter().any(|l| l.value == value)
    }

    pub fn grade_label(&self, value: i64) -> Option<&str> {
        self.grade_levels
            .iter()
            .find(|l| l.value == value)
            .map(|l| l.label.as_str())
    }
}
