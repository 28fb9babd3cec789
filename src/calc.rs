use crate::config::GradingScheme;
use crate::ledger::{GradeEntry, Ledger};
use crate::overrides::{ManualOverride, OverrideBook};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Two-decimal display rounding, same half-up rule as the final grade:
/// `Int(100*x + 0.5) / 100`
pub fn round_off_2_decimals(x: f64) -> f64 {
    ((100.0 * x) + 0.5).floor() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CategoryWeight {
    pub name: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct WeightTable {
    pub categories: Vec<CategoryWeight>,
    /// Weight of an entry recorded without a category.
    pub default_weight: f64,
}

impl WeightTable {
    /// `None` for a category the table does not define.
    pub fn weight_of(&self, category: Option<&str>) -> Option<f64> {
        match category {
            None => Some(self.default_weight),
            Some(name) => self
                .categories
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.weight),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Tier {
    pub min: f64,
    pub label: String,
}

impl Tier {
    pub fn new(min: f64, label: &str) -> Self {
        Self {
            min,
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StatusTiers {
    pub tiers: Vec<Tier>,
    pub fallback: String,
}

pub fn simple_average<'a, I>(entries: I) -> f64
where
    I: IntoIterator<Item = &'a GradeEntry>,
{
    let mut sum = 0.0;
    let mut count: usize = 0;
    for e in entries {
        sum += e.value as f64;
        count += 1;
    }
    if count > 0 {
        sum / (count as f64)
    } else {
        0.0
    }
}

/// `sum(value * weight) / sum(weight)`, or 0.0 when there is nothing to weigh.
///
/// Categories missing from the table contribute the default weight; the ledger
/// rejects them on write so this only matters for hand-built entries.
pub fn weighted_average<'a, I>(entries: I, weights: &WeightTable) -> f64
where
    I: IntoIterator<Item = &'a GradeEntry>,
{
    let mut sum_weighted = 0.0;
    let mut sum_weights = 0.0;
    for e in entries {
        let w = weights
            .weight_of(e.category.as_deref())
            .unwrap_or(weights.default_weight);
        sum_weighted += (e.value as f64) * w;
        sum_weights += w;
    }
    if sum_weights > 0.0 {
        sum_weighted / sum_weights
    } else {
        0.0
    }
}

/// First tier whose inclusive lower bound the average reaches, checked from
/// the highest bound down.
pub fn classify<'a>(average: f64, tiers: &'a StatusTiers) -> &'a str {
    let mut ordered: Vec<&Tier> = tiers.tiers.iter().collect();
    ordered.sort_by(|a, b| b.min.partial_cmp(&a.min).unwrap_or(Ordering::Equal));
    ordered
        .into_iter()
        .find(|t| average >= t.min)
        .map(|t| t.label.as_str())
        .unwrap_or(tiers.fallback.as_str())
}

/// Round-half-up onto the integer grade scale. Deliberately not clamped to
/// the defined grade levels.
pub fn final_grade(average: f64) -> i64 {
    (average + 0.5).floor() as i64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub student: String,
    pub grade: i64,
    pub reason: String,
    pub overridden: bool,
}

/// Displayed grade for a student: the override when one is active, otherwise
/// the computed grade. `None` when neither exists.
pub fn resolve(
    student: &str,
    computed: Option<i64>,
    manual: Option<&ManualOverride>,
    default_reason: &str,
) -> Option<Resolution> {
    if let Some(m) = manual {
        return Some(Resolution {
            student: student.to_string(),
            grade: m.grade,
            reason: m.reason.clone(),
            overridden: true,
        });
    }
    computed.map(|grade| Resolution {
        student: student.to_string(),
        grade,
        reason: default_reason.to_string(),
        overridden: false,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    pub student: String,
    pub entry_count: usize,
    pub weighted_average: f64,
    pub simple_average: f64,
    pub status: String,
    pub pass_fail: String,
    pub final_grade: Option<i64>,
    pub resolved: Option<Resolution>,
}

pub fn student_report(
    scheme: &GradingScheme,
    student: &str,
    entries: &[GradeEntry],
    manual: Option<&ManualOverride>,
) -> StudentReport {
    if entries.is_empty() {
        return StudentReport {
            student: student.to_string(),
            entry_count: 0,
            weighted_average: 0.0,
            simple_average: 0.0,
            status: scheme.no_data_label.clone(),
            pass_fail: scheme.no_data_label.clone(),
            final_grade: None,
            resolved: resolve(student, None, manual, &scheme.default_reason),
        };
    }

    let weighted = weighted_average(entries, &scheme.weights);
    let simple = simple_average(entries);
    let computed = final_grade(weighted);
    StudentReport {
        student: student.to_string(),
        entry_count: entries.len(),
        weighted_average: round_off_2_decimals(weighted),
        simple_average: round_off_2_decimals(simple),
        status: classify(weighted, &scheme.status_tiers).to_string(),
        pass_fail: classify(weighted, &scheme.pass_fail).to_string(),
        final_grade: Some(computed),
        resolved: resolve(student, Some(computed), manual, &scheme.default_reason),
    }
}

/// One row per enrolled student, in enrollment order.
pub fn report(
    scheme: &GradingScheme,
    ledger: &Ledger,
    overrides: &OverrideBook,
) -> Vec<StudentReport> {
    ledger
        .students()
        .map(|s| student_report(scheme, s.name(), s.entries(), overrides.get(s.name())))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRow {
    pub id: u64,
    pub timestamp: String,
    pub student: String,
    pub category: Option<String>,
    pub value: i64,
}

/// Every entry across the class, newest timestamp first. The ledger stores
/// zero-padded `TIMESTAMP_FORMAT` strings, so text order is time order; equal
/// timestamps fall back to the higher id first.
pub fn audit_log(ledger: &Ledger) -> Vec<AuditRow> {
    let mut rows: Vec<AuditRow> = ledger
        .entries(None)
        .map(|(student, e)| AuditRow {
            id: e.id,
            timestamp: e.timestamp.clone(),
            student: student.to_string(),
            category: e.category.clone(),
            value: e.value,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.id.cmp(&a.id))
    });
    rows
}
