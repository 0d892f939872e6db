//! Mark records and aggregates over them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRecord {
    pub id: u64,
    pub subject: String,
    pub value: u8,
    pub date: NaiveDate,
    /// Exam, test, homework, ...
    #[serde(default)]
    pub kind: Option<String>,
}

/// Mean mark value, or `None` for no marks.
pub fn average(marks: &[MarkRecord]) -> Option<f64> {
    average_of(marks.iter())
}

fn average_of<'a>(marks: impl Iterator<Item = &'a MarkRecord>) -> Option<f64> {
    let (sum, count) = marks.fold((0u64, 0u64), |(sum, count), m| {
        (sum + u64::from(m.value), count + 1)
    });
    (count > 0).then(|| sum as f64 / count as f64)
}

/// Marks per subject, each list newest first.
pub fn by_subject(marks: &[MarkRecord]) -> BTreeMap<&str, Vec<&MarkRecord>> {
    let mut grouped: BTreeMap<&str, Vec<&MarkRecord>> = BTreeMap::new();
    for mark in marks {
        grouped.entry(mark.subject.as_str()).or_default().push(mark);
    }
    for list in grouped.values_mut() {
        list.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    }
    grouped
}

pub fn subject_averages(marks: &[MarkRecord]) -> BTreeMap<&str, f64> {
    by_subject(marks)
        .into_iter()
        .filter_map(|(subject, list)| average_of(list.into_iter()).map(|avg| (subject, avg)))
        .collect()
}
