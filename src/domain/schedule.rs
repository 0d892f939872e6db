//! Schedule records and the per-week view derived from them.

use super::calendar::{AcademicCalendar, WeekParity};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which weeks a lesson takes place in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekKind {
    Upper,
    Lower,
    #[default]
    Every,
}

impl WeekKind {
    pub fn matches(self, parity: WeekParity) -> bool {
        match self {
            WeekKind::Every => true,
            WeekKind::Upper => parity == WeekParity::Upper,
            WeekKind::Lower => parity == WeekParity::Lower,
        }
    }
}

/// One lesson slot as returned by the schedule source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: u64,
    /// 1 = Monday .. 7 = Sunday
    pub day_of_week: u8,
    pub lesson_number: u8,
    pub subject: String,
    #[serde(default)]
    pub teacher: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub week: WeekKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub lessons: Vec<ScheduleEntry>,
}

impl DaySchedule {
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

/// A Monday-first week of lessons filtered by week parity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeekView {
    pub start: NaiveDate,
    pub parity: WeekParity,
    /// Always seven days, Monday first
    pub days: Vec<DaySchedule>,
}

impl WeekView {
    pub fn lesson_count(&self) -> usize {
        self.days.iter().map(|d| d.lessons.len()).sum()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DaySchedule> {
        self.days.iter().find(|d| d.date == date)
    }
}

/// Lessons of the week containing `date`, grouped per day and ordered by
/// lesson number.
pub fn weekly_view(
    entries: &[ScheduleEntry],
    calendar: &AcademicCalendar,
    date: NaiveDate,
) -> WeekView {
    let parity = calendar.week_parity(date);
    let dates = AcademicCalendar::week_days(date);

    let mut days: Vec<DaySchedule> = dates
        .iter()
        .map(|&date| DaySchedule {
            date,
            lessons: Vec::new(),
        })
        .collect();

    for entry in entries.iter().filter(|e| e.week.matches(parity)) {
        match usize::from(entry.day_of_week).checked_sub(1) {
            Some(idx) if idx < days.len() => days[idx].lessons.push(entry.clone()),
            _ => debug!(
                "Skipping schedule entry {} with day_of_week {}",
                entry.id, entry.day_of_week
            ),
        }
    }

    for day in &mut days {
        day.lessons.sort_by_key(|l| (l.lesson_number, l.id));
    }

    WeekView {
        start: dates[0],
        parity,
        days,
    }
}
