//! Student-portal datasets built on the cache: weekly schedule and marks.

pub mod board;
pub mod calendar;
pub mod marks;
pub mod schedule;

pub use board::{BoardOutcome, ScheduleBoard};
pub use calendar::{AcademicCalendar, CalendarWeek, WeekParity};
pub use marks::{average, by_subject, subject_averages, MarkRecord};
pub use schedule::{weekly_view, DaySchedule, ScheduleEntry, WeekKind, WeekView};
