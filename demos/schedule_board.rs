//! Schedule board walkthrough.
//!
//! Loads a user's schedule and marks through a file-backed cache twice: the
//! first run fetches, the second shows the cached copy immediately and then
//! confirms it against the (unchanged) source without replacing the view.
//!
//! Run with: RUST_LOG=debug cargo run --example schedule_board

use chrono::NaiveDate;
use portal_cache::backend::FileBackend;
use portal_cache::domain::{
    subject_averages, AcademicCalendar, MarkRecord, ScheduleBoard, ScheduleEntry, WeekKind,
};
use portal_cache::{CacheStore, Error};

async fn fetch_schedule() -> portal_cache::Result<Vec<ScheduleEntry>> {
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    Ok(vec![
        ScheduleEntry {
            id: 1,
            day_of_week: 1,
            lesson_number: 1,
            subject: "Calculus".to_string(),
            teacher: Some("Petrova".to_string()),
            room: Some("301".to_string()),
            group: Some("2991".to_string()),
            week: WeekKind::Every,
        },
        ScheduleEntry {
            id: 2,
            day_of_week: 1,
            lesson_number: 2,
            subject: "Databases".to_string(),
            teacher: Some("Sidorov".to_string()),
            room: Some("112".to_string()),
            group: Some("2991".to_string()),
            week: WeekKind::Upper,
        },
        ScheduleEntry {
            id: 3,
            day_of_week: 3,
            lesson_number: 1,
            subject: "Physics".to_string(),
            teacher: None,
            room: Some("204".to_string()),
            group: Some("2991".to_string()),
            week: WeekKind::Lower,
        },
    ])
}

async fn fetch_marks() -> portal_cache::Result<Vec<MarkRecord>> {
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    let date = NaiveDate::from_ymd_opt(2024, 10, 1)
        .ok_or_else(|| Error::Other("invalid date".to_string()))?;
    Ok(vec![
        MarkRecord {
            id: 1,
            subject: "Calculus".to_string(),
            value: 5,
            date,
            kind: Some("exam".to_string()),
        },
        MarkRecord {
            id: 2,
            subject: "Calculus".to_string(),
            value: 4,
            date,
            kind: None,
        },
    ])
}

#[tokio::main]
async fn main() -> portal_cache::Result<()> {
    env_logger::init();

    let path = std::env::temp_dir().join("portal-cache-demo.json");
    let today = NaiveDate::from_ymd_opt(2024, 10, 2)
        .ok_or_else(|| Error::Other("invalid date".to_string()))?;
    let calendar = AcademicCalendar::containing(today)?;

    for run in 1..=2 {
        let store = CacheStore::new(FileBackend::open(&path)?);
        let board = ScheduleBoard::new(store, &2991, calendar);

        let outcome = board.load(&fetch_schedule, &fetch_marks).await;
        println!("run {}: {:?}", run, outcome);

        if let Some(week) = board.week_view(today) {
            println!("  week of {} ({}):", week.start, week.parity);
            for day in week.days.iter().filter(|d| !d.is_empty()) {
                for lesson in &day.lessons {
                    println!("    {} #{} {}", day.date, lesson.lesson_number, lesson.subject);
                }
            }
        }

        if let Some(marks) = board.marks().view().data {
            for (subject, avg) in subject_averages(&marks) {
                println!("  {}: {:.2}", subject, avg);
            }
        }
    }

    std::fs::remove_file(&path)?;
    Ok(())
}
