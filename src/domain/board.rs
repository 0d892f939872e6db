//! A user's schedule and marks, each kept fresh with stale-while-revalidate.

use super::calendar::AcademicCalendar;
use super::marks::MarkRecord;
use super::schedule::{weekly_view, ScheduleEntry, WeekView};
use crate::backend::CacheBackend;
use crate::fetch::Fetcher;
use crate::revalidate::{DatasetSpec, Outcome, Revalidator};
use crate::store::CacheStore;
use chrono::NaiveDate;
use std::fmt::Display;

/// Outcomes of one board load or refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoardOutcome {
    pub schedule: Outcome,
    pub marks: Outcome,
}

pub struct ScheduleBoard<B: CacheBackend> {
    calendar: AcademicCalendar,
    schedule: Revalidator<Vec<ScheduleEntry>, B>,
    marks: Revalidator<Vec<MarkRecord>, B>,
}

impl<B: CacheBackend> ScheduleBoard<B> {
    /// Board for `user` with the default dataset TTLs (schedule 24 h, marks 2 h).
    pub fn new(store: CacheStore<B>, user: &dyn Display, calendar: AcademicCalendar) -> Self {
        Self::with_specs(
            store,
            user,
            calendar,
            DatasetSpec::schedule(),
            DatasetSpec::marks(),
        )
    }

    pub fn with_specs(
        store: CacheStore<B>,
        user: &dyn Display,
        calendar: AcademicCalendar,
        schedule: DatasetSpec,
        marks: DatasetSpec,
    ) -> Self {
        ScheduleBoard {
            calendar,
            schedule: Revalidator::new(store.clone(), schedule, user),
            marks: Revalidator::new(store, marks, user),
        }
    }

    pub fn calendar(&self) -> &AcademicCalendar {
        &self.calendar
    }

    pub fn schedule(&self) -> &Revalidator<Vec<ScheduleEntry>, B> {
        &self.schedule
    }

    pub fn marks(&self) -> &Revalidator<Vec<MarkRecord>, B> {
        &self.marks
    }

    /// Show both cached datasets, then revalidate them concurrently.
    pub async fn load<S, M>(&self, schedule: &S, marks: &M) -> BoardOutcome
    where
        S: Fetcher<Vec<ScheduleEntry>>,
        M: Fetcher<Vec<MarkRecord>>,
    {
        let (schedule, marks) = futures::join!(self.schedule.load(schedule), self.marks.load(marks));
        debug!("Board loaded: schedule {:?}, marks {:?}", schedule, marks);
        BoardOutcome { schedule, marks }
    }

    /// Drop both cached entries, then fetch both datasets again.
    pub async fn refresh<S, M>(&self, schedule: &S, marks: &M) -> BoardOutcome
    where
        S: Fetcher<Vec<ScheduleEntry>>,
        M: Fetcher<Vec<MarkRecord>>,
    {
        let (schedule, marks) =
            futures::join!(self.schedule.refresh(schedule), self.marks.refresh(marks));
        info!("» Board refreshed: schedule {:?}, marks {:?}", schedule, marks);
        BoardOutcome { schedule, marks }
    }

    /// Week containing `date`, built from the displayed schedule.
    ///
    /// Never fetches; returns `None` while no schedule is displayed.
    pub fn week_view(&self, date: NaiveDate) -> Option<WeekView> {
        let view = self.schedule.view();
        view.data
            .map(|entries| weekly_view(&entries, &self.calendar, date))
    }

    /// Whether either dataset is still showing unconfirmed cached data.
    pub fn using_cache(&self) -> bool {
        self.schedule.view().using_cache || self.marks.view().using_cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::clock::ManualClock;
    use crate::config::CacheOptions;
    use crate::domain::calendar::WeekParity;
    use crate::domain::schedule::WeekKind;
    use crate::fetch::ScriptedFetcher;
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn schedule() -> Vec<ScheduleEntry> {
        vec![
            ScheduleEntry {
                id: 1,
                day_of_week: 1,
                lesson_number: 1,
                subject: "Math".to_string(),
                teacher: Some("Ivanova".to_string()),
                room: Some("101".to_string()),
                group: None,
                week: WeekKind::Upper,
            },
            ScheduleEntry {
                id: 2,
                day_of_week: 1,
                lesson_number: 2,
                subject: "Physics".to_string(),
                teacher: None,
                room: Some("204".to_string()),
                group: None,
                week: WeekKind::Every,
            },
        ]
    }

    fn marks() -> Vec<MarkRecord> {
        vec![MarkRecord {
            id: 10,
            subject: "Math".to_string(),
            value: 5,
            date: date(2024, 9, 3),
            kind: None,
        }]
    }

    fn setup() -> (CacheStore<InMemoryBackend>, ScheduleBoard<InMemoryBackend>) {
        let store = CacheStore::new(InMemoryBackend::new())
            .with_clock(Arc::new(ManualClock::new(1_000)));
        let calendar = AcademicCalendar::for_academic_year(2024).expect("calendar");
        let board = ScheduleBoard::new(store.clone(), &42, calendar);
        (store, board)
    }

    #[tokio::test]
    async fn test_load_fetches_both() {
        let (store, board) = setup();
        let outcome = board
            .load(&ScriptedFetcher::always(schedule()), &ScriptedFetcher::always(marks()))
            .await;

        assert_eq!(
            outcome,
            BoardOutcome {
                schedule: Outcome::Replaced,
                marks: Outcome::Replaced
            }
        );
        assert!(!board.using_cache());
        assert!(store.has("schedule_42"));
        assert!(store.has("marks_42"));
    }

    #[tokio::test]
    async fn test_week_switch_needs_no_fetch() {
        let (_, board) = setup();
        assert_eq!(board.week_view(date(2024, 9, 9)), None);

        let fetcher = ScriptedFetcher::always(schedule());
        board.load(&fetcher, &ScriptedFetcher::always(marks())).await;

        let upper = board.week_view(date(2024, 9, 9)).expect("schedule displayed");
        let lower = board.week_view(date(2024, 9, 16)).expect("schedule displayed");
        assert_eq!(upper.parity, WeekParity::Upper);
        assert_eq!(upper.days[0].lessons.len(), 2);
        assert_eq!(lower.days[0].lessons.len(), 1);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_clears_both_entries() {
        let (store, board) = setup();
        store.set("schedule_42", &schedule(), &CacheOptions::default());
        store.set("marks_42", &marks(), &CacheOptions::default());

        let outcome = board
            .refresh(
                &ScriptedFetcher::always(schedule()),
                &ScriptedFetcher::<Vec<MarkRecord>>::new(vec![Err("offline".into())]),
            )
            .await;

        assert_eq!(outcome.schedule, Outcome::Replaced);
        assert_eq!(outcome.marks, Outcome::Failed);
        assert!(!store.has("marks_42"));
        assert!(board.marks().view().can_retry());
    }

    #[tokio::test]
    async fn test_cached_board_is_flagged() {
        let (store, board) = setup();
        store.set("schedule_42", &schedule(), &CacheOptions::default());

        let outcome = board
            .load(
                &ScriptedFetcher::<Vec<ScheduleEntry>>::new(vec![Err("offline".into())]),
                &ScriptedFetcher::always(marks()),
            )
            .await;

        assert_eq!(outcome.schedule, Outcome::KeptStale);
        assert!(board.using_cache());
        assert!(board.week_view(date(2024, 9, 9)).is_some());
    }
}
