use crate::layout::{layout_with, LayoutOptions};
use crate::merge::merge;
use crate::model::{Event, EventSpan, LayoutItem, MergedEvent};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Restricts which accounts contribute events. Empty means every account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFilter {
    accounts: BTreeSet<String>,
}

impl AccountFilter {
    pub fn all() -> Self {
        AccountFilter::default()
    }

    pub fn only<I, S>(accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AccountFilter {
            accounts: accounts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, event: &Event) -> bool {
        self.accounts.is_empty() || self.accounts.contains(&event.account_email)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayLayout {
    pub date: NaiveDate,
    pub all_day: Vec<MergedEvent>,
    pub timed: Vec<LayoutItem>,
}

impl DayLayout {
    pub fn build(
        events: &[Event],
        date: NaiveDate,
        filter: &AccountFilter,
        options: &LayoutOptions,
    ) -> Self {
        let todays: Vec<Event> = events
            .iter()
            .filter(|e| filter.allows(e) && occurs_on(e, date))
            .cloned()
            .collect();

        let (all_day, timed): (Vec<MergedEvent>, Vec<MergedEvent>) = merge(&todays)
            .into_iter()
            .partition(|m| m.event.is_all_day());
        let timed: Vec<MergedEvent> = timed
            .into_iter()
            .map(|mut m| {
                m.event = clip_to_day(&m.event, date);
                m
            })
            .collect();

        DayLayout {
            date,
            all_day,
            timed: layout_with(&timed, options),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all_day.is_empty() && self.timed.is_empty()
    }

    pub fn max_columns(&self) -> usize {
        self.timed
            .iter()
            .map(|i| i.column_count)
            .max()
            .unwrap_or(0)
    }
}

pub fn week_layout(
    events: &[Event],
    anchor: NaiveDate,
    week_start: Weekday,
    filter: &AccountFilter,
    options: &LayoutOptions,
) -> Vec<DayLayout> {
    let first = start_of_week(anchor, week_start);
    (0..7)
        .map(|offset| DayLayout::build(events, first + Duration::days(offset), filter, options))
        .collect()
}

pub fn start_of_week(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let back = (7 + date.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    date - Duration::days(i64::from(back))
}

fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(chrono::NaiveTime::MIN);
    (start, start + Duration::days(1))
}

pub fn occurs_on(event: &Event, date: NaiveDate) -> bool {
    match event.span() {
        Some(EventSpan::Timed { start, end }) => {
            let (day_start, day_end) = day_bounds(date);
            if start == end {
                return start >= day_start && start < day_end;
            }
            start < day_end && end > day_start
        }
        Some(EventSpan::AllDay { start, end }) => {
            if end <= start {
                date == start
            } else {
                start <= date && date < end
            }
        }
        // merge and layout decide what to do with these
        None => true,
    }
}

pub fn clip_to_day(event: &Event, date: NaiveDate) -> Event {
    let mut clipped = event.clone();
    if let Some(EventSpan::Timed { start, end }) = event.span() {
        let (day_start, day_end) = day_bounds(date);
        if start < day_start {
            clipped.start_time = Some(day_start);
        }
        if end > day_end {
            clipped.end_time = Some(day_end);
        }
    }
    clipped
}
