use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub type EventId = String;

/// A calendar entry as observed through one connected account.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Event {
    pub id: EventId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub account_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    #[serde(default)]
    pub is_background: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSpan {
    Timed {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    AllDay { start: NaiveDate, end: NaiveDate },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("event {0} has no usable time range")]
    MissingTimeRange(EventId),
    #[error("event {0} is an all-day event")]
    AllDay(EventId),
    #[error("event {id} ends at {end} which is not after its start {start}")]
    EmptyRange {
        id: EventId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

impl Event {
    pub fn timed(
        id: impl Into<String>,
        summary: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        account_email: impl Into<String>,
    ) -> Self {
        Event {
            id: id.into(),
            summary: Some(summary.into()),
            start_time: Some(start),
            end_time: Some(end),
            account_email: account_email.into(),
            ..Event::default()
        }
    }

    pub fn all_day(
        id: impl Into<String>,
        summary: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        account_email: impl Into<String>,
    ) -> Self {
        Event {
            id: id.into(),
            summary: Some(summary.into()),
            start_date: Some(start),
            end_date: Some(end),
            account_email: account_email.into(),
            ..Event::default()
        }
    }

    /// Returns `None` unless exactly one complete pair of time fields is set.
    pub fn span(&self) -> Option<EventSpan> {
        let timed = match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(EventSpan::Timed { start, end }),
            (None, None) => None,
            _ => return None,
        };
        let all_day = match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(EventSpan::AllDay { start, end }),
            (None, None) => None,
            _ => return None,
        };
        match (timed, all_day) {
            (Some(span), None) | (None, Some(span)) => Some(span),
            _ => None,
        }
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self.span(), Some(EventSpan::AllDay { .. }))
    }

    pub fn timed_range(&self) -> Result<(NaiveDateTime, NaiveDateTime), EventError> {
        match self.span() {
            Some(EventSpan::Timed { start, end }) if start < end => Ok((start, end)),
            Some(EventSpan::Timed { start, end }) => Err(EventError::EmptyRange {
                id: self.id.clone(),
                start,
                end,
            }),
            Some(EventSpan::AllDay { .. }) => Err(EventError::AllDay(self.id.clone())),
            None => Err(EventError::MissingTimeRange(self.id.clone())),
        }
    }

    pub fn title(&self) -> &str {
        match self.summary.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => "(no title)",
        }
    }
}

/// One display entity standing for every account-level copy of the same entry.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MergedEvent {
    #[serde(flatten)]
    pub event: Event,
    #[serde(rename = "_mergedAccounts")]
    pub merged_accounts: Vec<String>,
}

impl MergedEvent {
    pub fn single(event: Event) -> Self {
        let merged_accounts = vec![event.account_email.clone()];
        MergedEvent {
            event,
            merged_accounts,
        }
    }

    pub fn is_multi_account(&self) -> bool {
        self.merged_accounts.len() > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Percent(pub f64);

impl Percent {
    pub fn of(numerator: usize, denominator: usize) -> Self {
        if denominator == 0 {
            return Percent(0.0);
        }
        Percent(numerator as f64 * 100.0 / denominator as f64)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Maps the percentage onto `total` cells, rounding to the nearest cell.
    pub fn scale(self, total: u16) -> u16 {
        let cells = (self.0 / 100.0 * f64::from(total)).round();
        cells.clamp(0.0, f64::from(total)) as u16
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Serialize for Percent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Percent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .map(Percent)
            .map_err(serde::de::Error::custom)
    }
}

/// A merged event placed on the day timeline.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutItem {
    #[serde(flatten)]
    pub event: MergedEvent,
    pub top: f64,
    pub height: f64,
    pub left: Percent,
    pub width: Percent,
    pub z_index: u32,
    pub is_background: bool,
    pub column: usize,
    pub column_count: usize,
    pub cluster: usize,
}

impl LayoutItem {
    pub fn horizontal_span(&self) -> (f64, f64) {
        (self.left.0, self.left.0 + self.width.0)
    }
}
