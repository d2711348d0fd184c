use crate::model::{Event, EventSpan, MergedEvent};
use log::debug;
use std::collections::HashMap;

type MergeKey<'a> = (&'a str, EventSpan);

fn merge_key(event: &Event) -> Option<MergeKey<'_>> {
    let summary = event.summary.as_deref()?;
    let span = event.span()?;
    Some((summary, span))
}

/// Groups `events` into merge classes, preserving first-seen order.
pub fn merge(events: &[Event]) -> Vec<MergedEvent> {
    let mut merged: Vec<MergedEvent> = Vec::with_capacity(events.len());
    let mut classes: HashMap<MergeKey<'_>, usize> = HashMap::new();

    for event in events {
        let Some(key) = merge_key(event) else {
            debug!(
                "event=merge_skip module=merge id={} reason=incomplete",
                event.id
            );
            merged.push(MergedEvent::single(event.clone()));
            continue;
        };
        match classes.get(&key) {
            Some(&idx) => {
                let accounts = &mut merged[idx].merged_accounts;
                if !accounts.iter().any(|a| a == &event.account_email) {
                    accounts.push(event.account_email.clone());
                }
            }
            None => {
                classes.insert(key, merged.len());
                merged.push(MergedEvent::single(event.clone()));
            }
        }
    }

    debug!(
        "event=merge module=merge input={} output={}",
        events.len(),
        merged.len()
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn duplicate_invites_collapse_into_one() {
        let events = vec![
            Event::timed("1", "Standup", at(9, 0), at(9, 15), "alice@x.com"),
            Event::timed("2", "Standup", at(9, 0), at(9, 15), "bob@x.com"),
        ];
        let merged = merge(&events);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].merged_accounts, vec!["alice@x.com", "bob@x.com"]);
        assert_eq!(merged[0].event.id, "1");
        assert!(merged[0].is_multi_account());
    }

    #[test]
    fn any_difference_prevents_merging() {
        let base = Event::timed("1", "Review", at(10, 0), at(11, 0), "alice@x.com");
        let mut renamed = base.clone();
        renamed.summary = Some("Review ".into());
        renamed.account_email = "bob@x.com".into();
        let mut moved = base.clone();
        moved.start_time = Some(at(10, 1));
        moved.account_email = "bob@x.com".into();
        let mut extended = base.clone();
        extended.end_time = Some(at(11, 1));
        extended.account_email = "bob@x.com".into();

        for other in [renamed, moved, extended] {
            let merged = merge(&[base.clone(), other]);
            assert_eq!(merged.len(), 2);
            assert!(merged.iter().all(|m| !m.is_multi_account()));
        }
    }

    #[test]
    fn same_account_is_listed_once() {
        let events = vec![
            Event::timed("1", "1:1", at(14, 0), at(14, 30), "alice@x.com"),
            Event::timed("2", "1:1", at(14, 0), at(14, 30), "bob@x.com"),
            Event::timed("3", "1:1", at(14, 0), at(14, 30), "alice@x.com"),
        ];
        let merged = merge(&events);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].merged_accounts, vec!["alice@x.com", "bob@x.com"]);
    }

    #[test]
    fn first_seen_order_and_representative_are_kept() {
        let mut first = Event::timed("a1", "Planning", at(13, 0), at(14, 0), "b@x.com");
        first.location = Some("Room 1".into());
        let mut second = first.clone();
        second.id = "a2".into();
        second.account_email = "a@x.com".into();
        second.location = Some("Room 2".into());
        let events = vec![
            Event::timed("z", "Lunch", at(12, 0), at(13, 0), "a@x.com"),
            first,
            Event::timed("y", "Focus", at(8, 0), at(9, 0), "a@x.com"),
            second,
        ];
        let merged = merge(&events);
        let ids: Vec<&str> = merged.iter().map(|m| m.event.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a1", "y"]);
        assert_eq!(merged[1].event.location.as_deref(), Some("Room 1"));
        assert_eq!(merged[1].merged_accounts, vec!["b@x.com", "a@x.com"]);
    }

    #[test]
    fn empty_summary_still_merges() {
        let events = vec![
            Event::timed("1", "", at(9, 0), at(10, 0), "a@x.com"),
            Event::timed("2", "", at(9, 0), at(10, 0), "b@x.com"),
        ];
        assert_eq!(merge(&events).len(), 1);
    }

    #[test]
    fn all_day_events_merge_only_with_all_day() {
        let events = vec![
            Event::all_day("1", "Offsite", day(4), day(5), "a@x.com"),
            Event::all_day("2", "Offsite", day(4), day(5), "b@x.com"),
            Event::timed("3", "Offsite", at(0, 0), at(23, 59), "c@x.com"),
        ];
        let merged = merge(&events);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].merged_accounts, vec!["a@x.com", "b@x.com"]);
        assert_eq!(merged[1].merged_accounts, vec!["c@x.com"]);
    }

    #[test]
    fn incomplete_events_never_merge() {
        let untitled = Event {
            id: "1".into(),
            start_time: Some(at(9, 0)),
            end_time: Some(at(10, 0)),
            account_email: "a@x.com".into(),
            ..Event::default()
        };
        let mut untitled_copy = untitled.clone();
        untitled_copy.account_email = "b@x.com".into();
        let timeless = Event {
            id: "2".into(),
            summary: Some("Floating".into()),
            account_email: "a@x.com".into(),
            ..Event::default()
        };
        let mut timeless_copy = timeless.clone();
        timeless_copy.account_email = "b@x.com".into();

        let merged = merge(&[untitled, untitled_copy, timeless, timeless_copy]);
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(merge(&[]).is_empty());
    }
}
