use chrono::{NaiveDate, NaiveDateTime};
use daygrid::{layout, merge, AccountFilter, DayLayout, Event, LayoutItem, LayoutOptions};

fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 13)
        .and_then(|d| d.and_hms_opt(h, m, 0))
        .unwrap()
}

fn by_id<'a>(items: &'a [LayoutItem], id: &str) -> &'a LayoutItem {
    items
        .iter()
        .find(|i| i.event.event.id == id)
        .unwrap_or_else(|| panic!("no layout item for {}", id))
}

#[test]
fn overlapping_pair_shares_the_column() {
    let events = vec![
        Event::timed("first", "Design", at(9, 0), at(10, 0), "me@x.com"),
        Event::timed("second", "Review", at(9, 30), at(10, 30), "me@x.com"),
    ];
    let items = layout(&merge(&events), 60.0);

    let first = by_id(&items, "first");
    assert_eq!(first.column_count, 2);
    assert_eq!(first.left.to_string(), "0%");
    assert_eq!(first.width.to_string(), "50%");
    assert_eq!(first.top, 540.0);
    assert_eq!(first.height, 60.0);

    let second = by_id(&items, "second");
    assert_eq!(second.left.to_string(), "50%");
    assert_eq!(second.width.to_string(), "50%");
    assert_eq!(second.top, 570.0);
    assert_eq!(second.height, 60.0);
}

#[test]
fn transitive_chain_is_one_cluster_of_two_columns() {
    let events = vec![
        Event::timed("A", "A", at(9, 0), at(9, 30), "me@x.com"),
        Event::timed("B", "B", at(9, 15), at(10, 0), "me@x.com"),
        Event::timed("C", "C", at(9, 45), at(10, 15), "me@x.com"),
    ];
    let items = layout(&merge(&events), 60.0);
    assert!(items.iter().all(|i| i.cluster == 0 && i.column_count == 2));
    assert_eq!(by_id(&items, "A").column, 0);
    assert_eq!(by_id(&items, "B").column, 1);
    assert_eq!(by_id(&items, "C").column, 0);
}

#[test]
fn duplicate_standup_is_merged_across_accounts() {
    let events = vec![
        Event::timed("s1", "Standup", at(9, 0), at(9, 15), "alice@x.com"),
        Event::timed("s2", "Standup", at(9, 0), at(9, 15), "bob@x.com"),
    ];
    let merged = merge(&events);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].merged_accounts, vec!["alice@x.com", "bob@x.com"]);

    let items = layout(&merged, 60.0);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].width.to_string(), "100%");
    assert!(items[0].event.is_multi_account());
}

#[test]
fn disjoint_events_each_span_full_width() {
    let events = vec![
        Event::timed("a", "Gym", at(7, 0), at(8, 0), "me@x.com"),
        Event::timed("b", "Lunch", at(12, 0), at(13, 0), "me@x.com"),
        Event::timed("c", "Dinner", at(19, 0), at(20, 30), "me@x.com"),
    ];
    let items = layout(&merge(&events), 60.0);
    assert_eq!(items.len(), 3);
    for item in &items {
        assert_eq!(item.column_count, 1);
        assert_eq!(item.left.to_string(), "0%");
        assert_eq!(item.width.to_string(), "100%");
    }
}

#[test]
fn malformed_event_does_not_disturb_the_day() {
    let mut broken = Event::timed("broken", "Broken", at(9, 0), at(10, 0), "me@x.com");
    broken.end_time = None;
    let events = vec![
        broken,
        Event::timed("a", "Design", at(9, 0), at(10, 0), "me@x.com"),
        Event::timed("b", "Review", at(9, 30), at(10, 30), "me@x.com"),
    ];
    let items = layout(&merge(&events), 60.0);
    assert_eq!(items.len(), 2);
    assert_eq!(by_id(&items, "a").column_count, 2);
}

#[test]
fn layout_runs_are_identical() {
    let events = vec![
        Event::timed("a", "One", at(9, 0), at(10, 0), "a@x.com"),
        Event::timed("b", "Two", at(9, 0), at(10, 0), "b@x.com"),
        Event::timed("c", "Three", at(9, 30), at(11, 0), "a@x.com"),
        Event::timed("d", "One", at(9, 0), at(10, 0), "b@x.com"),
    ];
    let first = layout(&merge(&events), 48.0);
    let second = layout(&merge(&events), 48.0);
    assert_eq!(first, second);
}

#[test]
fn day_pipeline_from_yaml_fixture() {
    let data = r#"
- id: g-1
  summary: Standup
  start_time: 2024-05-13T09:00:00
  end_time: 2024-05-13T09:15:00
  account_email: alice@x.com
  location: Room 4
- id: o-9
  summary: Standup
  start_time: 2024-05-13T09:00:00
  end_time: 2024-05-13T09:15:00
  account_email: bob@x.com
  location: Teams
- id: g-2
  summary: Roadmap
  start_time: 2024-05-13T09:00:00
  end_time: 2024-05-13T11:00:00
  account_email: alice@x.com
- id: t-1
  summary: Triage
  start_time: 2024-05-13T14:00:00
  end_time: 2024-05-13T15:00:00
  account_email: alice@x.com
- id: t-2
  summary: Interview
  start_time: 2024-05-13T14:20:00
  end_time: 2024-05-13T15:00:00
  account_email: bob@x.com
- id: t-3
  summary: Pairing
  start_time: 2024-05-13T14:40:00
  end_time: 2024-05-13T15:00:00
  account_email: alice@x.com
- id: g-3
  summary: Conference
  start_date: 2024-05-13
  end_date: 2024-05-15
  account_email: alice@x.com
"#;
    let events: Vec<Event> = serde_yaml::from_str(data).unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 5, 13).unwrap();
    let day = DayLayout::build(&events, date, &AccountFilter::all(), &LayoutOptions::new(60.0));

    assert_eq!(day.all_day.len(), 1);
    assert_eq!(day.timed.len(), 5);
    let standup = by_id(&day.timed, "g-1");
    assert_eq!(standup.event.event.location.as_deref(), Some("Room 4"));
    assert_eq!(standup.event.merged_accounts, vec!["alice@x.com", "bob@x.com"]);
    assert_eq!(standup.column, 0);
    assert_eq!(by_id(&day.timed, "g-2").column, 1);

    let thirds: Vec<&LayoutItem> = day.timed.iter().filter(|i| i.column_count == 3).collect();
    assert_eq!(thirds.len(), 3);
    let total: f64 = thirds.iter().map(|i| i.width.value()).sum();
    assert!((total - 100.0).abs() < 1e-9);
    let last = by_id(&day.timed, "t-3");
    let middle = by_id(&day.timed, "t-2");
    assert_eq!(middle.left.value() + middle.width.value(), last.left.value());

    let yaml = serde_yaml::to_string(&day).unwrap();
    assert!(!yaml.contains("33.3333%"));
    let back: DayLayout = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(back, day);
}
