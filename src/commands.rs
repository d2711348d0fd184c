use crate::cli::Source;
use crate::storage::{
    init_project_events, load_events, locate_events, validate_events, EventsLocation, ViewConfig,
};
use crate::ui;
use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use daygrid::day::occurs_on;
use daygrid::{merge as merge_events, week_layout, AccountFilter, DayLayout, Event, LayoutItem};
use log::warn;
use std::env;

pub fn init() -> Result<()> {
    let location = init_project_events()?;
    println!("Initialized events file at {}", location.path.display());
    Ok(())
}

pub fn merge(source: &Source, date: Option<String>) -> Result<()> {
    let (events, location) = load_source(source)?;
    let date = parse_date(date.as_deref())?;
    let filter = account_filter(source);
    let todays: Vec<Event> = events
        .into_iter()
        .filter(|e| filter.allows(e) && occurs_on(e, date))
        .collect();
    let merged = merge_events(&todays);
    println!(
        "{} ({}): {} events, {} after merging",
        date,
        location.scope.label(),
        todays.len(),
        merged.len()
    );
    for m in &merged {
        let marker = if m.is_multi_account() { "*" } else { " " };
        println!(
            "{} {:<13} {}  [{}]",
            marker,
            format_range(&m.event),
            m.event.title(),
            m.merged_accounts.join(", ")
        );
    }
    Ok(())
}

pub fn day(
    config: &ViewConfig,
    source: &Source,
    date: Option<String>,
    px_per_hour: Option<f64>,
    yaml: bool,
) -> Result<()> {
    let (events, _) = load_source(source)?;
    let date = parse_date(date.as_deref())?;
    let options = config.day_options(px_per_hour);
    let layout = DayLayout::build(&events, date, &account_filter(source), &options);
    if yaml {
        print!("{}", serde_yaml::to_string(&layout).context("serializing layout")?);
        return Ok(());
    }
    print_day(&layout);
    Ok(())
}

pub fn week(
    config: &ViewConfig,
    source: &Source,
    date: Option<String>,
    px_per_hour: Option<f64>,
) -> Result<()> {
    let (events, _) = load_source(source)?;
    let anchor = parse_date(date.as_deref())?;
    let options = config.week_options(px_per_hour);
    let days = week_layout(
        &events,
        anchor,
        config.week_starts_on,
        &account_filter(source),
        &options,
    );
    for day in &days {
        print_day(day);
        println!();
    }
    Ok(())
}

pub fn check(source: &Source) -> Result<()> {
    let (events, location) = load_source(source)?;
    let problems = validate_events(&events);
    if problems.is_empty() {
        println!(
            "{}: {} events, all placeable",
            location.path.display(),
            events.len()
        );
        return Ok(());
    }
    println!(
        "{}: {} of {} events will be skipped",
        location.path.display(),
        problems.len(),
        events.len()
    );
    for problem in problems {
        println!("  - {}", problem);
    }
    Ok(())
}

pub fn tui(config: ViewConfig, source: &Source, date: Option<String>) -> Result<()> {
    let (events, location) = load_source(source)?;
    let date = parse_date(date.as_deref())?;
    ui::run(events, location, config, account_filter(source), date)
}

fn load_source(source: &Source) -> Result<(Vec<Event>, EventsLocation)> {
    let cwd = env::current_dir()?;
    let location = locate_events(source.file.as_deref(), &cwd)?;
    let events = load_events(&location)?;
    let skipped = validate_events(&events);
    if !skipped.is_empty() {
        warn!(
            "event=load module=commands path={} skipped={}",
            location.path.display(),
            skipped.len()
        );
    }
    Ok((events, location))
}

fn account_filter(source: &Source) -> AccountFilter {
    AccountFilter::only(source.accounts.iter().cloned())
}

pub(crate) fn parse_date(input: Option<&str>) -> Result<NaiveDate> {
    let raw = match input {
        Some(r) => r.trim(),
        None => return Ok(Local::now().date_naive()),
    };
    if raw.is_empty() {
        return Ok(Local::now().date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid date format (use YYYY-MM-DD): {}", raw))
}

fn format_time(dt: &NaiveDateTime) -> String {
    dt.format("%H:%M").to_string()
}

fn format_range(event: &Event) -> String {
    match (event.start_time, event.end_time) {
        (Some(start), Some(end)) => format!("{}-{}", format_time(&start), format_time(&end)),
        _ if event.is_all_day() => "all day".to_string(),
        _ => "??".to_string(),
    }
}

fn day_heading(layout: &DayLayout) -> String {
    let date = layout.date.format("%A %Y-%m-%d");
    if layout.is_empty() {
        return date.to_string();
    }
    format!(
        "{}  ({} timed, {} all day, {} columns max)",
        date,
        layout.timed.len(),
        layout.all_day.len(),
        layout.max_columns()
    )
}

fn print_day(layout: &DayLayout) {
    println!("{}", day_heading(layout));
    if layout.is_empty() {
        println!("  (empty)");
        return;
    }
    for m in &layout.all_day {
        let marker = if m.is_multi_account() { "*" } else { " " };
        println!("  {} all day       {}", marker, m.event.title());
    }
    for item in &layout.timed {
        print_item(item);
    }
}

fn print_item(item: &LayoutItem) {
    let marker = if item.event.is_multi_account() { "*" } else { " " };
    println!(
        "  {} {:<13} col {}/{} left {:>8} width {:>8} top {:>6.1} h {:>5.1} z {:>3}  {}",
        marker,
        format_range(&item.event.event),
        item.column + 1,
        item.column_count,
        item.left.to_string(),
        item.width.to_string(),
        item.top,
        item.height,
        item.z_index,
        item.event.event.title()
    );
}
