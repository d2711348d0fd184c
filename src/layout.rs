use crate::model::{LayoutItem, MergedEvent, Percent};
use chrono::{NaiveDateTime, Timelike};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::Range;

/// Smallest rendered height, so that very short events stay clickable.
pub const DEFAULT_MIN_HEIGHT_PX: f64 = 18.0;

const Z_INDEX_BASE: u32 = 1;

pub type TimeRange = (NaiveDateTime, NaiveDateTime);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutOptions {
    pub px_per_hour: f64,
    pub min_height_px: f64,
}

impl LayoutOptions {
    pub fn new(px_per_hour: f64) -> Self {
        LayoutOptions {
            px_per_hour,
            min_height_px: DEFAULT_MIN_HEIGHT_PX,
        }
    }

    pub fn with_min_height(mut self, min_height_px: f64) -> Self {
        self.min_height_px = min_height_px;
        self
    }
}

struct Slot<'a> {
    event: &'a MergedEvent,
    start: NaiveDateTime,
    end: NaiveDateTime,
    input_idx: usize,
}

impl Slot<'_> {
    fn order(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.event.event, &other.event.event);
        self.start
            .cmp(&other.start)
            .then(self.end.cmp(&other.end))
            .then_with(|| a.id.cmp(&b.id))
            .then_with(|| a.account_email.cmp(&b.account_email))
            .then_with(|| a.summary.cmp(&b.summary))
            .then_with(|| a.location.cmp(&b.location))
            .then_with(|| a.html_link.cmp(&b.html_link))
            .then_with(|| a.attendees.cmp(&b.attendees))
            .then(a.is_background.cmp(&b.is_background))
            .then_with(|| {
                self.event
                    .merged_accounts
                    .cmp(&other.event.merged_accounts)
            })
            .then(self.input_idx.cmp(&other.input_idx))
    }
}

pub fn layout(events: &[MergedEvent], px_per_hour: f64) -> Vec<LayoutItem> {
    layout_with(events, &LayoutOptions::new(px_per_hour))
}

pub fn layout_with(events: &[MergedEvent], options: &LayoutOptions) -> Vec<LayoutItem> {
    let mut slots: Vec<Slot<'_>> = Vec::with_capacity(events.len());
    for (input_idx, event) in events.iter().enumerate() {
        match event.event.timed_range() {
            Ok((start, end)) => slots.push(Slot {
                event,
                start,
                end,
                input_idx,
            }),
            Err(err) => debug!("event=layout_skip module=layout reason=\"{}\"", err),
        }
    }
    slots.sort_by(|a, b| a.order(b));

    let ranges: Vec<TimeRange> = slots.iter().map(|s| (s.start, s.end)).collect();
    let mut items = Vec::with_capacity(slots.len());
    let mut z_base = Z_INDEX_BASE;

    for (cluster_idx, cluster) in clusters(&ranges).into_iter().enumerate() {
        let members = &slots[cluster.clone()];
        let (columns, column_count) = assign_columns(&ranges[cluster]);
        let z_indices = stacking_order(&columns, z_base);

        for ((slot, &column), z_index) in members.iter().zip(&columns).zip(z_indices) {
            items.push(LayoutItem {
                event: slot.event.clone(),
                top: vertical_offset(slot.start, options.px_per_hour),
                height: vertical_extent(slot.start, slot.end, options),
                left: Percent::of(column, column_count),
                width: Percent::of(1, column_count),
                z_index,
                is_background: slot.event.event.is_background,
                column,
                column_count,
                cluster: cluster_idx,
            });
        }
        z_base += members.len() as u32;
    }

    debug!(
        "event=layout module=layout input={} placed={} px_per_hour={}",
        events.len(),
        items.len(),
        options.px_per_hour
    );
    items
}

/// Half-open interval intersection; touching ranges do not overlap.
pub fn overlaps(a: TimeRange, b: TimeRange) -> bool {
    a.0 < b.1 && b.0 < a.1
}

/// Splits ranges sorted by start into maximal chains of overlapping ranges.
pub fn clusters(sorted: &[TimeRange]) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut begin = 0;
    let mut cluster_end: Option<NaiveDateTime> = None;

    for (idx, &(start, end)) in sorted.iter().enumerate() {
        match cluster_end {
            Some(open_end) if start < open_end => {
                cluster_end = Some(open_end.max(end));
            }
            Some(_) => {
                out.push(begin..idx);
                begin = idx;
                cluster_end = Some(end);
            }
            None => cluster_end = Some(end),
        }
    }
    if cluster_end.is_some() {
        out.push(begin..sorted.len());
    }
    out
}

pub fn assign_columns(sorted: &[TimeRange]) -> (Vec<usize>, usize) {
    let mut column_ends: Vec<NaiveDateTime> = Vec::new();
    let mut assigned = Vec::with_capacity(sorted.len());

    for &(start, end) in sorted {
        match column_ends.iter().position(|&free_at| free_at <= start) {
            Some(column) => {
                column_ends[column] = end;
                assigned.push(column);
            }
            None => {
                assigned.push(column_ends.len());
                column_ends.push(end);
            }
        }
    }
    (assigned, column_ends.len())
}

/// The largest number of ranges in progress at any single instant.
pub fn max_concurrency(ranges: &[TimeRange]) -> usize {
    let mut edges: Vec<(NaiveDateTime, i32)> = Vec::with_capacity(ranges.len() * 2);
    for &(start, end) in ranges {
        if start < end {
            edges.push((start, 1));
            edges.push((end, -1));
        }
    }
    // ends sort before starts at the same instant
    edges.sort();
    let mut active = 0i32;
    let mut peak = 0i32;
    for (_, delta) in edges {
        active += delta;
        peak = peak.max(active);
    }
    peak as usize
}

// z grows with column, then with sorted position inside the column.
fn stacking_order(columns: &[usize], base: u32) -> Vec<u32> {
    let mut ranked: Vec<usize> = (0..columns.len()).collect();
    ranked.sort_by_key(|&idx| (columns[idx], idx));
    let mut z = vec![0; columns.len()];
    for (rank, idx) in ranked.into_iter().enumerate() {
        z[idx] = base + rank as u32;
    }
    z
}

fn minutes_since_midnight(at: NaiveDateTime) -> f64 {
    f64::from(at.time().num_seconds_from_midnight()) / 60.0
}

fn vertical_offset(start: NaiveDateTime, px_per_hour: f64) -> f64 {
    minutes_since_midnight(start) / 60.0 * px_per_hour
}

fn vertical_extent(start: NaiveDateTime, end: NaiveDateTime, options: &LayoutOptions) -> f64 {
    let minutes = (end - start).num_seconds() as f64 / 60.0;
    (minutes / 60.0 * options.px_per_hour).max(options.min_height_px)
}
