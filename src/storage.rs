use anyhow::{Context, Result};
use chrono::Weekday;
use daygrid::{Event, EventError, LayoutOptions, DEFAULT_MIN_HEIGHT_PX};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const PROJECT_DIR: &str = ".daygrid";
const EVENTS_FILE: &str = "events.yml";
const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventsScope {
    Explicit,
    Project,
    Global,
}

impl EventsScope {
    pub fn label(&self) -> &'static str {
        match self {
            EventsScope::Explicit => "file",
            EventsScope::Project => "project",
            EventsScope::Global => "global",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventsLocation {
    pub path: PathBuf,
    pub scope: EventsScope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub day_px_per_hour: f64,
    pub week_px_per_hour: f64,
    pub min_height_px: f64,
    #[serde(with = "weekday_name")]
    pub week_starts_on: Weekday,
    pub log_level: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            day_px_per_hour: 60.0,
            week_px_per_hour: 40.0,
            min_height_px: DEFAULT_MIN_HEIGHT_PX,
            week_starts_on: Weekday::Mon,
            log_level: "info".into(),
        }
    }
}

impl ViewConfig {
    pub fn day_options(&self, px_per_hour: Option<f64>) -> LayoutOptions {
        LayoutOptions::new(px_per_hour.unwrap_or(self.day_px_per_hour))
            .with_min_height(self.min_height_px)
    }

    pub fn week_options(&self, px_per_hour: Option<f64>) -> LayoutOptions {
        LayoutOptions::new(px_per_hour.unwrap_or(self.week_px_per_hour))
            .with_min_height(self.min_height_px)
    }
}

mod weekday_name {
    use chrono::Weekday;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&day.to_string().to_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weekday, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<Weekday>()
            .map_err(|_| serde::de::Error::custom(format!("unknown weekday: {}", raw)))
    }
}

pub fn init_project_events() -> Result<EventsLocation> {
    let cwd = env::current_dir()?;
    let dir = cwd.join(PROJECT_DIR);
    fs::create_dir_all(&dir).context("failed to create .daygrid directory")?;
    let location = EventsLocation {
        path: dir.join(EVENTS_FILE),
        scope: EventsScope::Project,
    };
    if !location.path.exists() {
        save_events(&location, &[])?;
    }
    Ok(location)
}

pub fn locate_events(explicit: Option<&Path>, start: &Path) -> Result<EventsLocation> {
    if let Some(path) = explicit {
        return Ok(EventsLocation {
            path: path.to_path_buf(),
            scope: EventsScope::Explicit,
        });
    }
    if let Some(project_path) = find_project_events(start) {
        return Ok(EventsLocation {
            path: project_path,
            scope: EventsScope::Project,
        });
    }
    Ok(EventsLocation {
        path: project_dirs()?.data_dir().join(EVENTS_FILE),
        scope: EventsScope::Global,
    })
}

/// Reads the event list. A missing project or global file is an empty calendar.
pub fn load_events(location: &EventsLocation) -> Result<Vec<Event>> {
    if !location.path.exists() && location.scope != EventsScope::Explicit {
        return Ok(Vec::new());
    }
    let data = fs::read_to_string(&location.path)
        .with_context(|| format!("reading {:?}", location.path))?;
    parse_events(&data).with_context(|| format!("parsing {:?}", location.path))
}

/// Parses a YAML (or JSON) list of events.
pub fn parse_events(data: &str) -> Result<Vec<Event>> {
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }
    let events: Vec<Event> = serde_yaml::from_str(data).context("parsing events")?;
    Ok(events)
}

pub fn save_events(location: &EventsLocation, events: &[Event]) -> Result<()> {
    if let Some(parent) = location.path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(events).context("serializing events")?;
    fs::write(&location.path, serialized)
        .with_context(|| format!("writing {:?}", location.path))?;
    Ok(())
}

/// Timed events the layout engine will leave out.
pub fn validate_events(events: &[Event]) -> Vec<EventError> {
    events
        .iter()
        .filter(|e| !e.is_all_day())
        .filter_map(|e| e.timed_range().err())
        .collect()
}

pub fn load_config() -> Result<ViewConfig> {
    let path = project_dirs()?.config_dir().join(CONFIG_FILE);
    if path.exists() {
        let data = fs::read_to_string(&path).with_context(|| format!("reading {:?}", path))?;
        let config: ViewConfig = serde_yaml::from_str(&data).context("parsing config file")?;
        Ok(config)
    } else {
        let config = ViewConfig::default();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
        }
        let serialized = serde_yaml::to_string(&config).context("serializing config")?;
        fs::write(&path, serialized).with_context(|| format!("writing {:?}", path))?;
        Ok(config)
    }
}

pub fn log_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("logs"))
}

fn find_project_events(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(PROJECT_DIR).join(EVENTS_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "daygrid").context("locating data directory")
}
