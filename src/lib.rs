pub mod day;
pub mod layout;
pub mod merge;
pub mod model;

pub use day::{week_layout, AccountFilter, DayLayout};
pub use layout::{layout, layout_with, LayoutOptions, DEFAULT_MIN_HEIGHT_PX};
pub use merge::merge;
pub use model::{Event, EventError, EventSpan, LayoutItem, MergedEvent, Percent};
