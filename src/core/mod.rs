pub mod color;
pub mod format;
pub mod scale;
pub mod ticks;
pub mod time_scale;
pub mod types;

pub use color::Color;
pub use format::{TimeFormatter, ValueFormatter};
pub use scale::{ScaleKind, ValueScale};
pub use ticks::{TickSize, TickSpec, TimeInterval};
pub use time_scale::TimeScale;
pub use types::{Extent, HorizonMode, Orientation, Summarize, TimeRange};
