pub mod builder;
pub mod context;
pub mod counters;
pub mod dispatcher;
pub mod error;
pub mod formatting;
pub mod inline;
pub mod options;
pub mod style;

pub use builder::{BuildError, DocumentBuilder, RecordingBuilder, Region};
pub use context::ConversionContext;
pub use counters::Counters;
pub use dispatcher::{convert, render};
pub use error::RenderError;
pub use formatting::Formatting;
pub use options::{RenderOptions, SoftBreak};
