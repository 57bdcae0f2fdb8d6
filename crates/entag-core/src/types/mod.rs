pub mod example;
pub mod label;
pub mod record;

pub use example::LabeledExample;
pub use label::EntityLabel;
pub use record::{RawSpanRecord, Span, SpanRecord};
