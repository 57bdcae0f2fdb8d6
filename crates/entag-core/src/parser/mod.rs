pub mod extract;
pub mod inserter;
pub mod tags;

pub use extract::TagParser;
pub use inserter::{AnswerMode, TagInserter, TaggedRecord};
pub use tags::{ENTITY_CLOSE, ENTITY_OPEN, THINK_CLOSE, THINK_OPEN, wrap_entity};
