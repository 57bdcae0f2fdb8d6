use serde::{Deserialize, Serialize};

use super::label::EntityLabel;

/// A supervision example derived from one span record.
///
/// `answer` holds the canonical tagged string the model is trained and
/// evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub context: String,
    pub entity: EntityLabel,
    pub query: String,
    pub answer: String,
}
