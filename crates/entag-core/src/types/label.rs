use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Entity classes of the CoNLL-2003 tag set.
///
/// Serializes as the human-readable name (`"Person"`), parses from the
/// annotation code (`"PER"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityLabel {
    Person,
    Location,
    Organization,
    Miscellaneous,
}

impl EntityLabel {
    /// All labels in annotation order.
    pub const ALL: [EntityLabel; 4] = [
        EntityLabel::Person,
        EntityLabel::Location,
        EntityLabel::Organization,
        EntityLabel::Miscellaneous,
    ];

    /// The short annotation code used in raw records.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Person => "PER",
            Self::Location => "LOC",
            Self::Organization => "ORG",
            Self::Miscellaneous => "MISC",
        }
    }

    /// The human-readable name used in prompts and derived examples.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::Location => "Location",
            Self::Organization => "Organization",
            Self::Miscellaneous => "Miscellaneous",
        }
    }

    /// Looks up a label by its annotation code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.code() == code)
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip() {
        for label in EntityLabel::ALL {
            assert_eq!(EntityLabel::from_code(label.code()), Some(label));
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(EntityLabel::from_code("per"), None);
        assert_eq!("DATE".parse::<EntityLabel>(), Err("DATE".to_string()));
    }

    #[test]
    fn serializes_as_name() {
        let json = serde_json::to_string(&EntityLabel::Organization).unwrap();
        assert_eq!(json, "\"Organization\"");
        assert_eq!(EntityLabel::Miscellaneous.to_string(), "Miscellaneous");
    }
}
