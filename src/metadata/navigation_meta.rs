use serde::Deserialize;

use crate::metadata::ForeignKey;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NavigationMeta {
    pub member: String,
    /// Entity name of the navigated type (the element type for sequences).
    pub target: String,
    #[serde(default)]
    pub many: bool,
    #[serde(default)]
    pub foreign_key: Option<ForeignKey>,
}

impl NavigationMeta {
    pub fn one(member: &str, target: &str, foreign_key: ForeignKey) -> Self {
        Self { member: member.to_string(), target: target.to_string(), many: false, foreign_key: Some(foreign_key) }
    }

    pub fn many(member: &str, target: &str, foreign_key: ForeignKey) -> Self {
        Self { member: member.to_string(), target: target.to_string(), many: true, foreign_key: Some(foreign_key) }
    }

    /// A relation with no declared key; it cannot be joined.
    pub fn unkeyed(member: &str, target: &str, many: bool) -> Self {
        Self { member: member.to_string(), target: target.to_string(), many, foreign_key: None }
    }
}
