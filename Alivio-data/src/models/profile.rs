use serde::{Deserialize, Serialize};

/// Storage model for the single user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Display name
    pub name: String,

    /// Optional age in years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    /// Migraine type label chosen during onboarding
    #[serde(default)]
    pub migraine_type: String,

    /// When the user joined (ISO-8601)
    #[serde(default)]
    pub joined_date: String,

    /// Avatar as a URL or inline image data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UserProfile {
    pub fn new(name: impl Into<String>, migraine_type: impl Into<String>, joined_date: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: None,
            migraine_type: migraine_type.into(),
            joined_date: joined_date.into(),
            avatar: None,
        }
    }
}
