//! The profile document shape. Fields may be empty strings/arrays; the
//! summariser fills them in over time through patches. Unknown fields are
//! rejected so a bad patch is caught at validation instead of silently
//! growing the document.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileDoc {
    #[serde(default)]
    pub bot: BotProfile,
    #[serde(default)]
    pub user: UserProfile,
    #[serde(default)]
    pub memorable_events: Vec<MemorableEvent>,
    /// Free-form agreements between bot and user ("call me at 8", inside
    /// jokes, standing instructions).
    #[serde(default)]
    pub commands_and_agreements: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BotProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub birthday: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub appearance: String,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub dislikes: Vec<String>,
    #[serde(default)]
    pub language_style: LanguageStyle,
    #[serde(default)]
    pub personality: Personality,
    #[serde(default)]
    pub emotions_and_needs: EmotionsAndNeeds,
    #[serde(default)]
    pub relationship_with_user: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub birthday: String,
    #[serde(default)]
    pub personal_facts: Vec<String>,
    #[serde(default)]
    pub abilities: Vec<String>,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub dislikes: Vec<String>,
    #[serde(default)]
    pub personality: Personality,
    #[serde(default)]
    pub emotions_and_needs: EmotionsAndNeeds,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguageStyle {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Personality {
    #[serde(default)]
    pub mbti: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub worldview_and_values: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmotionsAndNeeds {
    #[serde(default)]
    pub long_term: String,
    #[serde(default)]
    pub short_term: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemorableEvent {
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub details: String,
}

impl ProfileDoc {
    /// The empty template written on first open.
    pub fn template() -> serde_json::Value {
        serde_json::to_value(ProfileDoc::default()).expect("template must serialize")
    }

    /// Check that a JSON value still matches the profile shape.
    pub fn validate(value: &serde_json::Value) -> crate::error::Result<()> {
        serde_json::from_value::<ProfileDoc>(value.clone())
            .map(|_| ())
            .map_err(|e| crate::error::ProfileError::Validation(e.to_string()))
    }
}
