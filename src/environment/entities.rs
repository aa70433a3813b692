use serde::{Deserialize, Serialize};

// Wire entities, field names as the server sends them

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub roles: String,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub create_at: i64,
    #[serde(default)]
    pub update_at: i64,
    #[serde(default)]
    pub delete_at: i64,
}

impl UserProfile {
    pub fn role_list(&self) -> Vec<&str> {
        self.roles.split(' ').filter(|r| !r.is_empty()).collect()
    }
}

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub root_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub create_at: i64,
    #[serde(default)]
    pub update_at: i64,
    #[serde(default)]
    pub edit_at: i64,
    #[serde(default)]
    pub delete_at: i64,
    /// Set locally when a delete was issued for this post
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub state_deleted: bool,
}

/// Partial update for a post; only `Some` fields are sent
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPatch {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Preference {
    pub user_id: String,
    pub category: String,
    pub name: String,
    pub value: String,
}

impl Preference {
    pub fn new(
        user_id: impl Into<String>,
        category: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            category: category.into(),
            name: name.into(),
            value: value.into(),
        }
    }

    /// Key used to store the preference in the normalized state
    pub fn key(&self) -> String {
        preference_key(&self.category, &self.name)
    }
}

pub fn preference_key(category: &str, name: &str) -> String {
    format!("{category}--{name}")
}

pub const CATEGORY_FLAGGED_POST: &str = "flagged_post";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub user_id: String,
    pub post_id: String,
    pub emoji_name: String,
    #[serde(default)]
    pub create_at: i64,
}

impl Reaction {
    pub fn key(&self) -> String {
        format!("{}-{}", self.user_id, self.emoji_name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOk {
    pub status: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MfaRequired {
    pub mfa_required: bool,
}

/// Body of a non-2xx response
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct ServerErrorBody {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status_code: Option<u16>,
}
