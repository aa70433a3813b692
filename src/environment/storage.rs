use chrono::{DateTime, Utc};

use super::entities::{Post, Preference, Reaction, UserProfile};
use super::error::ClientError;

type UserId = String;
type PostId = String;
type ChannelId = String;

/// Normalized client state. Every collection is an `im` structure so a
/// snapshot of the whole tree is a cheap clone.
#[derive(Clone, Default, PartialEq)]
pub struct Data {
    pub entities: Entities,
    pub requests: Requests,
    pub errors: im::Vector<LoggedError>,
}

impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("current_user_id", &self.entities.users.current_user_id)
            .field("profiles", &self.entities.users.profiles.len())
            .field("posts", &self.entities.posts.posts.len())
            .field("preferences", &self.entities.preferences.my_preferences.len())
            .field("errors", &self.errors.len())
            .finish()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entities {
    pub users: UsersState,
    pub posts: PostsState,
    pub channels: ChannelsState,
    pub preferences: PreferencesState,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UsersState {
    pub current_user_id: UserId,
    pub profiles: im::HashMap<UserId, UserProfile>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostsState {
    pub posts: im::HashMap<PostId, Post>,
    /// post id -> reaction key (`user-emoji`) -> reaction
    pub reactions: im::HashMap<PostId, im::HashMap<String, Reaction>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelsState {
    pub pinned_post_counts: im::HashMap<ChannelId, u64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreferencesState {
    /// `category--name` -> preference
    pub my_preferences: im::HashMap<String, Preference>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RequestStatus {
    #[default]
    NotStarted,
    Started,
    Success,
    Failure,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestState {
    pub status: RequestStatus,
    pub error: Option<ClientError>,
}

impl RequestState {
    pub fn is_started(&self) -> bool {
        self.status == RequestStatus::Started
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Requests {
    pub check_mfa: RequestState,
    pub login: RequestState,
    pub logout: RequestState,
    pub get_profile: RequestState,
    pub get_post: RequestState,
    pub edit_post: RequestState,
    pub my_preferences: RequestState,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggedError {
    pub error: ClientError,
    pub displayable: bool,
    pub date: DateTime<Utc>,
}

// Data Operations

impl Data {
    pub fn current_user_id(&self) -> &str {
        &self.entities.users.current_user_id
    }

    pub fn current_user(&self) -> Option<&UserProfile> {
        self.entities
            .users
            .profiles
            .get(&self.entities.users.current_user_id)
    }

    pub fn post(&self, id: &str) -> Option<&Post> {
        self.entities.posts.posts.get(id)
    }

    pub fn preference(&self, category: &str, name: &str) -> Option<&Preference> {
        self.entities
            .preferences
            .my_preferences
            .get(&super::entities::preference_key(category, name))
    }

    pub fn is_flagged(&self, post_id: &str) -> bool {
        self.preference(super::entities::CATEGORY_FLAGGED_POST, post_id)
            .map(|p| p.value == "true")
            .unwrap_or_default()
    }

    pub fn reactions_for_post(&self, post_id: &str) -> Vec<&Reaction> {
        self.entities
            .posts
            .reactions
            .get(post_id)
            .map(|r| r.values().collect())
            .unwrap_or_default()
    }

    pub fn pinned_post_count(&self, channel_id: &str) -> u64 {
        self.entities
            .channels
            .pinned_post_counts
            .get(channel_id)
            .copied()
            .unwrap_or_default()
    }
}
