use serde::Serialize;
use strum_macros::{Display, EnumIter, IntoStaticStr};

use crate::environment::error::ClientError;

/// Every mutation the store knows how to apply.
#[derive(IntoStaticStr, EnumIter, Display, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    // Users
    CheckMfaRequest,
    CheckMfaSuccess,
    CheckMfaFailure,
    LoginRequest,
    LoginSuccess,
    LoginFailure,
    LogoutRequest,
    LogoutSuccess,
    ReceivedMe,
    ReceivedProfile,
    ProfileRequest,
    ProfileSuccess,
    ProfileFailure,

    // Posts
    GetPostsSuccess,
    GetPostsFailure,
    ReceivedPost,
    PostDeleted,
    EditPostRequest,
    EditPostSuccess,
    EditPostFailure,
    ReceivedReaction,
    ReactionDeleted,
    IncrementPinnedPostCount,
    DecrementPinnedPostCount,

    // Preferences
    MyPreferencesRequest,
    MyPreferencesSuccess,
    MyPreferencesFailure,
    ReceivedAllPreferences,
    ReceivedPreferences,
    DeletedPreferences,

    // Errors
    LogError,
    DismissError,
    ClearErrors,
}

impl ActionType {
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// A mutation description: what happened, plus the payload the reducers need.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub kind: ActionType,
    pub data: Option<serde_json::Value>,
    pub error: Option<ClientError>,
    /// Only meaningful for `LogError`: should the UI surface it
    pub displayable: bool,
}

impl Action {
    /// An action without payload, e.g. a request status marker
    pub fn new(kind: ActionType) -> Self {
        Self {
            kind,
            data: None,
            error: None,
            displayable: false,
        }
    }

    /// An action carrying `data`. A value that cannot be represented as
    /// JSON leaves the action without payload and is logged.
    pub fn with_data(kind: ActionType, data: &impl Serialize) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("Could not encode payload for {kind}: {e:?}");
                None
            }
        };
        Self {
            data,
            ..Self::new(kind)
        }
    }

    pub fn with_error(kind: ActionType, error: ClientError) -> Self {
        Self {
            error: Some(error),
            ..Self::new(kind)
        }
    }

    pub fn displayable(mut self, displayable: bool) -> Self {
        self.displayable = displayable;
        self
    }
}

/// One success dispatch of a bound client call. Whether it carries the
/// returned value is decided here, where the call is described.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SuccessTarget {
    pub kind: ActionType,
    pub carries_data: bool,
}

impl SuccessTarget {
    /// Dispatch with the value the remote call returned
    pub fn data(kind: ActionType) -> Self {
        Self {
            kind,
            carries_data: true,
        }
    }

    /// Dispatch as a bare "request succeeded" marker
    pub fn marker(kind: ActionType) -> Self {
        Self {
            kind,
            carries_data: false,
        }
    }
}
