//! Pure state updates. Every applied `Action` flows through [`reduce`];
//! no I/O happens here.

mod errors;
mod posts;
mod preferences;
mod requests;
mod users;

use serde::de::DeserializeOwned;

use crate::actions::{Action, ActionType};
use crate::environment::storage::{Data, Entities, RequestState, RequestStatus, Requests};

pub fn reduce(state: &mut Data, action: &Action) {
    log::trace!("reduce {}", action.kind);
    if action.kind == ActionType::LogoutSuccess {
        state.entities = Entities::default();
        state.requests = Requests {
            logout: RequestState {
                status: RequestStatus::Success,
                error: None,
            },
            ..Requests::default()
        };
        return;
    }

    requests::reduce(&mut state.requests, action);
    users::reduce(&mut state.entities.users, action);
    posts::reduce(&mut state.entities, action);
    preferences::reduce(&mut state.entities.preferences, action);
    errors::reduce(&mut state.errors, action);
}

/// Decode the payload of `action`, logging when it has the wrong shape
fn payload<T: DeserializeOwned>(action: &Action) -> Option<T> {
    let Some(data) = action.data.clone() else {
        log::error!("{} dispatched without payload", action.kind);
        return None;
    };
    match serde_json::from_value(data) {
        Ok(value) => Some(value),
        Err(e) => {
            log::error!("Malformed payload for {}: {e:?}", action.kind);
            None
        }
    }
}
