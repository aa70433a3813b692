use chrono::Utc;

use super::payload;
use crate::actions::{Action, ActionType};
use crate::environment::storage::LoggedError;

pub(super) fn reduce(state: &mut im::Vector<LoggedError>, action: &Action) {
    match action.kind {
        ActionType::LogError => {
            let Some(error) = action.error.clone() else {
                return;
            };
            state.push_back(LoggedError {
                error,
                displayable: action.displayable,
                date: Utc::now(),
            });
        }
        ActionType::DismissError => {
            let Some(index) = payload::<usize>(action) else {
                return;
            };
            if index < state.len() {
                state.remove(index);
            }
        }
        ActionType::ClearErrors => state.clear(),
        _ => {}
    }
}
