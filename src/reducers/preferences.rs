use super::payload;
use crate::actions::{Action, ActionType};
use crate::environment::entities::Preference;
use crate::environment::storage::PreferencesState;

pub(super) fn reduce(state: &mut PreferencesState, action: &Action) {
    match action.kind {
        ActionType::ReceivedAllPreferences => {
            let Some(preferences) = payload::<Vec<Preference>>(action) else {
                return;
            };
            state.my_preferences = preferences.into_iter().map(|p| (p.key(), p)).collect();
        }
        ActionType::ReceivedPreferences => {
            let Some(preferences) = payload::<Vec<Preference>>(action) else {
                return;
            };
            for preference in preferences {
                state.my_preferences.insert(preference.key(), preference);
            }
        }
        ActionType::DeletedPreferences => {
            let Some(preferences) = payload::<Vec<Preference>>(action) else {
                return;
            };
            for preference in preferences {
                state.my_preferences.remove(&preference.key());
            }
        }
        _ => {}
    }
}
