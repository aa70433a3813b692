use super::payload;
use crate::actions::{Action, ActionType};
use crate::environment::entities::UserProfile;
use crate::environment::storage::UsersState;

pub(super) fn reduce(state: &mut UsersState, action: &Action) {
    match action.kind {
        ActionType::ReceivedMe => {
            let Some(me) = payload::<UserProfile>(action) else {
                return;
            };
            state.current_user_id = me.id.clone();
            state.profiles.insert(me.id.clone(), me);
        }
        ActionType::ReceivedProfile => {
            let Some(profile) = payload::<UserProfile>(action) else {
                return;
            };
            state.profiles.insert(profile.id.clone(), profile);
        }
        _ => {}
    }
}
