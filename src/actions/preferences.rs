use super::action::{Action, ActionType};
use super::helpers::{bind_client_func, ClientCall};
use super::offline::{run_offline, OfflineAction};
use super::{ActionResult, SuccessTarget};
use crate::environment::entities::Preference;
use crate::environment::Environment;

pub async fn get_my_preferences(env: &Environment) -> ActionResult<Vec<Preference>> {
    let call = ClientCall::new(|model| async move { model.get_my_preferences().await })
        .on_request(ActionType::MyPreferencesRequest)
        .on_success(SuccessTarget::data(ActionType::ReceivedAllPreferences))
        .on_success(SuccessTarget::marker(ActionType::MyPreferencesSuccess))
        .on_failure(ActionType::MyPreferencesFailure);
    bind_client_func(env, &call).await
}

/// Store `preferences` locally at once and save them in the background.
/// They are removed again if the server refuses.
pub fn save_preferences(
    env: &Environment,
    user_id: &str,
    preferences: Vec<Preference>,
) -> ActionResult<bool> {
    let model = env.model.clone();
    let user_id = user_id.to_string();
    let sent = preferences.clone();
    let entry = OfflineAction::new(
        Action::with_data(ActionType::ReceivedPreferences, &preferences),
        async move { model.save_preferences(&user_id, &sent).await },
        Action::with_data(ActionType::DeletedPreferences, &preferences),
    )
    .keys(version_keys(&preferences));
    run_offline(env, entry);
    Ok(true)
}

/// Remove `preferences` locally at once and delete them in the
/// background. The values held before are restored if the server refuses.
pub fn delete_preferences(
    env: &Environment,
    user_id: &str,
    preferences: Vec<Preference>,
) -> ActionResult<bool> {
    let previous: Vec<Preference> = env.store.with(|s| {
        preferences
            .iter()
            .filter_map(|p| s.entities.preferences.my_preferences.get(&p.key()).cloned())
            .collect()
    });

    let model = env.model.clone();
    let user_id = user_id.to_string();
    let sent = preferences.clone();
    let entry = OfflineAction::new(
        Action::with_data(ActionType::DeletedPreferences, &preferences),
        async move { model.delete_preferences(&user_id, &sent).await },
        Action::with_data(ActionType::ReceivedPreferences, &previous),
    )
    .keys(version_keys(&preferences));
    run_offline(env, entry);
    Ok(true)
}

fn version_keys(preferences: &[Preference]) -> Vec<String> {
    preferences
        .iter()
        .map(|p| format!("preference:{}", p.key()))
        .collect()
}
