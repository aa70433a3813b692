use chrono::Utc;

use super::action::{Action, ActionType};
use super::errors::{log_error, prepare_log_error};
use super::helpers::{bind_client_func, force_logout_if_necessary, ClientCall};
use super::preferences::{delete_preferences, save_preferences};
use super::{ActionResult, SuccessTarget};
use crate::environment::entities::{Post, PostPatch, Preference, Reaction, StatusOk, CATEGORY_FLAGGED_POST};
use crate::environment::error::ClientError;
use crate::environment::Environment;

pub async fn get_post(env: &Environment, post_id: &str) -> ActionResult<Post> {
    let post_id = post_id.to_string();
    let call = ClientCall::new(move |model| {
        let post_id = post_id.clone();
        async move { model.get_post(&post_id).await }
    })
    .on_success(SuccessTarget::data(ActionType::ReceivedPost))
    .on_success(SuccessTarget::marker(ActionType::GetPostsSuccess))
    .on_failure(ActionType::GetPostsFailure);
    bind_client_func(env, &call).await
}

pub async fn edit_post(env: &Environment, patch: PostPatch) -> ActionResult<Post> {
    let call = ClientCall::new(move |model| {
        let patch = patch.clone();
        async move { model.patch_post(&patch).await }
    })
    .on_request(ActionType::EditPostRequest)
    .on_success(SuccessTarget::data(ActionType::ReceivedPost))
    .on_success(SuccessTarget::marker(ActionType::EditPostSuccess))
    .on_failure(ActionType::EditPostFailure);
    bind_client_func(env, &call).await
}

pub async fn pin_post(env: &Environment, post_id: &str) -> ActionResult<StatusOk> {
    set_pinned(env, post_id, true).await
}

pub async fn unpin_post(env: &Environment, post_id: &str) -> ActionResult<StatusOk> {
    set_pinned(env, post_id, false).await
}

async fn set_pinned(env: &Environment, post_id: &str, pinned: bool) -> ActionResult<StatusOk> {
    env.dispatch(Action::new(ActionType::EditPostRequest));

    let result = if pinned {
        env.model.pin_post(post_id).await
    } else {
        env.model.unpin_post(post_id).await
    };
    let status = match result {
        Ok(status) => status,
        Err(error) => return Err(fail(env, ActionType::EditPostFailure, error)),
    };

    let mut actions = vec![Action::new(ActionType::EditPostSuccess)];
    // Only posts we already hold are updated locally
    if let Some(post) = env.store.with(|s| s.post(post_id).cloned()) {
        let counter = if pinned {
            ActionType::IncrementPinnedPostCount
        } else {
            ActionType::DecrementPinnedPostCount
        };
        actions.push(Action::with_data(
            ActionType::ReceivedPost,
            &Post {
                is_pinned: pinned,
                update_at: Utc::now().timestamp_millis(),
                ..post.clone()
            },
        ));
        actions.push(Action::with_data(counter, &post.channel_id));
    }
    env.batch(actions);
    Ok(status)
}

/// Marks the post deleted right away. The server call runs in the
/// background; a failure there is logged and not undone.
pub fn delete_post(env: &Environment, post: &Post) -> ActionResult<bool> {
    env.dispatch(Action::with_data(ActionType::PostDeleted, post));

    let model = env.model.clone();
    let post_id = post.id.clone();
    env.store.spawn(async move {
        if let Err(e) = model.delete_post(&post_id).await {
            log::error!("Failed to delete post {post_id}: {e}");
        }
    });
    Ok(true)
}

pub async fn add_reaction(env: &Environment, post_id: &str, emoji_name: &str) -> ActionResult<bool> {
    let user_id = env.current_user_id();
    match env.model.add_reaction(&user_id, post_id, emoji_name).await {
        Ok(reaction) => {
            env.dispatch(Action::with_data(ActionType::ReceivedReaction, &reaction));
            Ok(true)
        }
        Err(error) => Err(session_checked(env, error)),
    }
}

pub async fn remove_reaction(
    env: &Environment,
    post_id: &str,
    emoji_name: &str,
) -> ActionResult<bool> {
    let user_id = env.current_user_id();
    if let Err(error) = env.model.remove_reaction(&user_id, post_id, emoji_name).await {
        return Err(session_checked(env, error));
    }
    env.dispatch(Action::with_data(
        ActionType::ReactionDeleted,
        &Reaction {
            user_id,
            post_id: post_id.to_string(),
            emoji_name: emoji_name.to_string(),
            create_at: 0,
        },
    ));
    Ok(true)
}

pub fn flag_post(env: &Environment, post_id: &str) -> ActionResult<bool> {
    let user_id = env.current_user_id();
    let flag = Preference::new(user_id.clone(), CATEGORY_FLAGGED_POST, post_id, "true");
    save_preferences(env, &user_id, vec![flag])
}

pub fn unflag_post(env: &Environment, post_id: &str) -> ActionResult<bool> {
    let user_id = env.current_user_id();
    let flag = Preference::new(user_id.clone(), CATEGORY_FLAGGED_POST, post_id, "true");
    delete_preferences(env, &user_id, vec![flag])
}

fn fail(env: &Environment, kind: ActionType, error: ClientError) -> ClientError {
    force_logout_if_necessary(env, &error);
    let mut actions = vec![Action::with_error(kind, error.clone())];
    actions.extend(prepare_log_error(env, &error, false));
    env.batch(actions);
    error
}

fn session_checked(env: &Environment, error: ClientError) -> ClientError {
    force_logout_if_necessary(env, &error);
    if let Err(e) = log_error(env, &error, false) {
        log::error!("Could not log {error:?}: {e:?}");
    }
    error
}
