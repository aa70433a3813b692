use super::payload;
use crate::actions::{Action, ActionType};
use crate::environment::entities::{Post, Reaction};
use crate::environment::storage::Entities;

pub(super) fn reduce(entities: &mut Entities, action: &Action) {
    let posts = &mut entities.posts;
    match action.kind {
        ActionType::ReceivedPost => {
            let Some(post) = payload::<Post>(action) else {
                return;
            };
            posts.posts.insert(post.id.clone(), post);
        }
        ActionType::PostDeleted => {
            let Some(post) = payload::<Post>(action) else {
                return;
            };
            let entry = posts.posts.entry(post.id.clone()).or_insert(post);
            entry.state_deleted = true;
        }
        ActionType::ReceivedReaction => {
            let Some(reaction) = payload::<Reaction>(action) else {
                return;
            };
            posts
                .reactions
                .entry(reaction.post_id.clone())
                .or_default()
                .insert(reaction.key(), reaction);
        }
        ActionType::ReactionDeleted => {
            let Some(reaction) = payload::<Reaction>(action) else {
                return;
            };
            if let Some(reactions) = posts.reactions.get_mut(&reaction.post_id) {
                reactions.remove(&reaction.key());
            }
        }
        ActionType::IncrementPinnedPostCount => {
            let Some(channel_id) = payload::<String>(action) else {
                return;
            };
            *entities
                .channels
                .pinned_post_counts
                .entry(channel_id)
                .or_default() += 1;
        }
        ActionType::DecrementPinnedPostCount => {
            let Some(channel_id) = payload::<String>(action) else {
                return;
            };
            let count = entities
                .channels
                .pinned_post_counts
                .entry(channel_id)
                .or_default();
            *count = count.saturating_sub(1);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reactions_are_added_and_removed() {
        let mut entities = Entities::default();
        reduce(
            &mut entities,
            &Action::with_data(
                ActionType::ReceivedReaction,
                &json!({"user_id": "u1", "post_id": "p1", "emoji_name": "+1", "create_at": 5}),
            ),
        );
        assert_eq!(entities.posts.reactions["p1"].len(), 1);

        reduce(
            &mut entities,
            &Action::with_data(
                ActionType::ReactionDeleted,
                &json!({"user_id": "u1", "post_id": "p1", "emoji_name": "+1"}),
            ),
        );
        assert!(entities.posts.reactions["p1"].is_empty());
    }

    #[test]
    fn pinned_count_never_goes_negative() {
        let mut entities = Entities::default();
        let decrement = Action::with_data(ActionType::DecrementPinnedPostCount, &"c1");
        reduce(&mut entities, &decrement);
        assert_eq!(entities.channels.pinned_post_counts["c1"], 0);

        reduce(
            &mut entities,
            &Action::with_data(ActionType::IncrementPinnedPostCount, &"c1"),
        );
        assert_eq!(entities.channels.pinned_post_counts["c1"], 1);
    }

    #[test]
    fn deleted_post_is_marked() {
        let mut entities = Entities::default();
        let post = Post {
            id: "p1".to_string(),
            message: "hello".to_string(),
            ..Default::default()
        };
        reduce(&mut entities, &Action::with_data(ActionType::ReceivedPost, &post));
        reduce(&mut entities, &Action::with_data(ActionType::PostDeleted, &post));
        assert!(entities.posts.posts["p1"].state_deleted);
        assert_eq!(entities.posts.posts["p1"].message, "hello");
    }
}
