use std::future::Future;

use futures_util::future::{BoxFuture, FutureExt};

use super::action::{Action, ActionType};
use super::errors::prepare_log_error;
use super::helpers::force_logout_if_necessary;
use crate::environment::error::ClientError;
use crate::environment::Environment;

/// An optimistic mutation: `local` is applied right away, `effect` runs
/// in the background and `rollback` undoes `local` if the effect fails.
pub struct OfflineAction {
    local: Action,
    effect: BoxFuture<'static, Result<(), ClientError>>,
    commit: Option<ActionType>,
    rollback: Action,
    keys: Vec<String>,
}

impl std::fmt::Debug for OfflineAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineAction")
            .field("local", &self.local.kind)
            .field("commit", &self.commit)
            .field("rollback", &self.rollback.kind)
            .field("keys", &self.keys)
            .finish()
    }
}

impl OfflineAction {
    pub fn new<T, Fut>(local: Action, effect: Fut, rollback: Action) -> Self
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        Self {
            local,
            effect: effect.map(|result| result.map(|_| ())).boxed(),
            commit: None,
            rollback,
            keys: Vec::new(),
        }
    }

    /// Dispatched, without payload, once the effect succeeded
    pub fn commit(mut self, kind: ActionType) -> Self {
        self.commit = Some(kind);
        self
    }

    /// The state entries this mutation touches. A later mutation on any
    /// of them makes this one's rollback stale.
    pub fn keys(mut self, keys: impl IntoIterator<Item = String>) -> Self {
        self.keys.extend(keys);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OfflineOutcome {
    Committed,
    RolledBack(ClientError),
    /// The effect failed but a newer mutation owns the keys; nothing was undone
    Superseded(ClientError),
    /// The effect was refused with an expired session. The state was reset
    /// by the logout, so nothing was undone.
    SignedOut(ClientError),
}

/// Resolves once the background effect of an [`OfflineAction`] has been
/// handled.
#[derive(Debug)]
pub struct OfflineHandle {
    receiver: flume::Receiver<OfflineOutcome>,
}

impl OfflineHandle {
    /// `None` if the task died before reporting
    pub async fn settled(self) -> Option<OfflineOutcome> {
        self.receiver.recv_async().await.ok()
    }
}

pub fn run_offline(env: &Environment, entry: OfflineAction) -> OfflineHandle {
    let OfflineAction {
        local,
        effect,
        commit,
        rollback,
        keys,
    } = entry;

    let claimed = env.store.claim_versions(&keys);
    env.dispatch(local);

    let (sender, receiver) = flume::bounded(1);
    let store = env.store.clone();
    let env = env.clone();
    store.spawn(async move {
        let outcome = match effect.await {
            Ok(()) => {
                if let Some(kind) = commit {
                    env.dispatch(Action::new(kind));
                }
                OfflineOutcome::Committed
            }
            Err(error) => {
                let signed_out = force_logout_if_necessary(&env, &error);
                let mut actions: Vec<Action> =
                    prepare_log_error(&env, &error, false).into_iter().collect();
                let outcome = if signed_out {
                    log::debug!("Dropping {} after logout", rollback.kind);
                    OfflineOutcome::SignedOut(error)
                } else if env.store.is_latest(&claimed) {
                    actions.push(rollback);
                    OfflineOutcome::RolledBack(error)
                } else {
                    log::warn!(
                        "Skipping stale {} for {:?}: {error}",
                        rollback.kind,
                        keys
                    );
                    OfflineOutcome::Superseded(error)
                };
                env.batch(actions);
                outcome
            }
        };
        env.store.release_versions(&claimed);
        if sender.send(outcome).is_err() {
            log::trace!("Offline outcome not awaited");
        }
    });

    OfflineHandle { receiver }
}
