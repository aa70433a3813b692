pub mod entities;
pub mod error;
pub mod model;
pub mod repository;
pub mod session;
pub mod storage;
pub mod store;
pub mod transport;
pub mod types;

pub use model::Model;
pub use repository::Repository;
pub use store::Store;

use self::storage::Data;
use crate::actions::Action;

/// Everything an action creator needs: the remote client and the store.
#[derive(Clone, Debug)]
pub struct Environment {
    pub model: Model,
    pub store: Store,
}

impl Environment {
    pub fn new(model: Model, store: Store) -> Self {
        Self { model, store }
    }

    pub fn dispatch(&self, action: Action) {
        self.store.dispatch(action);
    }

    pub fn batch(&self, actions: Vec<Action>) {
        self.store.batch(actions);
    }

    pub fn get_state(&self) -> Data {
        self.store.get_state()
    }

    pub fn current_user_id(&self) -> String {
        self.store.with(|s| s.current_user_id().to_string())
    }
}
