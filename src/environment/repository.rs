use std::cmp::Reverse;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use itertools::Itertools;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{from_slice, to_string_pretty};

use super::types::SavedUser;

const USERS_PATH: &str = "users.json";

/// Signed in accounts, kept as json in the data directory
#[derive(Clone, Debug)]
pub struct Repository {
    directory: PathBuf,
    users: Arc<Mutex<Vec<SavedUser>>>,
}

impl Repository {
    pub fn new(directory: PathBuf) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&directory)
            .with_context(|| format!("Could not create {}", directory.display()))?;
        let users: Vec<SavedUser> = match read(&directory, USERS_PATH) {
            Ok(users) => users.unwrap_or_default(),
            Err(e) => {
                log::error!("Ignoring unreadable users: {e:?}");
                Vec::new()
            }
        };

        // Try to write the users. Otherwise fail early
        write(&directory, USERS_PATH, &users)?;

        Ok(Self {
            directory,
            users: Arc::new(Mutex::new(users)),
        })
    }

    /// The per-user config directory, e.g. `~/.config/huddle`
    pub fn default_location() -> anyhow::Result<Self> {
        use directories_next::ProjectDirs;
        let dirs = ProjectDirs::from("com", "huddle", "huddle")
            .context("Couldn't find a folder to save data")?;
        Self::new(dirs.config_dir().to_path_buf())
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn update_or_insert_user(&self, new_user: SavedUser) -> anyhow::Result<()> {
        let mut users = self.lock_users();
        match users.iter_mut().find(|user| user.id == new_user.id) {
            Some(user) => *user = new_user,
            None => users.push(new_user),
        }
        write(&self.directory, USERS_PATH, users.deref())
    }

    pub fn remove_user(&self, id: &str) -> anyhow::Result<()> {
        let mut users = self.lock_users();
        let Some(index) = users.iter().position(|user| user.id == id) else {
            anyhow::bail!("Unknown User {id}")
        };
        users.remove(index);
        write(&self.directory, USERS_PATH, users.deref())
    }

    /// Saved users, most recent login first
    pub fn users(&self) -> Vec<SavedUser> {
        self.lock_users()
            .iter()
            .sorted_by_key(|user| Reverse(user.last_login))
            .cloned()
            .collect()
    }

    fn lock_users(&self) -> MutexGuard<'_, Vec<SavedUser>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read<T: DeserializeOwned>(directory: &Path, name: &str) -> anyhow::Result<Option<T>> {
    let data_path = directory.join(name);
    if !data_path.exists() {
        return Ok(None);
    };
    let data = std::fs::read(&data_path)
        .with_context(|| format!("Could not read {}", data_path.display()))?;
    let obj: T =
        from_slice(&data).with_context(|| format!("Could not parse {}", data_path.display()))?;
    Ok(Some(obj))
}

fn write<T: Serialize>(directory: &Path, name: &str, value: &T) -> anyhow::Result<()> {
    let data_path = directory.join(name);
    let data = to_string_pretty(&value).context("Could not encode value")?;
    std::fs::write(&data_path, data)
        .with_context(|| format!("Could not write to {}", data_path.display()))?;
    Ok(())
}
