//! Library store: display metadata plus installed state per game.

use std::path::PathBuf;
use std::sync::Mutex;

use gamedock_protocol::GameInfo;
use serde::{Deserialize, Serialize};

use crate::{InstalledStore, RegistryError};
use crate::file;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LibraryFile {
    #[serde(default)]
    games: Vec<GameInfo>,
}

/// Durable list of known games for one runner.
///
/// The library owns every `GameInfo`; installed state is reconciled from
/// the [`InstalledStore`] so the two never drift apart.
#[derive(Debug)]
pub struct LibraryStore {
    path: PathBuf,
    inner: Mutex<Vec<GameInfo>>,
}

impl LibraryStore {
    pub fn load(path: PathBuf) -> Result<Self, RegistryError> {
        let contents: LibraryFile = file::read_or_default(&path)?;
        Ok(Self {
            path,
            inner: Mutex::new(contents.games),
        })
    }

    pub fn list(&self) -> Vec<GameInfo> {
        self.inner.lock().unwrap().clone()
    }

    pub fn get(&self, app_name: &str) -> Option<GameInfo> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .find(|game| game.app_name == app_name)
            .cloned()
    }

    /// Inserts or replaces a library entry and persists.
    pub fn upsert(&self, game: GameInfo) -> Result<(), RegistryError> {
        let mut games = self.inner.lock().unwrap();
        match games.iter_mut().find(|g| g.app_name == game.app_name) {
            Some(existing) => *existing = game,
            None => games.push(game),
        }
        self.persist(&games)
    }

    /// Re-derives `is_installed`/`install` for every entry from the
    /// installed store. Called after any workflow mutates installed state.
    pub fn refresh_installed(&self, installed: &InstalledStore) -> Result<(), RegistryError> {
        let mut games = self.inner.lock().unwrap();
        for game in games.iter_mut() {
            match installed.get(&game.app_name) {
                Some(info) => {
                    game.is_installed = true;
                    game.install = Some(info);
                }
                None => {
                    game.is_installed = false;
                    game.install = None;
                }
            }
        }
        self.persist(&games)
    }

    fn persist(&self, games: &[GameInfo]) -> Result<(), RegistryError> {
        file::write(
            &self.path,
            &LibraryFile {
                games: games.to_vec(),
            },
        )
    }
}
