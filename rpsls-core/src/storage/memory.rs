use crate::error::Result;
use crate::session::GameSession;
use crate::storage::{record, SessionStore};
use crate::types::{Address, GameId};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Keeps encoded records in memory; same versioning rules as on disk.
#[derive(Default)]
pub struct MemorySessionStore {
    records: RwLock<BTreeMap<(Address, GameId), String>>,
    current: RwLock<HashMap<Address, GameId>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw record `account` holds for `game`, as it would be written to disk.
    pub fn raw(&self, account: &Address, game: &GameId) -> Option<String> {
        self.records.read().get(&(*account, *game)).cloned()
    }

    /// Store `json` verbatim, bypassing encoding.
    pub fn put_raw(&self, account: Address, game: GameId, json: String) {
        self.records.write().insert((account, game), json);
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, account: &Address, session: &GameSession) -> Result<()> {
        let json = record::encode(session)?;
        self.records
            .write()
            .insert((*account, session.game_id), json);
        Ok(())
    }

    fn load(&self, account: &Address, game: &GameId) -> Result<Option<GameSession>> {
        match self.records.read().get(&(*account, *game)) {
            Some(json) => Ok(Some(record::decode(json)?)),
            None => Ok(None),
        }
    }

    fn list(&self, account: &Address) -> Result<Vec<GameSession>> {
        self.records
            .read()
            .iter()
            .filter(|((owner, _), _)| owner == account)
            .map(|(_, json)| record::decode(json))
            .collect()
    }

    fn set_current(&self, account: &Address, game: &GameId) -> Result<()> {
        self.current.write().insert(*account, *game);
        Ok(())
    }

    fn current(&self, account: &Address) -> Result<Option<GameId>> {
        Ok(self.current.read().get(account).copied())
    }
}
