use crate::error::{GameError, Result};
use crate::session::GameSession;
use crate::types::GameId;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
struct Inner {
    sessions: HashMap<GameId, GameSession>,
    // bumped whenever a transition starts or ends
    revisions: HashMap<GameId, u64>,
    in_flight: HashSet<GameId>,
    current: Option<GameId>,
}

impl Inner {
    fn bump(&mut self, game: &GameId) {
        *self.revisions.entry(*game).or_insert(0) += 1;
    }
}

/// In-memory sessions keyed by game, plus the "current game" pointer.
///
/// Also serializes transitions: at most one may be in flight per game.
#[derive(Default)]
pub struct SessionRegistry {
    inner: Mutex<Inner>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, game: &GameId) -> Option<GameSession> {
        self.inner.lock().sessions.get(game).cloned()
    }

    pub fn insert(&self, session: GameSession) {
        let mut inner = self.inner.lock();
        inner.sessions.insert(session.game_id, session);
    }

    pub fn current(&self) -> Option<GameId> {
        self.inner.lock().current
    }

    /// Point "current" at `game`, returning the game it replaces.
    pub fn set_current(&self, game: GameId) -> Option<GameId> {
        self.inner.lock().current.replace(game)
    }

    pub fn revision(&self, game: &GameId) -> u64 {
        self.inner.lock().revisions.get(game).copied().unwrap_or(0)
    }

    pub fn is_in_flight(&self, game: &GameId) -> bool {
        self.inner.lock().in_flight.contains(game)
    }

    /// Mark a transition as started. Fails if one is already running for
    /// `game`; the returned guard ends it when dropped.
    pub fn begin(&self, game: &GameId) -> Result<TransitionGuard<'_>> {
        let mut inner = self.inner.lock();
        if !inner.in_flight.insert(*game) {
            return Err(GameError::TransitionInFlight(*game));
        }
        inner.bump(game);
        Ok(TransitionGuard {
            registry: self,
            game: *game,
        })
    }

    /// Store a refresh result read while the registry was at `seen_revision`.
    ///
    /// `persist` runs under the registry lock so a transition cannot slip in
    /// between the check and the write. Returns false, writing nothing, when
    /// a transition started or finished since the read began.
    pub fn commit_refresh<F>(
        &self,
        session: &GameSession,
        seen_revision: u64,
        persist: F,
    ) -> Result<bool>
    where
        F: FnOnce(&GameSession) -> Result<()>,
    {
        let mut inner = self.inner.lock();
        let game = session.game_id;
        let revision = inner.revisions.get(&game).copied().unwrap_or(0);
        if inner.in_flight.contains(&game) || revision != seen_revision {
            return Ok(false);
        }

        persist(session)?;
        inner.sessions.insert(game, session.clone());
        Ok(true)
    }

    fn finish(&self, game: &GameId) {
        let mut inner = self.inner.lock();
        inner.in_flight.remove(game);
        inner.bump(game);
    }
}

/// Held for the duration of one transition.
pub struct TransitionGuard<'a> {
    registry: &'a SessionRegistry,
    game: GameId,
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        self.registry.finish(&self.game);
    }
}
