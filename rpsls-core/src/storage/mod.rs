pub mod memory;
pub mod record;
pub mod session_store;

pub use memory::MemorySessionStore;
pub use session_store::SqliteSessionStore;

use crate::error::Result;
use crate::session::GameSession;
use crate::types::{Address, GameId};

/// Durable home of game sessions, including Player 1's secret.
///
/// Records are scoped to the account that wrote them: several accounts may
/// share one store without ever reading each other's records. The client
/// never writes the secret anywhere except through this trait.
pub trait SessionStore: Send + Sync {
    fn save(&self, account: &Address, session: &GameSession) -> Result<()>;

    fn load(&self, account: &Address, game: &GameId) -> Result<Option<GameSession>>;

    fn list(&self, account: &Address) -> Result<Vec<GameSession>>;

    fn set_current(&self, account: &Address, game: &GameId) -> Result<()>;

    fn current(&self, account: &Address) -> Result<Option<GameId>>;
}
