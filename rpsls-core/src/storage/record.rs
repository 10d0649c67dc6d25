//! On-disk shape of a [`GameSession`].
//!
//! Records carry an explicit version. Anything that is not exactly the
//! current version, or is missing a field, is refused instead of being
//! loaded half-populated.

use crate::error::{GameError, Result};
use crate::session::GameSession;
use serde::{Deserialize, Serialize};

pub const SESSION_RECORD_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionRecord {
    version: u32,
    session: GameSession,
}

pub fn encode(session: &GameSession) -> Result<String> {
    let record = SessionRecord {
        version: SESSION_RECORD_VERSION,
        session: session.clone(),
    };
    Ok(serde_json::to_string(&record)?)
}

pub fn decode(json: &str) -> Result<GameSession> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let found = value
        .get("version")
        .and_then(|v| v.as_u64())
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
        .unwrap_or(0);

    if found != SESSION_RECORD_VERSION {
        return Err(GameError::UnsupportedRecordVersion {
            found,
            expected: SESSION_RECORD_VERSION,
        });
    }

    let record: SessionRecord = serde_json::from_value(value)?;
    Ok(record.session)
}
