use crate::commitment::{compute_commitment, generate_salt, verify_commitment};
use crate::config::ClientConfig;
use crate::error::{GameError, Result};
use crate::ledger::{ContractState, Ledger, LedgerError};
use crate::moves::Move;
use crate::outcome::Resolution;
use crate::session::{
    reconcile, GameSession, GameStatus, Phase, Role, SessionRegistry, TimeoutClaim,
};
use crate::storage::SessionStore;
use crate::timeout::{has_timed_out_at, Clock, SystemClock};
use crate::types::{Address, GameId, Wei};
use std::sync::Arc;

/// Result of reconciling a game with the ledger.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Updated(GameSession),
    /// A transition ran during the read; its result stands.
    Skipped,
}

/// Drives games for one account against a ledger and a session store.
///
/// Every transition validates locally first, then submits once, and only
/// persists the new phase after the ledger confirmed it.
pub struct GameClient<L, S> {
    config: ClientConfig,
    ledger: L,
    store: S,
    clock: Arc<dyn Clock>,
    registry: SessionRegistry,
}

impl<L: Ledger, S: SessionStore> GameClient<L, S> {
    pub fn new(config: ClientConfig, ledger: L, store: S) -> Result<Self> {
        Self::with_clock(config, ledger, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: ClientConfig,
        ledger: L,
        store: S,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let registry = SessionRegistry::new();
        if let Some(current) = store.current(&config.account)? {
            registry.set_current(current);
        }

        Ok(Self {
            config,
            ledger,
            store,
            clock,
            registry,
        })
    }

    pub fn account(&self) -> Address {
        self.config.account
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Local record for `game`, if this client has one.
    ///
    /// Only Player 1's own record can carry the secret; any other record
    /// comes back without it.
    pub fn session(&self, game: &GameId) -> Result<Option<GameSession>> {
        if let Some(session) = self.registry.get(game) {
            return Ok(Some(session));
        }

        let loaded = self
            .store
            .load(&self.account(), game)?
            .map(|session| self.scoped(session));
        if let Some(session) = &loaded {
            self.registry.insert(session.clone());
        }
        Ok(loaded)
    }

    pub fn current(&self) -> Result<Option<GameSession>> {
        match self.registry.current() {
            Some(game) => self.session(&game),
            None => Ok(None),
        }
    }

    pub fn sessions(&self) -> Result<Vec<GameSession>> {
        Ok(self
            .store
            .list(&self.account())?
            .into_iter()
            .map(|session| self.scoped(session))
            .collect())
    }

    /// Game as the ledger shows it, with no secret and nothing written.
    pub async fn observe(&self, game: &GameId) -> Result<GameSession> {
        let state = self.ledger.read_state(game).await?;
        Ok(GameSession::observed(*game, &state))
    }

    /// Commit to `mv` and open a game against `opponent`.
    ///
    /// The new game becomes the current one; a previous current game is
    /// superseded but stays reachable by its id.
    pub async fn create(&self, mv: Move, opponent: Address, stake: Wei) -> Result<GameSession> {
        let mv = mv.require_playable()?;
        let account = self.account();

        if opponent == account {
            return Err(GameError::SelfPlay(opponent));
        }
        if opponent == Address::ZERO {
            return Err(GameError::InvalidAddress(
                "opponent cannot be the zero address".to_string(),
            ));
        }
        if stake.is_zero() {
            return Err(GameError::ZeroStake);
        }
        if stake.checked_mul(2).is_none() {
            return Err(GameError::InvalidAmount(format!(
                "{} cannot be doubled into a pot",
                stake
            )));
        }

        let salt = generate_salt();
        let commitment = compute_commitment(mv, &salt)?;

        let game = self
            .ledger
            .submit_commitment(commitment, opponent, stake)
            .await
            .map_err(|e| ledger_failure(None, "create", e))?;

        let session = GameSession::committed(
            game,
            account,
            opponent,
            stake,
            mv,
            salt,
            self.clock.now(),
        );

        if let Err(e) = self.store.save(&account, &session) {
            tracing::error!(
                "Game {} is on the ledger but its secret could not be saved: {}",
                game,
                e
            );
            return Err(e);
        }
        self.store.set_current(&account, &game)?;
        self.registry.insert(session.clone());

        if let Some(previous) = self.registry.set_current(game) {
            if previous != game {
                tracing::info!("Game {} superseded as current game by {}", previous, game);
            }
        }

        tracing::info!(
            "Created game {} against {} with stake {}",
            game,
            opponent,
            stake
        );
        Ok(session)
    }

    /// Player 2's move, with a stake equal to Player 1's.
    pub async fn play(&self, game: &GameId, mv: Move, stake: Wei) -> Result<GameSession> {
        let mv = mv.require_playable()?;
        let _guard = self.registry.begin(game)?;

        let state = self.ledger.read_state(game).await?;
        self.require_role(game, &state, Role::Player2)?;
        require_phase(game, &state, Phase::Created)?;

        if stake != state.stake {
            return Err(GameError::StakeMismatch {
                expected: state.stake,
                offered: stake,
            });
        }

        let receipt = self
            .ledger
            .submit_play(game, mv, stake)
            .await
            .map_err(|e| ledger_failure(Some(game), "play", e))?;

        let mut session = self.local_or_observed(game, &state)?;
        session.player2_move = mv;
        session.phase = Phase::Player2Moved;
        session.last_action = self.clock.now();
        let session = self.persist(session)?;

        tracing::info!("Played {} in game {} (tx {})", mv, game, receipt.tx_hash);
        Ok(session)
    }

    /// Player 1 discloses the committed move and salt; the ledger pays out.
    pub async fn reveal(&self, game: &GameId) -> Result<GameSession> {
        let _guard = self.registry.begin(game)?;

        let state = self.ledger.read_state(game).await?;
        self.require_role(game, &state, Role::Player1)?;
        require_phase(game, &state, Phase::Player2Moved)?;

        let mut session = self
            .session(game)?
            .ok_or(GameError::MissingSecret(*game))?;
        let (mv, salt) = session
            .secret()
            .map(|(mv, salt)| (mv, salt.clone()))
            .ok_or(GameError::MissingSecret(*game))?;

        if !verify_commitment(&state.commitment, mv, &salt) {
            tracing::warn!(
                "Local secret for game {} does not reproduce the ledger commitment",
                game
            );
            return Err(GameError::CommitmentMismatch(*game));
        }

        let receipt = self
            .ledger
            .submit_reveal(game, mv, &salt)
            .await
            .map_err(|e| ledger_failure(Some(game), "reveal", e))?;

        let resolution = Resolution::new(mv, state.player2_move, state.stake)?;
        session.apply_ledger(&state);
        session.phase = Phase::Resolved;
        session.resolution = Some(resolution);
        session.last_action = self.clock.now();
        let session = self.persist(session)?;

        tracing::info!(
            "Revealed game {}: winner {} (tx {})",
            game,
            resolution.winner,
            receipt.tx_hash
        );
        Ok(session)
    }

    /// Forfeit a stalled counterparty once the ledger's deadline has passed.
    pub async fn claim_timeout(&self, game: &GameId, claim: TimeoutClaim) -> Result<GameSession> {
        let _guard = self.registry.begin(game)?;

        let state = self.ledger.read_state(game).await?;
        self.require_role(game, &state, claim.claimant())?;
        require_phase(game, &state, claim.from_phase())?;

        let now = self.clock.now();
        if !has_timed_out_at(now, state.last_action, state.timeout) {
            let claimable_at = state
                .last_action
                .saturating_add(state.timeout)
                .saturating_add(1);
            let remaining_secs = claimable_at.saturating_sub(now);
            tracing::warn!(
                "Timeout claim on game {} is {}s early",
                game,
                remaining_secs
            );
            return Err(GameError::TimeoutNotElapsed { remaining_secs });
        }

        let submitted = match claim {
            TimeoutClaim::Player2Inactive => self.ledger.submit_player2_timeout_claim(game).await,
            TimeoutClaim::Player1Inactive => self.ledger.submit_player1_timeout_claim(game).await,
        };
        let receipt = submitted.map_err(|e| ledger_failure(Some(game), "claim timeout", e))?;

        let mut session = self.local_or_observed(game, &state)?;
        session.phase = claim.terminal_phase();
        let session = self.persist(session)?;

        tracing::info!(
            "Claimed timeout on game {}: {} (tx {})",
            game,
            session.phase,
            receipt.tx_hash
        );
        Ok(session)
    }

    /// The current claim for the local account, if it has one.
    pub async fn claim_available_timeout(&self, game: &GameId) -> Result<GameSession> {
        let state = self.ledger.read_state(game).await?;
        let role = role_in(&self.account(), &state);
        let phase = reconcile(Phase::Created, &state);
        let claim = TimeoutClaim::available_to(role, phase).ok_or_else(|| {
            GameError::invalid_phase(format!(
                "no timeout claim for {} while game {} is {}",
                role, game, phase
            ))
        })?;
        self.claim_timeout(game, claim).await
    }

    /// Reconcile the local record of `game` with the ledger and persist it.
    ///
    /// Works for games this client never saw: the result is a record built
    /// from ledger state alone.
    pub async fn refresh(&self, game: &GameId) -> Result<RefreshOutcome> {
        let seen = self.registry.revision(game);
        if self.registry.is_in_flight(game) {
            tracing::debug!("Skipping refresh of game {}: transition in flight", game);
            return Ok(RefreshOutcome::Skipped);
        }

        let state = self.ledger.read_state(game).await?;
        self.apply_refresh(game, &state, seen)
    }

    pub async fn status(&self, game: &GameId) -> Result<GameStatus> {
        let seen = self.registry.revision(game);
        let state = self.ledger.read_state(game).await?;

        let session = match self.apply_refresh(game, &state, seen)? {
            RefreshOutcome::Updated(session) => session,
            RefreshOutcome::Skipped => self.local_or_observed(game, &state)?,
        };

        Ok(GameStatus::new(
            session,
            state,
            &self.account(),
            self.clock.now(),
        ))
    }

    fn apply_refresh(
        &self,
        game: &GameId,
        state: &ContractState,
        seen_revision: u64,
    ) -> Result<RefreshOutcome> {
        let session = self.local_or_observed(game, state)?;
        let applied = self
            .registry
            .commit_refresh(&session, seen_revision, |s| {
                self.store.save(&self.account(), s)
            })?;

        if applied {
            tracing::debug!("Refreshed game {}: {}", game, session.phase);
            Ok(RefreshOutcome::Updated(session))
        } else {
            tracing::debug!("Discarded stale refresh of game {}", game);
            Ok(RefreshOutcome::Skipped)
        }
    }

    fn local_or_observed(&self, game: &GameId, state: &ContractState) -> Result<GameSession> {
        match self.session(game)? {
            Some(mut session) => {
                session.apply_ledger(state);
                Ok(session)
            }
            None => Ok(GameSession::observed(*game, state)),
        }
    }

    fn persist(&self, session: GameSession) -> Result<GameSession> {
        self.store.save(&self.account(), &session)?;
        self.registry.insert(session.clone());
        Ok(session)
    }

    fn scoped(&self, mut session: GameSession) -> GameSession {
        let foreign = session.player1 != self.account();
        if foreign && (session.player1_move.is_some() || session.salt.is_some()) {
            tracing::warn!(
                "Dropping secret from record of game {}: {} is not player 1",
                session.game_id,
                self.account()
            );
            session.player1_move = None;
            session.salt = None;
        }
        session
    }

    fn require_role(&self, game: &GameId, state: &ContractState, role: Role) -> Result<()> {
        let account = self.account();
        if role_in(&account, state) == role {
            return Ok(());
        }

        let role = match role {
            Role::Player1 => "player 1",
            Role::Player2 => "player 2",
            Role::Spectator => "a spectator",
        };
        Err(GameError::WrongRole {
            account,
            role,
            game: *game,
        })
    }
}

fn role_in(account: &Address, state: &ContractState) -> Role {
    if *account == state.player1 {
        Role::Player1
    } else if *account == state.player2 {
        Role::Player2
    } else {
        Role::Spectator
    }
}

fn require_phase(game: &GameId, state: &ContractState, expected: Phase) -> Result<()> {
    let actual = reconcile(Phase::Created, state);
    if actual != expected {
        return Err(GameError::invalid_phase(format!(
            "game {} is {}, expected {}",
            game, actual, expected
        )));
    }
    Ok(())
}

fn ledger_failure(game: Option<&GameId>, action: &str, err: LedgerError) -> GameError {
    match game {
        Some(game) => tracing::warn!("Ledger refused {} on game {}: {}", action, game, err),
        None => tracing::warn!("Ledger refused {}: {}", action, err),
    }
    err.into()
}
