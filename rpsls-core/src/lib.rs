//! Commit-reveal Rock-Paper-Scissors-Lizard-Spock client
//!
//! Player 1 commits to a hashed move, Player 2 answers in the clear with a
//! matching stake, then Player 1 reveals and the contract pays the winner.
//! Either side can take the pot if the other stalls past the timeout.

pub mod commitment;
pub mod config;
pub mod error;
pub mod ledger;
pub mod moves;
pub mod outcome;
pub mod refresh;
pub mod session;
pub mod storage;
pub mod timeout;
pub mod types;

pub use commitment::{compute_commitment, generate_salt, Commitment, CommitmentScheme, Salt};
pub use config::ClientConfig;
pub use error::{GameError, Result};
pub use ledger::{ContractState, Ledger, LedgerError, SandboxBook, SandboxLedger};
pub use moves::Move;
pub use outcome::{resolve, Resolution, Winner};
pub use refresh::{spawn_refresh, RefreshHandle};
pub use session::{
    Action, GameClient, GameSession, GameStatus, Phase, RefreshOutcome, Role, TimeoutClaim,
};
pub use storage::{MemorySessionStore, SessionStore, SqliteSessionStore};
pub use timeout::{has_timed_out, time_remaining, Clock, OffsetClock, SystemClock, TimeRemaining};
pub use types::{Address, GameId, Receipt, Wei};

use std::path::Path;

/// Client for `account` keeping its sessions in an SQLite file.
pub fn open_client<L: Ledger>(
    account: Address,
    ledger: L,
    db_path: &Path,
) -> Result<GameClient<L, SqliteSessionStore>> {
    let store = SqliteSessionStore::open(db_path)?;
    GameClient::new(ClientConfig::new(account), ledger, store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::Salt;
    use crate::ledger::LedgerResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::sync::Notify;

    const START: u64 = 1_700_000_000;

    fn alice() -> Address {
        "0x1111111111111111111111111111111111111111".parse().unwrap()
    }

    fn bob() -> Address {
        "0x2222222222222222222222222222222222222222".parse().unwrap()
    }

    fn eth(amount: &str) -> Wei {
        Wei::from_ether(amount).unwrap()
    }

    fn init_logging() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    type Client<L = SandboxLedger> = GameClient<L, MemorySessionStore>;

    struct Table {
        clock: Arc<OffsetClock>,
        chain: SandboxLedger,
        alice: Client,
        bob: Client,
    }

    fn client<L: Ledger>(account: Address, ledger: L, clock: &Arc<OffsetClock>) -> Client<L> {
        GameClient::with_clock(
            ClientConfig::new(account),
            ledger,
            MemorySessionStore::new(),
            clock.clone(),
        )
        .unwrap()
    }

    fn table() -> Table {
        init_logging();
        let clock = Arc::new(OffsetClock::frozen(START));
        let chain = SandboxLedger::new(alice(), clock.clone());
        let alice = client(alice(), chain.clone(), &clock);
        let bob = client(bob(), chain.as_account(bob()), &clock);
        Table {
            clock,
            chain,
            alice,
            bob,
        }
    }

    /// Delegates to the sandbox, optionally parking reads or refusing reveals.
    struct ScriptedLedger {
        inner: SandboxLedger,
        hold_reads: AtomicBool,
        gate: Arc<Notify>,
        refuse_reveal: Option<String>,
    }

    impl ScriptedLedger {
        fn new(inner: SandboxLedger) -> Self {
            Self {
                inner,
                hold_reads: AtomicBool::new(false),
                gate: Arc::new(Notify::new()),
                refuse_reveal: None,
            }
        }
    }

    #[async_trait]
    impl Ledger for ScriptedLedger {
        async fn submit_commitment(
            &self,
            commitment: Commitment,
            opponent: Address,
            stake: Wei,
        ) -> LedgerResult<GameId> {
            self.inner.submit_commitment(commitment, opponent, stake).await
        }

        async fn submit_play(&self, game: &GameId, mv: Move, stake: Wei) -> LedgerResult<Receipt> {
            self.inner.submit_play(game, mv, stake).await
        }

        async fn submit_reveal(
            &self,
            game: &GameId,
            mv: Move,
            salt: &Salt,
        ) -> LedgerResult<Receipt> {
            if let Some(reason) = &self.refuse_reveal {
                return Err(LedgerError::Rejected(reason.clone()));
            }
            self.inner.submit_reveal(game, mv, salt).await
        }

        async fn submit_player2_timeout_claim(&self, game: &GameId) -> LedgerResult<Receipt> {
            self.inner.submit_player2_timeout_claim(game).await
        }

        async fn submit_player1_timeout_claim(&self, game: &GameId) -> LedgerResult<Receipt> {
            self.inner.submit_player1_timeout_claim(game).await
        }

        async fn read_state(&self, game: &GameId) -> LedgerResult<ContractState> {
            if self.hold_reads.swap(false, Ordering::SeqCst) {
                self.gate.notified().await;
            }
            self.inner.read_state(game).await
        }
    }

    #[tokio::test]
    async fn test_rock_beats_scissors() {
        let t = table();
        let stake = eth("1");

        let created = t.alice.create(Move::Rock, bob(), stake).await.unwrap();
        let game = created.game_id;
        assert_eq!(created.phase, Phase::Created);
        assert!(created.has_secret());

        let played = t.bob.play(&game, Move::Scissors, stake).await.unwrap();
        assert_eq!(played.phase, Phase::Player2Moved);

        let revealed = t.alice.reveal(&game).await.unwrap();
        assert_eq!(revealed.phase, Phase::Resolved);
        let resolution = revealed.resolution.unwrap();
        assert_eq!(resolution.winner, Winner::Player1);
        assert_eq!(resolution.payout, Some(eth("2")));
        assert_eq!(t.chain.payout_of(&alice()), eth("2"));

        let stored = t.alice.store().load(&alice(), &game).unwrap().unwrap();
        assert_eq!(stored.phase, Phase::Resolved);
    }

    #[tokio::test]
    async fn test_creator_claims_when_player2_never_plays() {
        let t = table();
        let stake = eth("0.5");
        let game = t
            .alice
            .create(Move::Paper, bob(), stake)
            .await
            .unwrap()
            .game_id;
        let submitted = t.chain.submission_count();

        // one second before the claim becomes valid
        t.clock.advance(300);
        let early = t
            .alice
            .claim_timeout(&game, TimeoutClaim::Player2Inactive)
            .await;
        match early {
            Err(GameError::TimeoutNotElapsed { remaining_secs }) => assert_eq!(remaining_secs, 1),
            other => panic!("expected TimeoutNotElapsed, got {:?}", other),
        }
        assert_eq!(t.chain.submission_count(), submitted);
        assert_eq!(
            t.alice.session(&game).unwrap().unwrap().phase,
            Phase::Created
        );

        t.clock.advance(1);
        let claimed = t
            .alice
            .claim_timeout(&game, TimeoutClaim::Player2Inactive)
            .await
            .unwrap();
        assert_eq!(claimed.phase, Phase::TimeoutPlayer2Inactive);
        assert_eq!(t.chain.payout_of(&alice()), stake);
    }

    #[tokio::test]
    async fn test_equal_moves_tie_without_double_payout() {
        let t = table();
        let stake = eth("1");
        let game = t
            .alice
            .create(Move::Spock, bob(), stake)
            .await
            .unwrap()
            .game_id;
        t.bob.play(&game, Move::Spock, stake).await.unwrap();

        let revealed = t.alice.reveal(&game).await.unwrap();
        let resolution = revealed.resolution.unwrap();
        assert_eq!(resolution.winner, Winner::Tie);
        assert_eq!(resolution.payout, None);
        // each side only gets its own stake back
        assert_eq!(t.chain.payout_of(&alice()), stake);
        assert_eq!(t.chain.payout_of(&bob()), stake);
    }

    #[tokio::test]
    async fn test_self_play_never_reaches_ledger() {
        let t = table();
        let result = t.alice.create(Move::Rock, alice(), eth("1")).await;
        assert!(matches!(result, Err(GameError::SelfPlay(_))));
        assert_eq!(t.chain.submission_count(), 0);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let t = table();
        assert!(matches!(
            t.alice.create(Move::None, bob(), eth("1")).await,
            Err(GameError::NoMoveSelected)
        ));
        assert!(matches!(
            t.alice.create(Move::Rock, bob(), Wei::ZERO).await,
            Err(GameError::ZeroStake)
        ));
        assert!(matches!(
            t.alice
                .create(Move::Rock, bob(), Wei::from_wei(u128::MAX))
                .await,
            Err(GameError::InvalidAmount(_))
        ));
        assert_eq!(t.chain.submission_count(), 0);
        assert!(t.alice.current().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stake_mismatch_is_local() {
        let t = table();
        let game = t
            .alice
            .create(Move::Rock, bob(), eth("1"))
            .await
            .unwrap()
            .game_id;
        let submitted = t.chain.submission_count();

        let result = t.bob.play(&game, Move::Paper, eth("0.5")).await;
        match result {
            Err(e @ GameError::StakeMismatch { .. }) => assert!(e.is_validation()),
            other => panic!("expected StakeMismatch, got {:?}", other),
        }
        assert_eq!(t.chain.submission_count(), submitted);
    }

    #[tokio::test]
    async fn test_only_player2_may_play() {
        let t = table();
        let game = t
            .alice
            .create(Move::Rock, bob(), eth("1"))
            .await
            .unwrap()
            .game_id;

        let result = t.alice.play(&game, Move::Paper, eth("1")).await;
        assert!(matches!(result, Err(GameError::WrongRole { .. })));

        let result = t
            .bob
            .claim_timeout(&game, TimeoutClaim::Player2Inactive)
            .await;
        assert!(matches!(result, Err(GameError::WrongRole { .. })));
    }

    #[tokio::test]
    async fn test_reveal_before_player2_moves() {
        let t = table();
        let game = t
            .alice
            .create(Move::Rock, bob(), eth("1"))
            .await
            .unwrap()
            .game_id;
        assert!(matches!(
            t.alice.reveal(&game).await,
            Err(GameError::InvalidPhase(_))
        ));
    }

    #[tokio::test]
    async fn test_reveal_without_local_secret() {
        let t = table();
        let stake = eth("1");
        let game = t
            .alice
            .create(Move::Rock, bob(), stake)
            .await
            .unwrap()
            .game_id;
        t.bob.play(&game, Move::Paper, stake).await.unwrap();

        // same account on a machine that never saw the creation
        let elsewhere = client(alice(), t.chain.clone(), &t.clock);
        let result = elsewhere.reveal(&game).await;
        assert!(matches!(result, Err(GameError::MissingSecret(_))));
        assert!(!t.chain.read_state(&game).await.unwrap().is_settled());
    }

    #[tokio::test]
    async fn test_corrupted_secret_is_caught_before_reveal() {
        let t = table();
        let stake = eth("1");
        let created = t.alice.create(Move::Rock, bob(), stake).await.unwrap();
        let game = created.game_id;
        t.bob.play(&game, Move::Paper, stake).await.unwrap();
        let submitted = t.chain.submission_count();

        let mut corrupted = created.clone();
        corrupted.player1_move = Some(Move::Lizard);
        let restored = client(alice(), t.chain.clone(), &t.clock);
        restored.store().save(&alice(), &corrupted).unwrap();

        let result = restored.reveal(&game).await;
        assert!(matches!(result, Err(GameError::CommitmentMismatch(_))));
        assert_eq!(t.chain.submission_count(), submitted);
    }

    #[tokio::test]
    async fn test_ledger_rejection_leaves_phase_unchanged() {
        let t = table();
        let stake = eth("1");
        let mut scripted = ScriptedLedger::new(t.chain.clone());
        scripted.refuse_reveal = Some("bad reveal".to_string());
        let alice = client(alice(), scripted, &t.clock);

        let game = alice
            .create(Move::Scissors, bob(), stake)
            .await
            .unwrap()
            .game_id;
        t.bob.play(&game, Move::Paper, stake).await.unwrap();
        alice.refresh(&game).await.unwrap();

        let result = alice.reveal(&game).await;
        match result {
            Err(GameError::LedgerRejected(reason)) => assert_eq!(reason, "bad reveal"),
            other => panic!("expected LedgerRejected, got {:?}", other),
        }
        let stored = alice.store().load(&alice.account(), &game).unwrap().unwrap();
        assert_eq!(stored.phase, Phase::Player2Moved);
        assert!(stored.resolution.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_ledger_is_transient() {
        let t = table();
        let stake = eth("1");
        let game = t
            .alice
            .create(Move::Rock, bob(), stake)
            .await
            .unwrap()
            .game_id;
        t.bob.play(&game, Move::Paper, stake).await.unwrap();

        t.chain.set_offline(true);
        let result = t.alice.reveal(&game).await;
        match result {
            Err(e @ GameError::LedgerUnavailable(_)) => assert!(e.is_transient()),
            other => panic!("expected LedgerUnavailable, got {:?}", other),
        }
        assert_eq!(
            t.alice.store().load(&alice(), &game).unwrap().unwrap().phase,
            Phase::Created
        );

        t.chain.set_offline(false);
        let revealed = t.alice.reveal(&game).await.unwrap();
        assert_eq!(revealed.resolution.unwrap().winner, Winner::Player2);
    }

    #[tokio::test]
    async fn test_second_transition_is_rejected_while_first_in_flight() {
        let t = table();
        let stake = eth("1");
        let game = t
            .alice
            .create(Move::Rock, bob(), stake)
            .await
            .unwrap()
            .game_id;

        let scripted = ScriptedLedger::new(t.chain.as_account(bob()));
        let gate = scripted.gate.clone();
        scripted.hold_reads.store(true, Ordering::SeqCst);
        let bob = client(bob(), scripted, &t.clock);

        let (first, (second, refreshed)) = tokio::join!(bob.play(&game, Move::Lizard, stake), async {
            let second = bob.play(&game, Move::Paper, stake).await;
            let refreshed = bob.refresh(&game).await;
            gate.notify_one();
            (second, refreshed)
        });

        assert_eq!(first.unwrap().player2_move, Move::Lizard);
        assert!(matches!(second, Err(GameError::TransitionInFlight(_))));
        assert!(matches!(refreshed, Ok(RefreshOutcome::Skipped)));
        assert_eq!(
            t.chain.read_state(&game).await.unwrap().player2_move,
            Move::Lizard
        );
    }

    #[tokio::test]
    async fn test_player2_record_never_holds_secret() {
        let t = table();
        let stake = eth("1");
        let created = t.alice.create(Move::Rock, bob(), stake).await.unwrap();
        let game = created.game_id;
        t.bob.play(&game, Move::Paper, stake).await.unwrap();

        let bob_view = t.bob.session(&game).unwrap().unwrap();
        assert!(!bob_view.has_secret());

        let raw = t.bob.store().raw(&bob(), &game).unwrap();
        let salt_hex = created.salt.unwrap().to_hex();
        assert!(!raw.contains(&salt_hex[2..]));
    }

    #[tokio::test]
    async fn test_refresh_corrects_stale_local_phase() {
        let t = table();
        let stake = eth("1");
        let game = t
            .alice
            .create(Move::Rock, bob(), stake)
            .await
            .unwrap()
            .game_id;
        t.bob.play(&game, Move::Spock, stake).await.unwrap();
        assert_eq!(
            t.alice.session(&game).unwrap().unwrap().phase,
            Phase::Created
        );

        match t.alice.refresh(&game).await.unwrap() {
            RefreshOutcome::Updated(session) => {
                assert_eq!(session.phase, Phase::Player2Moved);
                assert_eq!(session.player2_move, Move::Spock);
                assert!(session.has_secret());
            }
            RefreshOutcome::Skipped => panic!("refresh should apply"),
        }
    }

    #[tokio::test]
    async fn test_player2_claims_when_creator_never_reveals() {
        let t = table();
        let stake = eth("1");
        let game = t
            .alice
            .create(Move::Rock, bob(), stake)
            .await
            .unwrap()
            .game_id;
        t.bob.play(&game, Move::Paper, stake).await.unwrap();

        t.clock.advance(301);
        let status = t.bob.status(&game).await.unwrap();
        assert_eq!(status.role, Role::Player2);
        assert_eq!(
            status.actions,
            vec![Action::ClaimTimeout(TimeoutClaim::Player1Inactive)]
        );

        let claimed = t.bob.claim_available_timeout(&game).await.unwrap();
        assert_eq!(claimed.phase, Phase::TimeoutPlayer1Inactive);
        assert_eq!(t.chain.payout_of(&bob()), eth("2"));

        // Player 1 learns of it only through the ledger
        match t.alice.refresh(&game).await.unwrap() {
            RefreshOutcome::Updated(session) => assert_eq!(session.phase, Phase::Settled),
            RefreshOutcome::Skipped => panic!("refresh should apply"),
        }
    }

    #[tokio::test]
    async fn test_status_for_fresh_game() {
        let t = table();
        let game = t
            .alice
            .create(Move::Rock, bob(), eth("1"))
            .await
            .unwrap()
            .game_id;

        let status = t.alice.status(&game).await.unwrap();
        assert_eq!(status.role, Role::Player1);
        assert!(status.actions.is_empty());
        assert_eq!(status.time_remaining.to_string(), "5m 0s");

        let bob_status = t.bob.status(&game).await.unwrap();
        assert_eq!(bob_status.actions, vec![Action::Play]);
    }

    #[tokio::test]
    async fn test_new_game_supersedes_current() {
        let t = table();
        let first = t
            .alice
            .create(Move::Rock, bob(), eth("1"))
            .await
            .unwrap()
            .game_id;
        let second = t
            .alice
            .create(Move::Paper, bob(), eth("1"))
            .await
            .unwrap()
            .game_id;

        assert_ne!(first, second);
        assert_eq!(t.alice.current().unwrap().unwrap().game_id, second);
        assert_eq!(t.alice.store().current(&alice()).unwrap(), Some(second));
        assert!(t.alice.session(&first).unwrap().unwrap().has_secret());
        assert_eq!(t.alice.sessions().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_secret_survives_restart() {
        init_logging();
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("rpsls.db");
        let chain = SandboxLedger::new(alice(), Arc::new(SystemClock));
        let stake = eth("1");

        let game = {
            let alice = open_client(alice(), chain.clone(), &db_path).unwrap();
            alice
                .create(Move::Lizard, bob(), stake)
                .await
                .unwrap()
                .game_id
        };
        chain
            .as_account(bob())
            .submit_play(&game, Move::Paper, stake)
            .await
            .unwrap();

        let alice = open_client(alice(), chain.clone(), &db_path).unwrap();
        assert_eq!(alice.current().unwrap().unwrap().game_id, game);
        let revealed = alice.reveal(&game).await.unwrap();
        assert_eq!(revealed.resolution.unwrap().winner, Winner::Player1);
    }

    #[tokio::test]
    async fn test_refresh_task_follows_game_to_the_end() {
        init_logging();
        let clock = Arc::new(OffsetClock::frozen(START));
        let chain = SandboxLedger::new(alice(), clock.clone());
        let alice = Arc::new(
            GameClient::with_clock(
                ClientConfig::new(alice()).with_refresh_interval(Duration::from_millis(10)),
                chain.clone(),
                MemorySessionStore::new(),
                clock.clone(),
            )
            .unwrap(),
        );
        let stake = eth("1");
        let game = alice
            .create(Move::Rock, bob(), stake)
            .await
            .unwrap()
            .game_id;

        let handle = spawn_refresh(alice.clone(), game);
        let mut updates = handle.updates();

        chain
            .as_account(bob())
            .submit_play(&game, Move::Scissors, stake)
            .await
            .unwrap();

        let seen = tokio::time::timeout(
            Duration::from_secs(5),
            updates.wait_for(|s| matches!(s, Some(s) if s.phase == Phase::Player2Moved)),
        )
        .await
        .expect("refresh should observe the play")
        .unwrap()
        .clone();
        assert_eq!(seen.unwrap().player2_move, Move::Scissors);

        alice.reveal(&game).await.unwrap();
        tokio::time::timeout(
            Duration::from_secs(5),
            updates.wait_for(|s| matches!(s, Some(s) if s.is_terminal())),
        )
        .await
        .expect("refresh should observe the reveal")
        .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_accounts_sharing_a_database() {
        init_logging();
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("rpsls.db");
        let chain = SandboxLedger::new(alice(), Arc::new(SystemClock));
        let stake = eth("1");

        let player1 = open_client(alice(), chain.clone(), &db_path).unwrap();
        let player2 = open_client(bob(), chain.as_account(bob()), &db_path).unwrap();

        let game = player1
            .create(Move::Rock, bob(), stake)
            .await
            .unwrap()
            .game_id;

        let status = player2.status(&game).await.unwrap();
        assert_eq!(status.role, Role::Player2);
        assert!(!status.session.has_secret());
        assert_eq!(status.session.player1_move, None);
        assert!(player2.current().unwrap().is_none());

        let played = player2.play(&game, Move::Spock, stake).await.unwrap();
        assert!(!played.has_secret());

        // player 2's writes never replace player 1's record
        let revealed = player1.reveal(&game).await.unwrap();
        assert_eq!(revealed.resolution.unwrap().winner, Winner::Player2);
    }

    #[tokio::test]
    async fn test_foreign_secret_is_dropped_on_load() {
        let t = table();
        let created = t
            .alice
            .create(Move::Scissors, bob(), eth("1"))
            .await
            .unwrap();

        let store = MemorySessionStore::new();
        store.save(&bob(), &created).unwrap();
        let bob = GameClient::with_clock(
            ClientConfig::new(bob()),
            t.chain.as_account(bob()),
            store,
            t.clock.clone(),
        )
        .unwrap();

        let session = bob.session(&created.game_id).unwrap().unwrap();
        assert!(!session.has_secret());
        assert_eq!(session.player1_move, None);
        assert!(bob.sessions().unwrap().iter().all(|s| !s.has_secret()));
    }

    #[tokio::test]
    async fn test_observe_reads_without_writing() {
        let t = table();
        let stake = eth("1");
        let game = t
            .alice
            .create(Move::Paper, bob(), stake)
            .await
            .unwrap()
            .game_id;
        t.bob.play(&game, Move::Rock, stake).await.unwrap();

        let observed = t.alice.observe(&game).await.unwrap();
        assert_eq!(observed.phase, Phase::Player2Moved);
        assert_eq!(observed.player2_move, Move::Rock);
        assert!(!observed.has_secret());

        let stored = t.alice.store().load(&alice(), &game).unwrap().unwrap();
        assert_eq!(stored.phase, Phase::Created);
        assert!(t.alice.session(&game).unwrap().unwrap().has_secret());

        // spectators can observe too
        let carol: Address = "0x3333333333333333333333333333333333333333".parse().unwrap();
        let spectator = client(carol, t.chain.as_account(carol), &t.clock);
        let seen = spectator.observe(&game).await.unwrap();
        assert_eq!(seen.role_of(&carol), Role::Spectator);
        assert!(spectator.sessions().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_game() {
        let t = table();
        let missing = GameId(Address::from_bytes([0x42; 20]));

        assert!(matches!(
            t.bob.play(&missing, Move::Rock, eth("1")).await,
            Err(GameError::GameNotFound(game)) if game == missing
        ));
        assert!(matches!(
            t.alice.observe(&missing).await,
            Err(GameError::GameNotFound(_))
        ));
        assert_eq!(t.chain.submission_count(), 0);
    }

    #[tokio::test]
    async fn test_refresh_task_with_unreadable_record() {
        let t = table();
        let game = t
            .alice
            .create(Move::Rock, bob(), eth("1"))
            .await
            .unwrap()
            .game_id;

        let store = MemorySessionStore::new();
        store.put_raw(alice(), game, r#"{"gameState":"WAITING_FOR_J2"}"#.to_string());
        let restored = Arc::new(
            GameClient::with_clock(
                ClientConfig::new(alice()).with_refresh_interval(Duration::from_millis(10)),
                t.chain.clone(),
                store,
                t.clock.clone(),
            )
            .unwrap(),
        );

        let handle = spawn_refresh(restored, game);
        assert!(handle.updates().borrow().is_none());

        tokio::time::timeout(Duration::from_secs(5), async {
            while !handle.is_finished() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("an unreadable record should stop the task");
    }
}
