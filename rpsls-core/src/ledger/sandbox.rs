use crate::commitment::{verify_commitment, Commitment, Salt};
use crate::ledger::{ContractState, Ledger, LedgerError, LedgerResult};
use crate::moves::Move;
use crate::outcome::{resolve, Winner};
use crate::timeout::{has_timed_out_at, Clock};
use crate::types::{Address, GameId, Receipt, Wei};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Timeout the deployed game contract hard-codes.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SandboxContract {
    state: ContractState,
}

/// Everything the sandbox chain knows, serializable so a front end can keep
/// it between runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxBook {
    contracts: HashMap<GameId, SandboxContract>,
    payouts: HashMap<Address, Wei>,
    nonce: u64,
}

impl SandboxBook {
    pub fn payouts(&self) -> &HashMap<Address, Wei> {
        &self.payouts
    }

    fn next_nonce(&mut self) -> u64 {
        self.nonce += 1;
        self.nonce
    }

    /// Applies every credit or none of them.
    fn settle(&mut self, credits: &[(Address, Wei)]) -> LedgerResult<()> {
        let mut updated: HashMap<Address, Wei> = HashMap::new();
        for (to, amount) in credits {
            let balance = updated
                .get(to)
                .or_else(|| self.payouts.get(to))
                .copied()
                .unwrap_or_default();
            let balance = balance.checked_add(*amount).ok_or_else(|| {
                LedgerError::Rejected(format!("payout to {} overflows its balance", to))
            })?;
            updated.insert(*to, balance);
        }
        self.payouts.extend(updated);
        Ok(())
    }

    fn contract_mut(&mut self, game: &GameId) -> LedgerResult<&mut SandboxContract> {
        self.contracts
            .get_mut(game)
            .ok_or(LedgerError::NotFound(*game))
    }
}

/// In-process stand-in for the game contract, bound to one signing account.
///
/// Applies the contract's rules: only Player 2 plays and must match the
/// stake, only Player 1 reveals and must reproduce the commitment, and each
/// timeout is claimable once the other side stalled past the deadline.
#[derive(Clone)]
pub struct SandboxLedger {
    book: Arc<Mutex<SandboxBook>>,
    signer: Address,
    clock: Arc<dyn Clock>,
    timeout: u64,
    submissions: Arc<AtomicUsize>,
    offline: Arc<AtomicBool>,
}

impl SandboxLedger {
    pub fn new(signer: Address, clock: Arc<dyn Clock>) -> Self {
        Self::with_book(SandboxBook::default(), signer, clock)
    }

    pub fn with_book(book: SandboxBook, signer: Address, clock: Arc<dyn Clock>) -> Self {
        Self {
            book: Arc::new(Mutex::new(book)),
            signer,
            clock,
            timeout: DEFAULT_TIMEOUT_SECS,
            submissions: Arc::new(AtomicUsize::new(0)),
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Same chain, different signer.
    pub fn as_account(&self, signer: Address) -> Self {
        Self {
            signer,
            ..self.clone()
        }
    }

    pub fn book(&self) -> SandboxBook {
        self.book.lock().clone()
    }

    pub fn payout_of(&self, account: &Address) -> Wei {
        self.book
            .lock()
            .payouts
            .get(account)
            .copied()
            .unwrap_or_default()
    }

    /// Submissions dispatched by any account on this chain, accepted or not.
    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    /// While offline every call fails as unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> LedgerResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable(
                "sandbox ledger is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn dispatch(&self) -> LedgerResult<()> {
        self.ensure_online()?;
        self.submissions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn receipt(&self, book: &mut SandboxBook, game: &GameId, action: &str) -> Receipt {
        let nonce = book.next_nonce();
        let mut hasher = Keccak256::new();
        hasher.update(game.0.as_bytes());
        hasher.update(self.signer.as_bytes());
        hasher.update(nonce.to_be_bytes());
        hasher.update(action.as_bytes());
        Receipt {
            tx_hash: format!("0x{}", hex::encode(hasher.finalize())),
            confirmed_at: Utc::now(),
        }
    }

    fn deployment_address(&self, nonce: u64) -> GameId {
        let mut hasher = Keccak256::new();
        hasher.update(self.signer.as_bytes());
        hasher.update(nonce.to_be_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        GameId(Address::from_bytes(bytes))
    }

    fn pot(state: &ContractState) -> LedgerResult<Wei> {
        state
            .stake
            .checked_mul(2)
            .ok_or_else(|| LedgerError::Rejected("pot overflows".to_string()))
    }

    fn reject<T>(reason: &str) -> LedgerResult<T> {
        Err(LedgerError::Rejected(reason.to_string()))
    }
}

#[async_trait]
impl Ledger for SandboxLedger {
    async fn submit_commitment(
        &self,
        commitment: Commitment,
        opponent: Address,
        stake: Wei,
    ) -> LedgerResult<GameId> {
        self.dispatch()?;
        let mut book = self.book.lock();
        let nonce = book.next_nonce();
        let game = self.deployment_address(nonce);

        let state = ContractState {
            player1: self.signer,
            player2: opponent,
            commitment,
            player2_move: Move::None,
            stake,
            timeout: self.timeout,
            last_action: self.clock.now(),
        };
        book.contracts.insert(game, SandboxContract { state });

        tracing::debug!("Sandbox deployed game {} for {}", game, self.signer);
        Ok(game)
    }

    async fn submit_play(&self, game: &GameId, mv: Move, stake: Wei) -> LedgerResult<Receipt> {
        self.dispatch()?;
        let now = self.clock.now();
        let mut book = self.book.lock();
        let contract = book.contract_mut(game)?;
        let state = &mut contract.state;

        if state.player2_has_moved() {
            return Self::reject("player 2 already played");
        }
        if mv.is_none() {
            return Self::reject("move must not be null");
        }
        if stake != state.stake {
            return Self::reject("value must equal the stake");
        }
        if self.signer != state.player2 {
            return Self::reject("only player 2 can play");
        }

        state.player2_move = mv;
        state.last_action = now;
        Ok(self.receipt(&mut book, game, "play"))
    }

    async fn submit_reveal(&self, game: &GameId, mv: Move, salt: &Salt) -> LedgerResult<Receipt> {
        self.dispatch()?;
        let mut book = self.book.lock();
        let state = book.contract_mut(game)?.state.clone();

        if mv.is_none() {
            return Self::reject("move must not be null");
        }
        if !state.player2_has_moved() {
            return Self::reject("player 2 has not played yet");
        }
        if state.is_settled() {
            return Self::reject("game already settled");
        }
        if self.signer != state.player1 {
            return Self::reject("only player 1 can solve");
        }
        if !verify_commitment(&state.commitment, mv, salt) {
            return Self::reject("move and salt do not match the commitment");
        }

        match resolve(mv, state.player2_move) {
            Winner::Player1 => book.settle(&[(state.player1, Self::pot(&state)?)])?,
            Winner::Player2 => book.settle(&[(state.player2, Self::pot(&state)?)])?,
            Winner::Tie => book.settle(&[
                (state.player1, state.stake),
                (state.player2, state.stake),
            ])?,
        }
        book.contract_mut(game)?.state.stake = Wei::ZERO;
        Ok(self.receipt(&mut book, game, "solve"))
    }

    async fn submit_player2_timeout_claim(&self, game: &GameId) -> LedgerResult<Receipt> {
        self.dispatch()?;
        let now = self.clock.now();
        let mut book = self.book.lock();
        let state = book.contract_mut(game)?.state.clone();

        if state.player2_has_moved() {
            return Self::reject("player 2 already played");
        }
        if state.is_settled() {
            return Self::reject("game already settled");
        }
        if !has_timed_out_at(now, state.last_action, state.timeout) {
            return Self::reject("timeout has not passed");
        }

        book.settle(&[(state.player1, state.stake)])?;
        book.contract_mut(game)?.state.stake = Wei::ZERO;
        Ok(self.receipt(&mut book, game, "j2Timeout"))
    }

    async fn submit_player1_timeout_claim(&self, game: &GameId) -> LedgerResult<Receipt> {
        self.dispatch()?;
        let now = self.clock.now();
        let mut book = self.book.lock();
        let state = book.contract_mut(game)?.state.clone();

        if !state.player2_has_moved() {
            return Self::reject("player 2 has not played yet");
        }
        if state.is_settled() {
            return Self::reject("game already settled");
        }
        if !has_timed_out_at(now, state.last_action, state.timeout) {
            return Self::reject("timeout has not passed");
        }

        book.settle(&[(state.player2, Self::pot(&state)?)])?;
        book.contract_mut(game)?.state.stake = Wei::ZERO;
        Ok(self.receipt(&mut book, game, "j1Timeout"))
    }

    async fn read_state(&self, game: &GameId) -> LedgerResult<ContractState> {
        self.ensure_online()?;
        let book = self.book.lock();
        book.contracts
            .get(game)
            .map(|c| c.state.clone())
            .ok_or(LedgerError::NotFound(*game))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::{compute_commitment, generate_salt};
    use crate::timeout::OffsetClock;

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Address::from_bytes(bytes)
    }

    fn one_ether() -> Wei {
        Wei::from_ether("1").unwrap()
    }

    async fn deployed(clock: Arc<OffsetClock>, mv: Move, salt: &Salt) -> (SandboxLedger, GameId) {
        let alice = SandboxLedger::new(addr(1), clock);
        let commitment = compute_commitment(mv, salt).unwrap();
        let game = alice
            .submit_commitment(commitment, addr(2), one_ether())
            .await
            .unwrap();
        (alice, game)
    }

    #[tokio::test]
    async fn test_reveal_must_match_commitment() {
        let clock = Arc::new(OffsetClock::frozen(1_000));
        let salt = generate_salt();
        let (alice, game) = deployed(clock, Move::Rock, &salt).await;
        let bob = alice.as_account(addr(2));

        bob.submit_play(&game, Move::Scissors, one_ether())
            .await
            .unwrap();

        let wrong_move = alice.submit_reveal(&game, Move::Paper, &salt).await;
        assert!(matches!(wrong_move, Err(LedgerError::Rejected(_))));

        let wrong_salt = alice.submit_reveal(&game, Move::Rock, &generate_salt()).await;
        assert!(matches!(wrong_salt, Err(LedgerError::Rejected(_))));

        alice.submit_reveal(&game, Move::Rock, &salt).await.unwrap();
        assert_eq!(alice.payout_of(&addr(1)), Wei::from_ether("2").unwrap());
        assert!(alice.read_state(&game).await.unwrap().is_settled());
    }

    #[tokio::test]
    async fn test_play_rules() {
        let clock = Arc::new(OffsetClock::frozen(1_000));
        let (alice, game) = deployed(clock, Move::Paper, &generate_salt()).await;

        let by_creator = alice.submit_play(&game, Move::Rock, one_ether()).await;
        assert_eq!(
            by_creator,
            Err(LedgerError::Rejected("only player 2 can play".into()))
        );

        let bob = alice.as_account(addr(2));
        let short = bob
            .submit_play(&game, Move::Rock, Wei::from_ether("0.5").unwrap())
            .await;
        assert!(matches!(short, Err(LedgerError::Rejected(_))));

        bob.submit_play(&game, Move::Rock, one_ether()).await.unwrap();
        let again = bob.submit_play(&game, Move::Rock, one_ether()).await;
        assert!(matches!(again, Err(LedgerError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_player2_timeout_refunds_creator() {
        let clock = Arc::new(OffsetClock::frozen(1_000));
        let (alice, game) = deployed(clock.clone(), Move::Paper, &generate_salt()).await;

        clock.advance(DEFAULT_TIMEOUT_SECS as i64);
        let early = alice.submit_player2_timeout_claim(&game).await;
        assert!(matches!(early, Err(LedgerError::Rejected(_))));

        clock.advance(1);
        alice.submit_player2_timeout_claim(&game).await.unwrap();
        assert_eq!(alice.payout_of(&addr(1)), one_ether());
    }

    #[tokio::test]
    async fn test_player1_timeout_pays_player2() {
        let clock = Arc::new(OffsetClock::frozen(1_000));
        let (alice, game) = deployed(clock.clone(), Move::Paper, &generate_salt()).await;
        let bob = alice.as_account(addr(2));
        bob.submit_play(&game, Move::Lizard, one_ether()).await.unwrap();

        clock.advance(DEFAULT_TIMEOUT_SECS as i64 + 1);
        bob.submit_player1_timeout_claim(&game).await.unwrap();
        assert_eq!(bob.payout_of(&addr(2)), Wei::from_ether("2").unwrap());
    }

    #[tokio::test]
    async fn test_offline_reads_are_unavailable() {
        let clock = Arc::new(OffsetClock::frozen(1_000));
        let (alice, game) = deployed(clock, Move::Rock, &generate_salt()).await;
        alice.set_offline(true);
        assert!(matches!(
            alice.read_state(&game).await,
            Err(LedgerError::Unavailable(_))
        ));
    }

    #[test]
    fn test_book_round_trips_through_json() {
        let mut book = SandboxBook::default();
        book.settle(&[(addr(7), one_ether())]).unwrap();
        let json = serde_json::to_string(&book).unwrap();
        let restored: SandboxBook = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.payouts().get(&addr(7)), Some(&one_ether()));
    }

    #[tokio::test]
    async fn test_unknown_game_is_not_found() {
        let clock = Arc::new(OffsetClock::frozen(1_000));
        let ledger = SandboxLedger::new(addr(1), clock);
        let missing = GameId(addr(42));

        assert_eq!(
            ledger.read_state(&missing).await,
            Err(LedgerError::NotFound(missing))
        );
        let play = ledger
            .as_account(addr(2))
            .submit_play(&missing, Move::Rock, one_ether())
            .await;
        assert_eq!(play, Err(LedgerError::NotFound(missing)));
    }

    #[test]
    fn test_overflowing_credit_changes_nothing() {
        let mut book = SandboxBook::default();
        book.settle(&[(addr(8), Wei::from_wei(u128::MAX))]).unwrap();

        let result = book.settle(&[(addr(7), one_ether()), (addr(8), one_ether())]);
        assert!(matches!(result, Err(LedgerError::Rejected(_))));
        assert_eq!(book.payouts().get(&addr(7)), None);
        assert_eq!(book.payouts().get(&addr(8)), Some(&Wei::from_wei(u128::MAX)));
    }
}
