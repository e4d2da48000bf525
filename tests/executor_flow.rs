//! Execution controller integration tests against a scripted chain

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use starknet_types_core::felt::Felt;

use delvebot::chain::{
    Call, ExecutionStatus, Receipt, StateReader, SubmitOutcome, TxSubmitter,
};
use delvebot::core::config::EngineConfig;
use delvebot::core::error::{DelveError, Result};
use delvebot::executor::{Executor, Fingerprint};
use delvebot::model::{Adventurer, Bag, GameState, Market};
use delvebot::runner::GameRunner;
use delvebot::signing::hash::{InvokeFields, OutsideExecution};
use delvebot::signing::{SessionCredentials, SignatureBundle};
use delvebot::telemetry::TelemetrySink;
use std::time::Duration;
use tokio::sync::watch;

struct MockChain {
    submit_script: Mutex<VecDeque<SubmitOutcome>>,
    receipt_script: Mutex<VecDeque<Option<Receipt>>>,
    state_script: Mutex<VecDeque<GameState>>,
    fallback_state: GameState,
    submit_calls: AtomicUsize,
}

impl MockChain {
    fn new(
        submits: Vec<SubmitOutcome>,
        receipts: Vec<Option<Receipt>>,
        states: Vec<GameState>,
    ) -> Arc<Self> {
        Arc::new(Self {
            submit_script: Mutex::new(submits.into()),
            receipt_script: Mutex::new(receipts.into()),
            state_script: Mutex::new(states.into()),
            fallback_state: game_state(100, 25),
            submit_calls: AtomicUsize::new(0),
        })
    }

    fn submits(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    fn next_submit(&self) -> SubmitOutcome {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submit_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(SubmitOutcome::Accepted { tx_hash: Felt::ONE })
    }
}

#[async_trait]
impl StateReader for MockChain {
    async fn read_game_state(&self, _game_id: u64) -> Result<Option<GameState>> {
        let next = self.state_script.lock().unwrap().pop_front();
        Ok(Some(next.unwrap_or_else(|| self.fallback_state.clone())))
    }

    async fn get_receipt(&self, _tx_hash: Felt) -> Result<Option<Receipt>> {
        Ok(self.receipt_script.lock().unwrap().pop_front().flatten())
    }

    async fn get_nonce(&self, _address: Felt) -> Result<Felt> {
        Ok(Felt::ZERO)
    }
}

#[async_trait]
impl TxSubmitter for MockChain {
    async fn submit_outside_execution(
        &self,
        _controller: Felt,
        _execution: &OutsideExecution,
        _signature: &SignatureBundle,
    ) -> Result<SubmitOutcome> {
        Ok(self.next_submit())
    }

    async fn submit_invoke(
        &self,
        _fields: &InvokeFields,
        _signature: &SignatureBundle,
    ) -> Result<SubmitOutcome> {
        Ok(self.next_submit())
    }
}

fn game_state(health: u16, xp: u32) -> GameState {
    let mut adventurer = Adventurer::default();
    adventurer.health = health;
    adventurer.xp = xp;
    GameState { adventurer, bag: Bag::default(), beast: None, market: Market::default() }
}

fn creds() -> Arc<SessionCredentials> {
    Arc::new(SessionCredentials {
        controller_address: Felt::from(0x100u64),
        session_private_key: Felt::from(0x2fa1u64),
        session_key_guid: Felt::from(0x300u64),
        registered_session_hash: Felt::from(0x400u64),
        wildcard_root: Felt::from(0x5555u64),
        expires_at: 2_000_000_000,
    })
}

fn fast_cfg() -> EngineConfig {
    let mut cfg = EngineConfig::default();
    cfg.max_submit_attempts = 3;
    cfg.submit_timeout_secs = 5;
    cfg.retry_delay_ms = 1;
    cfg.receipt_poll_interval_ms = 1;
    cfg.receipt_poll_attempts = 3;
    cfg.resync_attempts = 4;
    cfg.resync_interval_ms = 1;
    cfg
}

fn executor(chain: Arc<MockChain>) -> Executor<MockChain> {
    Executor::new(chain, creds(), Felt::from(1u64), fast_cfg(), TelemetrySink::disabled(), 42)
}

fn a_call() -> Vec<Call> {
    vec![Call { to: Felt::from(2u64), selector: Felt::from(3u64), calldata: vec![] }]
}

fn succeeded() -> Option<Receipt> {
    Some(Receipt { status: ExecutionStatus::Succeeded, revert_reason: None })
}

#[tokio::test]
async fn accepted_transaction_confirms_on_receipt() {
    let chain = MockChain::new(
        vec![SubmitOutcome::Accepted { tx_hash: Felt::from(9u64) }],
        vec![succeeded()],
        vec![],
    );
    let outcome = executor(chain.clone()).execute(a_call(), "attack").await.unwrap();
    assert_eq!(outcome.tx_hash, Felt::from(9u64));
    assert!(!outcome.confirmed_by_timeout);
    assert_eq!(chain.submits(), 1);
}

#[tokio::test]
async fn revert_rejection_aborts_without_retry() {
    let chain = MockChain::new(
        vec![SubmitOutcome::Rejected { error: "Execution error: market closed".into() }],
        vec![],
        vec![],
    );
    let err = executor(chain.clone()).execute(a_call(), "market").await.unwrap_err();
    assert!(matches!(err, DelveError::Reverted(_)), "got {err:?}");
    assert_eq!(chain.submits(), 1);
}

#[tokio::test]
async fn transient_rejection_retries_then_succeeds() {
    let chain = MockChain::new(
        vec![
            SubmitOutcome::Rejected { error: "relayer busy, try later".into() },
            SubmitOutcome::Accepted { tx_hash: Felt::from(5u64) },
        ],
        vec![succeeded()],
        vec![],
    );
    let outcome = executor(chain.clone()).execute(a_call(), "explore").await.unwrap();
    assert_eq!(outcome.tx_hash, Felt::from(5u64));
    assert_eq!(chain.submits(), 2);
}

#[tokio::test]
async fn attempts_exhaust_into_submission_error() {
    let chain = MockChain::new(
        vec![
            SubmitOutcome::Rejected { error: "gateway 502".into() },
            SubmitOutcome::Rejected { error: "gateway 502".into() },
            SubmitOutcome::Rejected { error: "gateway 502".into() },
        ],
        vec![],
        vec![],
    );
    let err = executor(chain.clone()).execute(a_call(), "explore").await.unwrap_err();
    assert!(matches!(err, DelveError::Submission(_)), "got {err:?}");
    assert_eq!(chain.submits(), 3);
}

#[tokio::test]
async fn reverted_receipt_surfaces_the_reason() {
    let chain = MockChain::new(
        vec![SubmitOutcome::Accepted { tx_hash: Felt::ONE }],
        vec![Some(Receipt {
            status: ExecutionStatus::Reverted,
            revert_reason: Some("beast already dead".into()),
        })],
        vec![],
    );
    let err = executor(chain).execute(a_call(), "attack").await.unwrap_err();
    match err {
        DelveError::Reverted(reason) => assert!(reason.contains("already dead")),
        other => panic!("expected revert, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_receipt_becomes_success_by_timeout() {
    let chain = MockChain::new(
        vec![SubmitOutcome::Accepted { tx_hash: Felt::ONE }],
        vec![None, None, None],
        vec![],
    );
    let outcome = executor(chain).execute(a_call(), "flee").await.unwrap();
    assert!(outcome.confirmed_by_timeout);
}

#[tokio::test]
async fn shutdown_aborts_an_in_flight_wait() {
    // the transaction is accepted but no receipt ever lands, and each poll
    // would wait a minute; a shutdown mid-poll must end the run promptly
    let chain = MockChain::new(vec![SubmitOutcome::Accepted { tx_hash: Felt::ONE }], vec![], vec![]);
    let mut cfg = fast_cfg();
    cfg.receipt_poll_interval_ms = 60_000;

    let executor = Executor::new(
        chain.clone(),
        creds(),
        Felt::from(1u64),
        cfg.clone(),
        TelemetrySink::disabled(),
        42,
    );
    let (tx, rx) = watch::channel(false);
    let runner = GameRunner::new(
        chain.clone(),
        executor,
        cfg,
        TelemetrySink::disabled(),
        Felt::from(2u64),
        42,
        rx,
    );

    let handle = tokio::spawn(runner.run());
    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(true).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("shutdown did not abort the in-flight wait")
        .unwrap();
    assert!(result.is_ok());
    assert_eq!(chain.submits(), 1);
}

#[tokio::test]
async fn await_state_change_skips_stale_snapshots() {
    let stale = game_state(100, 25);
    let fresh = game_state(80, 36);
    let chain = MockChain::new(vec![], vec![], vec![stale.clone(), stale.clone(), fresh]);

    let before = Fingerprint::of(&stale);
    let next = executor(chain).await_state_change(before).await.unwrap();
    assert_eq!(next.adventurer.health, 80);
    assert_eq!(next.adventurer.xp, 36);
}

#[tokio::test]
async fn await_state_change_returns_latest_when_nothing_moves() {
    let stale = game_state(100, 25);
    // the script and the fallback never change: the resync budget runs out
    let chain = MockChain::new(vec![], vec![], vec![]);

    let before = Fingerprint::of(&stale);
    let next = executor(chain).await_state_change(before).await.unwrap();
    assert_eq!(Fingerprint::of(&next), before);
}
