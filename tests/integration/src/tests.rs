//! Integration tests for the epoch lottery.
//!
//! The ledger and the randomness coordinator run through their real entry
//! points, each on its own mock storage. Messages returned by one contract are
//! routed by hand: coordinator requests and callbacks are executed on the other
//! contract, CW20 transfers are applied to an in-memory balance and allowance
//! table that the ledger's querier also answers `Balance` queries from.
//!
//! A top-level execution is a transaction: if any message it emits fails, both
//! contract stores and the token tables are restored to where they started.
//!
//! Run:
//! ```bash
//! cargo test -p lotto-integration-tests
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{
    from_json, to_json_binary, Addr, ContractResult, CosmosMsg, Env, MemoryStorage, Order,
    OwnedDeps, Record, Response, Storage, SubMsg, SystemError, SystemResult, Timestamp, Uint128,
    Uint256, WasmMsg, WasmQuery,
};
use cw20::{BalanceResponse, Cw20ExecuteMsg, Cw20QueryMsg};
use lotto_common::{DrawnResult, LotteryState};
use lotto_epoch_ledger::msg::{
    ExecuteMsg as LedgerExecuteMsg, InstantiateMsg as LedgerInstantiateMsg,
    QueryMsg as LedgerQueryMsg,
};
use lotto_epoch_ledger::state::{
    EpochRecord, HeldTicket, LedgerState, BUY_PERIOD_SECONDS, CASH_OUT_PERIOD_SECONDS,
};
use lotto_epoch_ledger::ContractError as LedgerError;
use lotto_randomness_coordinator::msg::{
    ExecuteMsg as CoordinatorExecuteMsg, InstantiateMsg as CoordinatorInstantiateMsg,
    QueryMsg as CoordinatorQueryMsg,
};
use lotto_randomness_coordinator::state::{QueuedRequest, RandomnessRequest};
use lotto_randomness_coordinator::ContractError as CoordinatorError;
use serde::de::DeserializeOwned;

// ─── Constants ───

/// Real drand quicknet public key
const QUICKNET_PK_HEX: &str = "83cf0f2896adee7eb8b5f01fcad3912212c437e0073e911fb90022d3e760183c8c4b450b6a0a6c3ac6a5776a2d1064510d1fec758c921cc22b0e17e63aaf4bcb5ed66304de9cf809bd274ca73bab4af5a6e9c76a4bc09e76eae8991ef5ece45a";

/// Real quicknet test vector: round 1000
const TEST_ROUND: u64 = 1000;
const TEST_SIG_HEX: &str = "b44679b9a59af2ec876b1a6b1ad52ea9b1615fc3982b19576350f93447cb1125e342b73a8dd2bacbe47e4b6b63ed5e39";
const TEST_RANDOMNESS_HEX: &str =
    "fe290beca10872ef2fb164d2aa4442de4566183ec51c56ff3cd603d930e54fdd";

const TICKET_PRICE: u128 = 10;

type TestDeps = OwnedDeps<MemoryStorage, MockApi, MockQuerier>;
type Balances = Arc<Mutex<BTreeMap<String, u128>>>;
/// (owner, spender) -> remaining allowance
type Allowances = BTreeMap<(String, String), u128>;

/// Why a transaction failed.
#[derive(Debug)]
enum TxError {
    Ledger(LedgerError),
    Coordinator(CoordinatorError),
    Token(String),
}

impl From<LedgerError> for TxError {
    fn from(err: LedgerError) -> Self {
        TxError::Ledger(err)
    }
}

impl From<CoordinatorError> for TxError {
    fn from(err: CoordinatorError) -> Self {
        TxError::Coordinator(err)
    }
}

struct Checkpoint {
    ledger: Vec<Record>,
    coordinator: Vec<Record>,
    balances: BTreeMap<String, u128>,
    allowances: Allowances,
}

fn snapshot(storage: &MemoryStorage) -> Vec<Record> {
    storage.range(None, None, Order::Ascending).collect()
}

fn restore(storage: &mut MemoryStorage, records: Vec<Record>) {
    let keys: Vec<Vec<u8>> = storage
        .range(None, None, Order::Ascending)
        .map(|(key, _)| key)
        .collect();
    for key in keys {
        storage.remove(&key);
    }
    for (key, value) in records {
        storage.set(&key, &value);
    }
}

// ─── Test world ───

struct World {
    api: MockApi,
    ledger: TestDeps,
    coordinator: TestDeps,
    balances: Balances,
    allowances: Allowances,
    now: Timestamp,
}

impl World {
    /// Ledger and coordinator instantiated at `mock_env()` time. The coordinator's
    /// genesis is chosen so that a request made when the first Buy Period ends
    /// targets drand round 1000.
    fn new() -> Self {
        let api = MockApi::default();
        let balances: Balances = Arc::new(Mutex::new(BTreeMap::new()));
        let now = mock_env().block.time;

        let mut ledger = mock_dependencies();
        let token = api.addr_make("token").to_string();
        let shared = balances.clone();
        ledger.querier.update_wasm(move |query| match query {
            WasmQuery::Smart { contract_addr, msg } if *contract_addr == token => {
                let Ok(Cw20QueryMsg::Balance { address }) = from_json(msg) else {
                    return SystemResult::Err(SystemError::UnsupportedRequest {
                        kind: "cw20".to_string(),
                    });
                };
                let balance = shared.lock().unwrap().get(&address).copied().unwrap_or(0);
                SystemResult::Ok(ContractResult::Ok(
                    to_json_binary(&BalanceResponse {
                        balance: Uint128::new(balance),
                    })
                    .unwrap(),
                ))
            }
            _ => SystemResult::Err(SystemError::UnsupportedRequest {
                kind: "wasm".to_string(),
            }),
        });

        let mut world = World {
            api,
            ledger,
            coordinator: mock_dependencies(),
            balances,
            allowances: Allowances::new(),
            now,
        };

        let admin = world.addr("admin");
        let coordinator_msg = CoordinatorInstantiateMsg {
            operators: vec![world.addr("operator").to_string()],
            quicknet_pubkey_hex: QUICKNET_PK_HEX.to_string(),
            chain_hash: "52db9ba70e0cc0f6eaf7803dd07447a1f5477735fd3f661792ba94600c84e971"
                .to_string(),
            genesis_time: now.seconds() + BUY_PERIOD_SECONDS - 2994,
            period_seconds: 3,
            round_delay: 1,
        };
        let coordinator_env = world.env(&world.coordinator_addr());
        lotto_randomness_coordinator::contract::instantiate(
            world.coordinator.as_mut(),
            coordinator_env,
            message_info(&admin, &[]),
            coordinator_msg,
        )
        .unwrap();

        let ledger_msg = LedgerInstantiateMsg {
            payment_token: world.addr("token").to_string(),
            randomness_source: world.coordinator_addr().to_string(),
            ticket_price: Uint128::new(TICKET_PRICE),
            tier_schedule: None,
        };
        let ledger_env = world.env(&world.ledger_addr());
        lotto_epoch_ledger::contract::instantiate(
            world.ledger.as_mut(),
            ledger_env,
            message_info(&admin, &[]),
            ledger_msg,
        )
        .unwrap();

        world
    }

    fn addr(&self, name: &str) -> Addr {
        self.api.addr_make(name)
    }

    fn ledger_addr(&self) -> Addr {
        self.addr("ledger")
    }

    fn coordinator_addr(&self) -> Addr {
        self.addr("coordinator")
    }

    fn env(&self, contract: &Addr) -> Env {
        let mut env = mock_env();
        env.block.time = self.now;
        env.contract.address = contract.clone();
        env
    }

    fn advance(&mut self, seconds: u64) {
        self.now = self.now.plus_seconds(seconds);
    }

    fn mint(&self, name: &str, amount: u128) {
        let owner = self.addr(name).to_string();
        *self.balances.lock().unwrap().entry(owner).or_default() += amount;
    }

    /// Let the ledger pull up to `amount` from `name`.
    fn approve(&mut self, name: &str, amount: u128) {
        let key = (self.addr(name).to_string(), self.ledger_addr().to_string());
        self.allowances.insert(key, amount);
    }

    /// Mint `amount` to `name` and approve the ledger for all of it.
    fn fund(&mut self, name: &str, amount: u128) {
        self.mint(name, amount);
        self.approve(name, amount);
    }

    fn balance_of(&self, addr: &Addr) -> u128 {
        self.balances
            .lock()
            .unwrap()
            .get(addr.as_str())
            .copied()
            .unwrap_or(0)
    }

    fn balance(&self, name: &str) -> u128 {
        self.balance_of(&self.addr(name))
    }

    fn custody(&self) -> u128 {
        self.balance_of(&self.ledger_addr())
    }

    fn move_tokens(&self, from: &str, to: &str, amount: u128) -> Result<(), TxError> {
        let mut balances = self.balances.lock().unwrap();
        let from_balance = balances.entry(from.to_string()).or_default();
        if *from_balance < amount {
            return Err(TxError::Token(format!(
                "insufficient balance: {from} holds {from_balance}, needs {amount}"
            )));
        }
        *from_balance -= amount;
        *balances.entry(to.to_string()).or_default() += amount;
        Ok(())
    }

    fn spend_allowance(&mut self, owner: &str, spender: &str, amount: u128) -> Result<(), TxError> {
        let key = (owner.to_string(), spender.to_string());
        let allowance = self.allowances.get(&key).copied().unwrap_or(0);
        if allowance < amount {
            return Err(TxError::Token(format!(
                "insufficient allowance: {spender} may spend {allowance} of {owner}, needs {amount}"
            )));
        }
        self.allowances.insert(key, allowance - amount);
        Ok(())
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            ledger: snapshot(&self.ledger.storage),
            coordinator: snapshot(&self.coordinator.storage),
            balances: self.balances.lock().unwrap().clone(),
            allowances: self.allowances.clone(),
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        restore(&mut self.ledger.storage, checkpoint.ledger);
        restore(&mut self.coordinator.storage, checkpoint.coordinator);
        *self.balances.lock().unwrap() = checkpoint.balances;
        self.allowances = checkpoint.allowances;
    }

    /// Run `f` as one transaction, undoing every write if it fails.
    fn transact<F>(&mut self, f: F) -> Result<Response, TxError>
    where
        F: FnOnce(&mut Self) -> Result<Response, TxError>,
    {
        let checkpoint = self.checkpoint();
        let result = f(self);
        if result.is_err() {
            self.rollback(checkpoint);
        }
        result
    }

    fn exec_ledger(&mut self, sender: &str, msg: LedgerExecuteMsg) -> Result<Response, TxError> {
        let sender = self.addr(sender);
        self.exec_ledger_as(&sender, msg)
    }

    fn exec_ledger_as(&mut self, sender: &Addr, msg: LedgerExecuteMsg) -> Result<Response, TxError> {
        self.transact(|world| world.call_ledger(sender, msg))
    }

    fn exec_coordinator(
        &mut self,
        sender: &Addr,
        msg: CoordinatorExecuteMsg,
    ) -> Result<Response, TxError> {
        self.transact(|world| world.call_coordinator(sender, msg))
    }

    fn call_ledger(&mut self, sender: &Addr, msg: LedgerExecuteMsg) -> Result<Response, TxError> {
        let ledger = self.ledger_addr();
        let env = self.env(&ledger);
        let res = lotto_epoch_ledger::contract::execute(
            self.ledger.as_mut(),
            env,
            message_info(sender, &[]),
            msg,
        )?;
        self.dispatch(&ledger, &res.messages)?;
        Ok(res)
    }

    fn call_coordinator(
        &mut self,
        sender: &Addr,
        msg: CoordinatorExecuteMsg,
    ) -> Result<Response, TxError> {
        let coordinator = self.coordinator_addr();
        let env = self.env(&coordinator);
        let res = lotto_randomness_coordinator::contract::execute(
            self.coordinator.as_mut(),
            env,
            message_info(sender, &[]),
            msg,
        )?;
        self.dispatch(&coordinator, &res.messages)?;
        Ok(res)
    }

    /// Route messages emitted by `sender` to their target, in order.
    fn dispatch(&mut self, sender: &Addr, messages: &[SubMsg]) -> Result<(), TxError> {
        for sub in messages {
            let CosmosMsg::Wasm(WasmMsg::Execute {
                contract_addr, msg, ..
            }) = &sub.msg
            else {
                panic!("unexpected message {:?}", sub.msg);
            };

            if *contract_addr == self.addr("token").to_string() {
                match from_json(msg).unwrap() {
                    Cw20ExecuteMsg::TransferFrom {
                        owner,
                        recipient,
                        amount,
                    } => {
                        self.spend_allowance(&owner, sender.as_str(), amount.u128())?;
                        self.move_tokens(&owner, &recipient, amount.u128())?;
                    }
                    Cw20ExecuteMsg::Transfer { recipient, amount } => {
                        self.move_tokens(sender.as_str(), &recipient, amount.u128())?
                    }
                    other => panic!("unexpected cw20 message {:?}", other),
                }
            } else if *contract_addr == self.coordinator_addr().to_string() {
                self.call_coordinator(sender, from_json(msg).unwrap())?;
            } else if *contract_addr == self.ledger_addr().to_string() {
                self.call_ledger(sender, from_json(msg).unwrap())?;
            } else {
                panic!("message to unknown contract {contract_addr}");
            }
        }
        Ok(())
    }

    /// Deliver a chosen random value as if the coordinator had produced it.
    fn deliver_randomness(&mut self, request_id: u64, randomness: u128) -> Response {
        let coordinator = self.coordinator_addr();
        self.exec_ledger_as(
            &coordinator,
            LedgerExecuteMsg::ReceiveRandomness {
                request_id,
                randomness: Uint256::from(randomness),
            },
        )
        .unwrap()
    }

    fn buy(&mut self, name: &str, series: u8, number: u16) {
        self.exec_ledger(name, LedgerExecuteMsg::BuyTicket { series, number })
            .unwrap();
    }

    fn cash_out(&mut self, name: &str) -> Result<Response, TxError> {
        self.exec_ledger(name, LedgerExecuteMsg::CashOut {})
    }

    fn query_ledger<T: DeserializeOwned>(&self, msg: LedgerQueryMsg) -> T {
        let env = self.env(&self.ledger_addr());
        from_json(lotto_epoch_ledger::contract::query(self.ledger.as_ref(), env, msg).unwrap())
            .unwrap()
    }

    fn query_coordinator<T: DeserializeOwned>(&self, msg: CoordinatorQueryMsg) -> T {
        let env = self.env(&self.coordinator_addr());
        from_json(
            lotto_randomness_coordinator::contract::query(self.coordinator.as_ref(), env, msg)
                .unwrap(),
        )
        .unwrap()
    }

    fn ledger_state(&self) -> LedgerState {
        self.query_ledger(LedgerQueryMsg::LedgerState {})
    }

    fn held_ticket(&self, name: &str) -> Option<HeldTicket> {
        self.query_ledger(LedgerQueryMsg::HolderTicket {
            address: self.addr(name).to_string(),
        })
    }

    fn ticket_holder(&self, epoch: u64, series: u8, number: u16) -> Option<Addr> {
        self.query_ledger(LedgerQueryMsg::TicketHolder {
            epoch,
            series,
            number,
        })
    }
}

fn payout_of(res: &Response) -> u128 {
    res.attributes
        .iter()
        .find(|a| a.key == "payout")
        .map(|a| a.value.parse().unwrap())
        .unwrap()
}

/// Epoch 0 with a single `(1, 1)` ticket drawn against `(1, 735)`.
fn run_single_ticket_epoch(world: &mut World) {
    world.fund("zoe", TICKET_PRICE);
    world.buy("zoe", 1, 1);
    assert_eq!(world.custody(), TICKET_PRICE);
    assert_eq!(world.balance("zoe"), 0);

    world.advance(BUY_PERIOD_SECONDS);
    world
        .exec_ledger("keeper", LedgerExecuteMsg::OpenCashOutPeriod {})
        .unwrap();
    world.deliver_randomness(0, 3675);

    let drawn: Option<DrawnResult> =
        world.query_ledger(LedgerQueryMsg::DrawnResult { epoch: 0 });
    assert_eq!(
        drawn,
        Some(DrawnResult {
            series: 1,
            number: 735
        })
    );

    let res = world.cash_out("zoe").unwrap();
    assert_eq!(payout_of(&res), 0);
    assert!(res.messages.is_empty());
    assert_eq!(world.held_ticket("zoe"), None);
    assert_eq!(world.ticket_holder(0, 1, 1), None);
    assert_eq!(world.custody(), TICKET_PRICE);
}

// ─── Scenarios ───

#[test]
fn test_single_holder_no_match_then_clawback() {
    let mut world = World::new();
    run_single_ticket_epoch(&mut world);

    // The ticket is gone, a second redemption has nothing to redeem
    let err = world.cash_out("zoe").unwrap_err();
    assert!(matches!(err, TxError::Ledger(LedgerError::NoTicketHeld)));

    // Clawback waits for the full cash-out dwell
    world.advance(CASH_OUT_PERIOD_SECONDS - 1);
    let err = world
        .exec_ledger("admin", LedgerExecuteMsg::ClawBackRemainingFunds {})
        .unwrap_err();
    assert!(matches!(
        err,
        TxError::Ledger(LedgerError::PeriodNotElapsed { .. })
    ));

    world.advance(1);
    world
        .exec_ledger("admin", LedgerExecuteMsg::ClawBackRemainingFunds {})
        .unwrap();
    assert_eq!(world.balance("admin"), TICKET_PRICE);
    assert_eq!(world.custody(), 0);
    assert_eq!(
        world.ledger_state().total_clawed_back,
        Uint128::new(TICKET_PRICE)
    );
}

#[test]
fn test_four_holders_tiered_payouts() {
    let mut world = World::new();
    run_single_ticket_epoch(&mut world);

    world.advance(CASH_OUT_PERIOD_SECONDS);
    world
        .exec_ledger("keeper", LedgerExecuteMsg::OpenBuyPeriod {})
        .unwrap();
    assert_eq!(world.ledger_state().current_epoch, 1);

    for name in ["alice", "bob", "carol", "dave"] {
        world.fund(name, 2 * TICKET_PRICE);
    }
    world.buy("alice", 1, 1156);
    world.buy("bob", 2, 1156);
    world.buy("carol", 1, 156);
    world.buy("dave", 4, 348);
    assert_eq!(world.custody(), 50);

    world.advance(BUY_PERIOD_SECONDS);
    world
        .exec_ledger("keeper", LedgerExecuteMsg::OpenCashOutPeriod {})
        .unwrap();
    let pool: Uint128 = world.query_ledger(LedgerQueryMsg::PrizePool { epoch: 1 });
    assert_eq!(pool, Uint128::new(40));

    world.deliver_randomness(1, 5780);
    let drawn: Option<DrawnResult> =
        world.query_ledger(LedgerQueryMsg::DrawnResult { epoch: 1 });
    assert_eq!(
        drawn,
        Some(DrawnResult {
            series: 1,
            number: 1156
        })
    );

    // (holder, ticket, payout, house cut) in redemption order. Custody drops by
    // exactly each payout, plus the house share sent to the admin on the jackpot.
    let expected = [
        ("dave", (4u8, 348u16), 0u128, 0u128),
        ("bob", (2, 1156), 2, 0),
        ("carol", (1, 156), 1, 0),
        ("alice", (1, 1156), 35, 2),
    ];
    for (name, (series, number), payout, house) in expected {
        let custody_before = world.custody();
        let holder_before = world.balance(name);
        let admin_before = world.balance("admin");

        let res = world.cash_out(name).unwrap();
        assert_eq!(payout_of(&res), payout, "payout for {name}");
        assert_eq!(world.custody(), custody_before - payout - house);
        assert_eq!(world.balance(name), holder_before + payout);
        assert_eq!(world.balance("admin"), admin_before + house);

        // Both records are cleared whatever the tier
        assert_eq!(world.held_ticket(name), None);
        assert_eq!(world.ticket_holder(1, series, number), None);

        let err = world.cash_out(name).unwrap_err();
        assert!(matches!(err, TxError::Ledger(LedgerError::NoTicketHeld)));
    }
    assert_eq!(world.balance("admin"), 2);
    assert_eq!(world.custody(), 10);

    let record: Option<EpochRecord> = world.query_ledger(LedgerQueryMsg::Epoch { epoch: 1 });
    let record = record.unwrap();
    assert!(record.jackpot_claimed);
    assert!(record.house_share_paid);
    assert_eq!(record.house_share, Uint128::new(2));
    assert_eq!(record.paid_out, Uint128::new(38));
    assert_eq!(record.tickets_redeemed, 4);
    assert_eq!(world.ledger_state().state, LotteryState::Concluded);

    world.advance(CASH_OUT_PERIOD_SECONDS);
    world
        .exec_ledger("admin", LedgerExecuteMsg::ClawBackRemainingFunds {})
        .unwrap();
    assert_eq!(world.balance("admin"), 12);
    assert_eq!(world.custody(), 0);
    assert_eq!(world.ledger_state().total_clawed_back, Uint128::new(10));

    // The lottery carries on into epoch 2
    world
        .exec_ledger("keeper", LedgerExecuteMsg::OpenBuyPeriod {})
        .unwrap();
    world.buy("alice", 1, 1156);
    let state = world.ledger_state();
    assert_eq!(state.current_epoch, 2);
    assert_eq!(state.state, LotteryState::BuyPeriod);
    assert_eq!(state.total_fees_collected, Uint128::new(60));
    assert_eq!(state.total_paid_out, Uint128::new(38));
    assert_eq!(state.total_house_paid, Uint128::new(2));
}

#[test]
fn test_draw_through_randomness_coordinator() {
    let mut world = World::new();
    world.fund("alice", TICKET_PRICE);
    world.buy("alice", 3, 777);

    world.advance(BUY_PERIOD_SECONDS);
    world
        .exec_ledger("keeper", LedgerExecuteMsg::OpenCashOutPeriod {})
        .unwrap();

    let ledger = world.ledger_addr();
    let queued: Vec<QueuedRequest> =
        world.query_coordinator(CoordinatorQueryMsg::PendingForRound { round: TEST_ROUND });
    assert_eq!(
        queued,
        vec![QueuedRequest {
            consumer: ledger.clone(),
            request_id: 0
        }]
    );

    // Not drawn until the beacon lands
    let err = world.cash_out("alice").unwrap_err();
    assert!(matches!(
        err,
        TxError::Ledger(LedgerError::DrawNotResolved { epoch: 0 })
    ));

    world.advance(6);
    let operator = world.addr("operator");
    world
        .exec_coordinator(
            &operator,
            CoordinatorExecuteMsg::SubmitBeacon {
                round: TEST_ROUND,
                signature_hex: TEST_SIG_HEX.to_string(),
            },
        )
        .unwrap();

    let beacon = hex::decode(TEST_RANDOMNESS_HEX).unwrap();
    let randomness =
        lotto_randomness_coordinator::verify::derive_randomness(&beacon, &ledger, 0);
    let expected = lotto_epoch_ledger::draw::reduce_randomness(randomness);

    let drawn: Option<DrawnResult> =
        world.query_ledger(LedgerQueryMsg::DrawnResult { epoch: 0 });
    assert_eq!(drawn, Some(expected));

    let request: Option<RandomnessRequest> =
        world.query_coordinator(CoordinatorQueryMsg::Request {
            consumer: ledger.to_string(),
            request_id: 0,
        });
    assert_eq!(request.unwrap().randomness, Some(randomness));

    // Whatever the draw, redemption conserves the tokens
    let res = world.cash_out("alice").unwrap();
    let payout = payout_of(&res);
    assert!(payout <= TICKET_PRICE);
    assert_eq!(
        world.balance("alice") + world.custody() + world.balance("admin"),
        TICKET_PRICE
    );

    world.advance(CASH_OUT_PERIOD_SECONDS);
    world
        .exec_ledger("keeper", LedgerExecuteMsg::OpenBuyPeriod {})
        .unwrap();
    assert_eq!(world.ledger_state().state, LotteryState::BuyPeriod);
}

#[test]
fn test_failed_purchase_leaves_no_ticket() {
    let mut world = World::new();
    world.fund("alice", TICKET_PRICE);
    world.buy("alice", 2, 20);

    // Taken pair and out-of-range values are rejected before any transfer
    world.fund("bob", TICKET_PRICE);
    let err = world
        .exec_ledger(
            "bob",
            LedgerExecuteMsg::BuyTicket {
                series: 2,
                number: 20,
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TxError::Ledger(LedgerError::TicketAlreadyBought { .. })
    ));
    let err = world
        .exec_ledger(
            "bob",
            LedgerExecuteMsg::BuyTicket {
                series: 6,
                number: 20,
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TxError::Ledger(LedgerError::InvalidSeries { series: 6 })
    ));

    assert_eq!(world.balance("bob"), TICKET_PRICE);
    assert_eq!(world.held_ticket("bob"), None);
    assert_eq!(world.custody(), TICKET_PRICE);
    assert_eq!(world.ticket_holder(0, 2, 20), Some(world.addr("alice")));
}

/// The ledger records the ticket before the fee moves. When the token then
/// refuses the pull, the whole purchase is undone.
fn assert_purchase_reverted(world: &mut World, name: &str, series: u8, number: u16) {
    let fees_before = world.ledger_state().collected_fees;

    let err = world
        .exec_ledger(name, LedgerExecuteMsg::BuyTicket { series, number })
        .unwrap_err();
    assert!(matches!(err, TxError::Token(_)), "unexpected error {err:?}");

    assert_eq!(world.held_ticket(name), None);
    assert_eq!(world.ticket_holder(0, series, number), None);
    let state = world.ledger_state();
    assert_eq!(state.collected_fees, fees_before);
    assert_eq!(state.tickets_sold, 0);
    assert_eq!(world.custody(), 0);
}

#[test]
fn test_purchase_reverts_without_balance() {
    let mut world = World::new();
    world.approve("bob", TICKET_PRICE);
    assert_purchase_reverted(&mut world, "bob", 1, 1);
    assert_eq!(world.balance("bob"), 0);
}

#[test]
fn test_purchase_reverts_without_allowance() {
    let mut world = World::new();
    world.mint("carol", TICKET_PRICE);
    assert_purchase_reverted(&mut world, "carol", 1, 1);
    assert_eq!(world.balance("carol"), TICKET_PRICE);

    // Nothing was reserved: the same pair sells once the allowance is in place
    world.approve("carol", TICKET_PRICE);
    world.buy("carol", 1, 1);
    assert_eq!(world.ticket_holder(0, 1, 1), Some(world.addr("carol")));
    assert_eq!(world.custody(), TICKET_PRICE);
    assert_eq!(world.balance("carol"), 0);
}
