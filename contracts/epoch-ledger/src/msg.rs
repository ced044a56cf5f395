use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Uint128, Uint256};
use lotto_common::DrawnResult;

use crate::state::{EpochRecord, HeldTicket, LedgerConfig, LedgerState};
use crate::tiers::{Settlement, TierSchedule};

#[cw_serde]
pub struct InstantiateMsg {
    /// CW20 token contract used for fees and payouts
    pub payment_token: String,
    pub randomness_source: String,
    /// Entry fee per ticket, in payment token base units
    pub ticket_price: Uint128,
    /// Defaults to `TierSchedule::default()`
    pub tier_schedule: Option<TierSchedule>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Buy `(series, number)` for the current epoch. Requires a CW20 allowance
    /// of at least the ticket price for this contract.
    BuyTicket { series: u8, number: u16 },
    /// Close the Buy Period and request randomness. Anyone, after 7 days.
    OpenCashOutPeriod {},
    /// Randomness callback. Randomness source only.
    ReceiveRandomness {
        request_id: u64,
        randomness: Uint256,
    },
    /// Redeem the caller's ticket.
    CashOut {},
    /// Start the next epoch. Anyone, 2 days after the Cash-Out Period opened.
    OpenBuyPeriod {},
    /// Sweep the whole custody balance to the admin. Admin only.
    ClawBackRemainingFunds {},
    /// Admin only. Source and schedule changes are limited to the Buy Period.
    UpdateConfig {
        admin: Option<String>,
        randomness_source: Option<String>,
        tier_schedule: Option<TierSchedule>,
    },
}

#[cw_serde]
pub struct MigrateMsg {}

/// Grouped `UpdateConfig` fields.
pub struct UpdateConfigParams {
    pub admin: Option<String>,
    pub randomness_source: Option<String>,
    pub tier_schedule: Option<TierSchedule>,
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(LedgerConfig)]
    Config {},
    #[returns(LedgerState)]
    LedgerState {},
    #[returns(Option<HeldTicket>)]
    HolderTicket { address: String },
    #[returns(Option<Addr>)]
    TicketHolder { epoch: u64, series: u8, number: u16 },
    /// Frozen pool of a past epoch, or the running fee total of the open Buy Period.
    #[returns(Uint128)]
    PrizePool { epoch: u64 },
    #[returns(Option<DrawnResult>)]
    DrawnResult { epoch: u64 },
    #[returns(Option<EpochRecord>)]
    Epoch { epoch: u64 },
    #[returns(EpochHistoryResponse)]
    EpochHistory {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(Vec<PendingRandomnessEntry>)]
    PendingRandomness {},
    /// What `CashOut` would pay the address right now, if anything is redeemable.
    #[returns(Option<Settlement>)]
    PreviewCashOut { address: String },
}

#[cw_serde]
pub struct EpochHistoryResponse {
    pub epochs: Vec<EpochRecord>,
}

#[cw_serde]
pub struct PendingRandomnessEntry {
    pub request_id: u64,
    pub epoch: u64,
}
