use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};
use lotto_common::{DrawnResult, LotteryState};

use crate::tiers::TierSchedule;

/// 7 days: minimum length of a Buy Period.
pub const BUY_PERIOD_SECONDS: u64 = 7 * 24 * 60 * 60;
/// 2 days: minimum length of a Cash-Out Period, also the clawback delay.
pub const CASH_OUT_PERIOD_SECONDS: u64 = 2 * 24 * 60 * 60;

pub const CONFIG: Item<LedgerConfig> = Item::new("config");
pub const LEDGER_STATE: Item<LedgerState> = Item::new("ledger_state");
/// Created when an epoch's Cash-Out Period opens.
pub const EPOCHS: Map<u64, EpochRecord> = Map::new("epochs");
/// holder -> outstanding ticket. At most one per holder across all epochs.
pub const HOLDER_TICKETS: Map<&Addr, HeldTicket> = Map::new("holder_tickets");
/// (epoch, series, number) -> holder
pub const TICKET_HOLDERS: Map<(u64, u8, u16), Addr> = Map::new("ticket_holders");
/// request_id -> epoch awaiting randomness
pub const PENDING_RANDOMNESS: Map<u64, u64> = Map::new("pending_randomness");

#[cw_serde]
pub struct LedgerConfig {
    pub admin: Addr,
    /// CW20 token used for entry fees and payouts
    pub payment_token: Addr,
    pub randomness_source: Addr,
    pub ticket_price: Uint128,
    pub tier_schedule: TierSchedule,
}

#[cw_serde]
pub struct LedgerState {
    pub state: LotteryState,
    pub current_epoch: u64,
    pub buy_period_start: Timestamp,
    pub cash_out_period_start: Option<Timestamp>,
    /// Fees collected during the open Buy Period
    pub collected_fees: Uint128,
    pub tickets_sold: u32,
    pub next_request_id: u64,
    /// Every epoch up to and including this one has been swept by a clawback.
    pub swept_through_epoch: Option<u64>,
    pub total_fees_collected: Uint128,
    pub total_paid_out: Uint128,
    /// House shares sent to the admin on jackpot claims.
    pub total_house_paid: Uint128,
    pub total_clawed_back: Uint128,
}

impl LedgerState {
    pub fn is_swept(&self, epoch: u64) -> bool {
        self.swept_through_epoch.is_some_and(|swept| epoch <= swept)
    }
}

#[cw_serde]
pub struct EpochRecord {
    pub epoch: u64,
    /// Fees collected during the epoch's Buy Period, frozen at cash-out open.
    pub prize_pool: Uint128,
    /// Part of `prize_pool` withheld from redemptions.
    pub house_share: Uint128,
    pub paid_out: Uint128,
    pub tickets_sold: u32,
    pub tickets_redeemed: u32,
    pub randomness_request_id: u64,
    pub cash_out_started_at: Timestamp,
    pub drawn: Option<DrawnResult>,
    pub jackpot_claimed: bool,
    /// Set once `house_share` has gone to the admin with the jackpot claim.
    pub house_share_paid: bool,
}

impl EpochRecord {
    /// What redemptions of this epoch may still pay out in total.
    pub fn redeemable(&self) -> Uint128 {
        self.prize_pool
            .saturating_sub(self.house_share)
            .saturating_sub(self.paid_out)
    }
}

#[cw_serde]
pub struct HeldTicket {
    pub epoch: u64,
    pub series: u8,
    pub number: u16,
}
