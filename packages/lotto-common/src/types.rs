use std::fmt;

use cosmwasm_schema::cw_serde;

/// Lowest valid ticket series.
pub const MIN_SERIES: u8 = 1;
/// Highest valid ticket series (five independent number pools).
pub const MAX_SERIES: u8 = 5;
/// Lowest number a ticket can carry.
pub const MIN_TICKET_NUMBER: u16 = 1;
/// Highest number a ticket can carry.
pub const MAX_TICKET_NUMBER: u16 = 2000;
/// Fixed decimal width used when comparing ticket and drawn numbers.
pub const NUMBER_DIGITS: u8 = 4;

/// Phase of the lottery. Global, not per epoch.
#[cw_serde]
#[derive(Copy)]
pub enum LotteryState {
    BuyPeriod,
    CashOutPeriod,
    /// Cash-out period in which the current epoch's jackpot has been claimed.
    Concluded,
}

impl LotteryState {
    /// Both `CashOutPeriod` and `Concluded` accept redemptions and closing transitions.
    pub fn is_cash_out(&self) -> bool {
        matches!(self, LotteryState::CashOutPeriod | LotteryState::Concluded)
    }
}

impl fmt::Display for LotteryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LotteryState::BuyPeriod => "buy_period",
            LotteryState::CashOutPeriod => "cash_out_period",
            LotteryState::Concluded => "concluded",
        };
        f.write_str(name)
    }
}

/// A ticket as chosen by its holder.
#[cw_serde]
#[derive(Copy)]
pub struct Ticket {
    pub series: u8,
    pub number: u16,
}

/// Winning pair of an epoch, derived from the randomness callback.
///
/// `number` lies in `[0, 2000)` while ticket numbers lie in `[1, 2000]`.
#[cw_serde]
#[derive(Copy)]
pub struct DrawnResult {
    pub series: u8,
    pub number: u16,
}
