use cosmwasm_std::{OverflowError, StdError};
use lotto_common::LotteryState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("invalid series {series}: must be between 1 and 5")]
    InvalidSeries { series: u8 },

    #[error("invalid ticket number {number}: must be between 1 and 2000")]
    InvalidTicketNumber { number: u16 },

    #[error("caller already holds a ticket")]
    TicketAlreadyOwned,

    #[error("ticket {series}/{number} already bought in epoch {epoch}")]
    TicketAlreadyBought { epoch: u64, series: u8, number: u16 },

    #[error("caller doesn't hold a ticket")]
    NoTicketHeld,

    #[error("time period of the {period} period hasn't passed yet (ready at {ready_at})")]
    PeriodNotElapsed { period: String, ready_at: u64 },

    #[error("operation requires {expected}, lottery is in {actual}")]
    WrongState {
        expected: String,
        actual: LotteryState,
    },

    #[error("draw for epoch {epoch} has not been resolved")]
    DrawNotResolved { epoch: u64 },

    #[error("no randomness request {request_id} was ever issued")]
    UnknownRandomnessRequest { request_id: u64 },

    #[error("ticket price must be greater than zero")]
    InvalidTicketPrice,

    #[error("invalid tier schedule: {reason}")]
    InvalidTierSchedule { reason: String },
}
