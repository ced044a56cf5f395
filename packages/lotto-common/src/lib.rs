pub mod randomness;
pub mod types;

pub use randomness::{RandomnessConsumerMsg, RandomnessSourceMsg};
pub use types::{DrawnResult, LotteryState, Ticket};
