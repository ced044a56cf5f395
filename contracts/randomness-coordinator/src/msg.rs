use cosmwasm_schema::{cw_serde, QueryResponses};

use crate::state::{CoordinatorConfig, QueuedRequest, RandomnessRequest, StoredBeacon};

#[cw_serde]
pub struct InstantiateMsg {
    pub operators: Vec<String>,
    /// Hex-encoded quicknet public key (96 bytes = 192 hex chars)
    pub quicknet_pubkey_hex: String,
    pub chain_hash: String,
    pub genesis_time: u64,
    pub period_seconds: u64,
    /// Must be at least 1 so the answering beacon is not yet public.
    pub round_delay: u64,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Ask for one random value. The sender gets exactly one
    /// `ReceiveRandomness { request_id, randomness }` callback.
    RequestRandomness { request_id: u64 },
    /// Submit a drand beacon for verification and storage. Fulfils every
    /// request queued on that round.
    SubmitBeacon {
        round: u64,
        /// Hex-encoded BLS signature (48 bytes = 96 hex chars)
        signature_hex: String,
    },
    /// Update operator list (admin only).
    UpdateOperators {
        add: Vec<String>,
        remove: Vec<String>,
    },
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(CoordinatorConfig)]
    Config {},

    #[returns(Option<StoredBeacon>)]
    Beacon { round: u64 },

    #[returns(u64)]
    LatestRound {},

    #[returns(Option<RandomnessRequest>)]
    Request { consumer: String, request_id: u64 },

    #[returns(Vec<QueuedRequest>)]
    PendingForRound { round: u64 },
}
