use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp, Uint256};
use cw_storage_plus::{Item, Map};

pub const CONFIG: Item<CoordinatorConfig> = Item::new("config");
pub const BEACONS: Map<u64, StoredBeacon> = Map::new("beacons");
pub const LATEST_ROUND: Item<u64> = Item::new("latest_round");
/// (consumer, request_id) -> request
pub const REQUESTS: Map<(&Addr, u64), RandomnessRequest> = Map::new("requests");
/// target round -> requests waiting for that beacon, in arrival order
pub const ROUND_QUEUE: Map<u64, Vec<QueuedRequest>> = Map::new("round_queue");

#[cw_serde]
pub struct CoordinatorConfig {
    pub admin: Addr,
    pub operators: Vec<Addr>,
    /// Quicknet public key, 96 bytes (G2 point)
    pub quicknet_pubkey: Vec<u8>,
    /// Chain hash identifying the drand network
    pub chain_hash: String,
    /// Genesis time of the drand network (unix seconds)
    pub genesis_time: u64,
    /// Period between rounds in seconds (3 for quicknet)
    pub period_seconds: u64,
    /// Rounds between the one current at request time and the one that answers it
    pub round_delay: u64,
}

#[cw_serde]
pub struct StoredBeacon {
    pub round: u64,
    /// sha256(signature), 32 bytes
    pub randomness: Vec<u8>,
    /// BLS signature on G1, 48 bytes
    pub signature: Vec<u8>,
    pub submitted_at: Timestamp,
    pub submitted_by: Addr,
}

#[cw_serde]
pub struct RandomnessRequest {
    pub consumer: Addr,
    pub request_id: u64,
    pub target_round: u64,
    pub requested_at: Timestamp,
    pub fulfilled_at: Option<Timestamp>,
    pub randomness: Option<Uint256>,
}

#[cw_serde]
pub struct QueuedRequest {
    pub consumer: Addr,
    pub request_id: u64,
}
