//! Cross-contract messages between a randomness consumer and its source.
//!
//! The consumer picks the `request_id`; the source echoes it back in exactly
//! one `ReceiveRandomness` callback. Sources namespace ids by consumer address.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{to_json_binary, Addr, CosmosMsg, StdResult, Uint256, WasmMsg};

/// Execute message accepted by a randomness source.
#[cw_serde]
pub enum RandomnessSourceMsg {
    RequestRandomness { request_id: u64 },
}

/// Execute message a randomness source delivers to the consumer.
#[cw_serde]
pub enum RandomnessConsumerMsg {
    ReceiveRandomness {
        request_id: u64,
        randomness: Uint256,
    },
}

impl RandomnessSourceMsg {
    pub fn into_cosmos_msg(self, source: &Addr) -> StdResult<CosmosMsg> {
        Ok(WasmMsg::Execute {
            contract_addr: source.to_string(),
            msg: to_json_binary(&self)?,
            funds: vec![],
        }
        .into())
    }
}

impl RandomnessConsumerMsg {
    pub fn into_cosmos_msg(self, consumer: &Addr) -> StdResult<CosmosMsg> {
        Ok(WasmMsg::Execute {
            contract_addr: consumer.to_string(),
            msg: to_json_binary(&self)?,
            funds: vec![],
        }
        .into())
    }
}
