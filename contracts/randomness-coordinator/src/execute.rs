use cosmwasm_std::{CosmosMsg, DepsMut, Env, Event, MessageInfo, Response, StdResult, Timestamp};
use lotto_common::RandomnessConsumerMsg;

use crate::error::ContractError;
use crate::state::{
    QueuedRequest, RandomnessRequest, StoredBeacon, BEACONS, CONFIG, LATEST_ROUND, REQUESTS,
    ROUND_QUEUE,
};
use crate::verify::{derive_randomness, round_at, verify_quicknet_beacon};

/// Register a randomness request from the calling contract.
///
/// The request is answered by the beacon `round_delay` rounds after the one
/// current at block time. If that beacon is already stored the callback goes
/// out in this transaction.
pub fn request_randomness(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    request_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let consumer = info.sender;

    if REQUESTS.has(deps.storage, (&consumer, request_id)) {
        return Err(ContractError::DuplicateRequest {
            consumer,
            request_id,
        });
    }

    let current_round = round_at(
        config.genesis_time,
        config.period_seconds,
        env.block.time.seconds(),
    );
    let target_round = current_round + config.round_delay;

    let mut request = RandomnessRequest {
        consumer: consumer.clone(),
        request_id,
        target_round,
        requested_at: env.block.time,
        fulfilled_at: None,
        randomness: None,
    };

    let mut response = Response::new()
        .add_attribute("action", "request_randomness")
        .add_attribute("consumer", consumer.to_string())
        .add_attribute("request_id", request_id.to_string())
        .add_attribute("target_round", target_round.to_string());

    match BEACONS.may_load(deps.storage, target_round)? {
        Some(beacon) => {
            let (callback, event) = fulfill(&mut request, &beacon, env.block.time)?;
            response = response.add_message(callback).add_event(event);
        }
        None => {
            ROUND_QUEUE.update(deps.storage, target_round, |queued| -> StdResult<_> {
                let mut queued = queued.unwrap_or_default();
                queued.push(QueuedRequest {
                    consumer: consumer.clone(),
                    request_id,
                });
                Ok(queued)
            })?;
            response = response.add_event(
                Event::new("lotto_randomness_requested")
                    .add_attribute("consumer", consumer.to_string())
                    .add_attribute("request_id", request_id.to_string())
                    .add_attribute("target_round", target_round.to_string()),
            );
        }
    }

    REQUESTS.save(deps.storage, (&consumer, request_id), &request)?;

    Ok(response)
}

/// Submit a drand beacon. Only operators can call this.
/// The beacon is BLS-verified with drand-verify, then every request queued on
/// its round is answered.
pub fn submit_beacon(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    round: u64,
    signature_hex: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    if !config.operators.contains(&info.sender) {
        return Err(ContractError::Unauthorized {
            reason: "only operators can submit beacons".to_string(),
        });
    }

    if BEACONS.has(deps.storage, round) {
        return Err(ContractError::BeaconAlreadyExists { round });
    }

    let signature = hex::decode(&signature_hex).map_err(|_| ContractError::InvalidHex {
        field: "signature_hex".to_string(),
    })?;

    let randomness = verify_quicknet_beacon(&config.quicknet_pubkey, round, &signature)
        .map_err(|e| ContractError::VerificationFailed {
            reason: e.to_string(),
        })?;

    let beacon = StoredBeacon {
        round,
        randomness: randomness.to_vec(),
        signature,
        submitted_at: env.block.time,
        submitted_by: info.sender.clone(),
    };
    BEACONS.save(deps.storage, round, &beacon)?;

    let current_latest = LATEST_ROUND.may_load(deps.storage)?.unwrap_or(0);
    if round > current_latest {
        LATEST_ROUND.save(deps.storage, &round)?;
    }

    let queued = ROUND_QUEUE
        .may_load(deps.storage, round)?
        .unwrap_or_default();
    ROUND_QUEUE.remove(deps.storage, round);

    let mut callbacks = Vec::with_capacity(queued.len());
    let mut events = Vec::with_capacity(queued.len());
    for key in &queued {
        let mut request = REQUESTS.load(deps.storage, (&key.consumer, key.request_id))?;
        let (callback, event) = fulfill(&mut request, &beacon, env.block.time)?;
        REQUESTS.save(deps.storage, (&key.consumer, key.request_id), &request)?;
        callbacks.push(callback);
        events.push(event);
    }

    Ok(Response::new()
        .add_messages(callbacks)
        .add_attribute("action", "submit_beacon")
        .add_attribute("round", round.to_string())
        .add_attribute("submitted_by", info.sender.to_string())
        .add_attribute("fulfilled", queued.len().to_string())
        .add_event(
            Event::new("lotto_beacon_submitted")
                .add_attribute("round", round.to_string())
                .add_attribute("randomness", hex::encode(randomness))
                .add_attribute("submitted_by", info.sender.to_string())
                .add_attribute("timestamp", env.block.time.seconds().to_string()),
        )
        .add_events(events))
}

fn fulfill(
    request: &mut RandomnessRequest,
    beacon: &StoredBeacon,
    now: Timestamp,
) -> Result<(CosmosMsg, Event), ContractError> {
    let randomness = derive_randomness(&beacon.randomness, &request.consumer, request.request_id);
    request.fulfilled_at = Some(now);
    request.randomness = Some(randomness);

    let callback = RandomnessConsumerMsg::ReceiveRandomness {
        request_id: request.request_id,
        randomness,
    }
    .into_cosmos_msg(&request.consumer)?;

    let event = Event::new("lotto_randomness_fulfilled")
        .add_attribute("consumer", request.consumer.to_string())
        .add_attribute("request_id", request.request_id.to_string())
        .add_attribute("round", beacon.round.to_string());

    Ok((callback, event))
}

/// Update the operator list. Admin only.
pub fn update_operators(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    add: Vec<String>,
    remove: Vec<String>,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;

    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can update operators".to_string(),
        });
    }

    for addr_str in &remove {
        let addr = deps.api.addr_validate(addr_str)?;
        config.operators.retain(|a| *a != addr);
    }

    for addr_str in &add {
        let addr = deps.api.addr_validate(addr_str)?;
        if !config.operators.contains(&addr) {
            config.operators.push(addr);
        }
    }

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_operators")
        .add_attribute("added", add.join(","))
        .add_attribute("removed", remove.join(",")))
}
