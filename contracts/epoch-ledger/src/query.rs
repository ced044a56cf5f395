use cosmwasm_std::{to_json_binary, Binary, Deps, Order, StdResult, Uint128};
use cw_storage_plus::Bound;

use crate::execute::settle_ticket;
use crate::msg::{EpochHistoryResponse, PendingRandomnessEntry};
use crate::state::{
    CONFIG, EPOCHS, HOLDER_TICKETS, LEDGER_STATE, PENDING_RANDOMNESS, TICKET_HOLDERS,
};

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config)
}

pub fn query_ledger_state(deps: Deps) -> StdResult<Binary> {
    let ledger = LEDGER_STATE.load(deps.storage)?;
    to_json_binary(&ledger)
}

pub fn query_holder_ticket(deps: Deps, address: String) -> StdResult<Binary> {
    let addr = deps.api.addr_validate(&address)?;
    let ticket = HOLDER_TICKETS.may_load(deps.storage, &addr)?;
    to_json_binary(&ticket)
}

pub fn query_ticket_holder(deps: Deps, epoch: u64, series: u8, number: u16) -> StdResult<Binary> {
    let holder = TICKET_HOLDERS.may_load(deps.storage, (epoch, series, number))?;
    to_json_binary(&holder)
}

pub fn query_prize_pool(deps: Deps, epoch: u64) -> StdResult<Binary> {
    let pool = match EPOCHS.may_load(deps.storage, epoch)? {
        Some(record) => record.prize_pool,
        None => {
            let ledger = LEDGER_STATE.load(deps.storage)?;
            if epoch == ledger.current_epoch {
                ledger.collected_fees
            } else {
                Uint128::zero()
            }
        }
    };
    to_json_binary(&pool)
}

pub fn query_drawn_result(deps: Deps, epoch: u64) -> StdResult<Binary> {
    let drawn = EPOCHS
        .may_load(deps.storage, epoch)?
        .and_then(|record| record.drawn);
    to_json_binary(&drawn)
}

pub fn query_epoch(deps: Deps, epoch: u64) -> StdResult<Binary> {
    let record = EPOCHS.may_load(deps.storage, epoch)?;
    to_json_binary(&record)
}

pub fn query_epoch_history(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(20).min(100) as usize;
    let start = start_after.map(Bound::exclusive);

    let epochs: Vec<_> = EPOCHS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .filter_map(|r| r.ok())
        .map(|(_, record)| record)
        .collect();

    to_json_binary(&EpochHistoryResponse { epochs })
}

pub fn query_pending_randomness(deps: Deps) -> StdResult<Binary> {
    let pending: Vec<PendingRandomnessEntry> = PENDING_RANDOMNESS
        .range(deps.storage, None, None, Order::Ascending)
        .filter_map(|r| r.ok())
        .map(|(request_id, epoch)| PendingRandomnessEntry { request_id, epoch })
        .collect();
    to_json_binary(&pending)
}

/// `None` when the address holds no ticket or its draw is not in yet.
pub fn query_preview_cash_out(deps: Deps, address: String) -> StdResult<Binary> {
    let addr = deps.api.addr_validate(&address)?;
    let Some(ticket) = HOLDER_TICKETS.may_load(deps.storage, &addr)? else {
        return to_json_binary(&None::<()>);
    };

    let config = CONFIG.load(deps.storage)?;
    let ledger = LEDGER_STATE.load(deps.storage)?;
    let settlement = EPOCHS
        .may_load(deps.storage, ticket.epoch)?
        .filter(|_| ledger.state.is_cash_out())
        .and_then(|record| settle_ticket(&config, &ledger, &record, &ticket).ok());

    to_json_binary(&settlement)
}
