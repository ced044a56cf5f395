use cosmwasm_std::{
    entry_point, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult, Uint128,
};
use cw2::{get_contract_version, set_contract_version};
use lotto_common::LotteryState;

use crate::error::ContractError;
use crate::execute;
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg, UpdateConfigParams};
use crate::query;
use crate::state::{LedgerConfig, LedgerState, CONFIG, LEDGER_STATE};

const CONTRACT_NAME: &str = "crates.io:lotto-epoch-ledger";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[entry_point]
pub fn instantiate(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    if msg.ticket_price.is_zero() {
        return Err(ContractError::InvalidTicketPrice);
    }
    let tier_schedule = msg.tier_schedule.unwrap_or_default();
    tier_schedule.validate()?;

    let config = LedgerConfig {
        admin: info.sender.clone(),
        payment_token: deps.api.addr_validate(&msg.payment_token)?,
        randomness_source: deps.api.addr_validate(&msg.randomness_source)?,
        ticket_price: msg.ticket_price,
        tier_schedule,
    };
    CONFIG.save(deps.storage, &config)?;

    let ledger = LedgerState {
        state: LotteryState::BuyPeriod,
        current_epoch: 0,
        buy_period_start: env.block.time,
        cash_out_period_start: None,
        collected_fees: Uint128::zero(),
        tickets_sold: 0,
        next_request_id: 0,
        swept_through_epoch: None,
        total_fees_collected: Uint128::zero(),
        total_paid_out: Uint128::zero(),
        total_house_paid: Uint128::zero(),
        total_clawed_back: Uint128::zero(),
    };
    LEDGER_STATE.save(deps.storage, &ledger)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "epoch-ledger")
        .add_attribute("admin", info.sender.to_string())
        .add_attribute("ticket_price", config.ticket_price.to_string()))
}

#[entry_point]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::BuyTicket { series, number } => {
            execute::buy_ticket(deps, env, info, series, number)
        }
        ExecuteMsg::OpenCashOutPeriod {} => execute::open_cash_out_period(deps, env, info),
        ExecuteMsg::ReceiveRandomness {
            request_id,
            randomness,
        } => execute::receive_randomness(deps, env, info, request_id, randomness),
        ExecuteMsg::CashOut {} => execute::cash_out(deps, env, info),
        ExecuteMsg::OpenBuyPeriod {} => execute::open_buy_period(deps, env, info),
        ExecuteMsg::ClawBackRemainingFunds {} => {
            execute::claw_back_remaining_funds(deps, env, info)
        }
        ExecuteMsg::UpdateConfig {
            admin,
            randomness_source,
            tier_schedule,
        } => execute::update_config(
            deps,
            env,
            info,
            UpdateConfigParams {
                admin,
                randomness_source,
                tier_schedule,
            },
        ),
    }
}

#[entry_point]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query::query_config(deps),
        QueryMsg::LedgerState {} => query::query_ledger_state(deps),
        QueryMsg::HolderTicket { address } => query::query_holder_ticket(deps, address),
        QueryMsg::TicketHolder {
            epoch,
            series,
            number,
        } => query::query_ticket_holder(deps, epoch, series, number),
        QueryMsg::PrizePool { epoch } => query::query_prize_pool(deps, epoch),
        QueryMsg::DrawnResult { epoch } => query::query_drawn_result(deps, epoch),
        QueryMsg::Epoch { epoch } => query::query_epoch(deps, epoch),
        QueryMsg::EpochHistory { start_after, limit } => {
            query::query_epoch_history(deps, start_after, limit)
        }
        QueryMsg::PendingRandomness {} => query::query_pending_randomness(deps),
        QueryMsg::PreviewCashOut { address } => query::query_preview_cash_out(deps, address),
    }
}

#[entry_point]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::Unauthorized {
            reason: "Cannot migrate from different contract type".to_string(),
        });
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", stored.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}
