use cosmwasm_std::{
    to_json_binary, Addr, CosmosMsg, DepsMut, Env, Event, MessageInfo, Response, StdError,
    Timestamp, Uint128, Uint256, WasmMsg,
};
use cw20::{BalanceResponse, Cw20ExecuteMsg, Cw20QueryMsg};
use lotto_common::types::{MAX_SERIES, MAX_TICKET_NUMBER, MIN_SERIES, MIN_TICKET_NUMBER};
use lotto_common::{LotteryState, RandomnessSourceMsg, Ticket};

use crate::draw::reduce_randomness;
use crate::error::ContractError;
use crate::msg::UpdateConfigParams;
use crate::state::{
    EpochRecord, HeldTicket, LedgerConfig, LedgerState, BUY_PERIOD_SECONDS,
    CASH_OUT_PERIOD_SECONDS, CONFIG, EPOCHS, HOLDER_TICKETS, LEDGER_STATE, PENDING_RANDOMNESS,
    TICKET_HOLDERS,
};
use crate::tiers::{settle, PayoutContext, PrizeTier, Settlement, TierPolicy};

/// Buy a ticket for the current epoch.
///
/// Ledger writes happen here; the CW20 `TransferFrom` runs afterwards as a
/// message. If the token rejects it, the chain reverts the whole transaction.
pub fn buy_ticket(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    series: u8,
    number: u16,
) -> Result<Response, ContractError> {
    let mut ledger = LEDGER_STATE.load(deps.storage)?;
    if ledger.state != LotteryState::BuyPeriod {
        return Err(ContractError::WrongState {
            expected: LotteryState::BuyPeriod.to_string(),
            actual: ledger.state,
        });
    }

    if !(MIN_SERIES..=MAX_SERIES).contains(&series) {
        return Err(ContractError::InvalidSeries { series });
    }
    if !(MIN_TICKET_NUMBER..=MAX_TICKET_NUMBER).contains(&number) {
        return Err(ContractError::InvalidTicketNumber { number });
    }

    if HOLDER_TICKETS.has(deps.storage, &info.sender) {
        return Err(ContractError::TicketAlreadyOwned);
    }

    let epoch = ledger.current_epoch;
    if TICKET_HOLDERS.has(deps.storage, (epoch, series, number)) {
        return Err(ContractError::TicketAlreadyBought {
            epoch,
            series,
            number,
        });
    }

    let config = CONFIG.load(deps.storage)?;

    HOLDER_TICKETS.save(
        deps.storage,
        &info.sender,
        &HeldTicket {
            epoch,
            series,
            number,
        },
    )?;
    TICKET_HOLDERS.save(deps.storage, (epoch, series, number), &info.sender)?;

    ledger.collected_fees = ledger.collected_fees.checked_add(config.ticket_price)?;
    ledger.total_fees_collected = ledger
        .total_fees_collected
        .checked_add(config.ticket_price)?;
    ledger.tickets_sold += 1;
    LEDGER_STATE.save(deps.storage, &ledger)?;

    let pull_fee = WasmMsg::Execute {
        contract_addr: config.payment_token.to_string(),
        msg: to_json_binary(&Cw20ExecuteMsg::TransferFrom {
            owner: info.sender.to_string(),
            recipient: env.contract.address.to_string(),
            amount: config.ticket_price,
        })?,
        funds: vec![],
    };

    Ok(Response::new()
        .add_message(pull_fee)
        .add_attribute("action", "buy_ticket")
        .add_attribute("holder", info.sender.to_string())
        .add_attribute("epoch", epoch.to_string())
        .add_attribute("series", series.to_string())
        .add_attribute("number", number.to_string())
        .add_event(
            Event::new("lotto_ticket_bought")
                .add_attribute("holder", info.sender.to_string())
                .add_attribute("epoch", epoch.to_string())
                .add_attribute("series", series.to_string())
                .add_attribute("number", number.to_string())
                .add_attribute("fee", config.ticket_price.to_string())
                .add_attribute("collected_fees", ledger.collected_fees.to_string()),
        ))
}

/// Close the Buy Period: freeze the prize pool and request randomness.
pub fn open_cash_out_period(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let mut ledger = LEDGER_STATE.load(deps.storage)?;
    if ledger.state != LotteryState::BuyPeriod {
        return Err(ContractError::WrongState {
            expected: LotteryState::BuyPeriod.to_string(),
            actual: ledger.state,
        });
    }
    ensure_elapsed(ledger.buy_period_start, BUY_PERIOD_SECONDS, "buy", env.block.time)?;

    let epoch = ledger.current_epoch;
    let request_id = ledger.next_request_id;
    let prize_pool = ledger.collected_fees;
    let record = EpochRecord {
        epoch,
        prize_pool,
        house_share: config.tier_schedule.house_share(prize_pool),
        paid_out: Uint128::zero(),
        tickets_sold: ledger.tickets_sold,
        tickets_redeemed: 0,
        randomness_request_id: request_id,
        cash_out_started_at: env.block.time,
        drawn: None,
        jackpot_claimed: false,
        house_share_paid: false,
    };
    EPOCHS.save(deps.storage, epoch, &record)?;
    PENDING_RANDOMNESS.save(deps.storage, request_id, &epoch)?;

    ledger.next_request_id += 1;
    ledger.state = LotteryState::CashOutPeriod;
    ledger.cash_out_period_start = Some(env.block.time);
    ledger.collected_fees = Uint128::zero();
    ledger.tickets_sold = 0;
    LEDGER_STATE.save(deps.storage, &ledger)?;

    let request_msg = RandomnessSourceMsg::RequestRandomness { request_id }
        .into_cosmos_msg(&config.randomness_source)?;

    Ok(Response::new()
        .add_message(request_msg)
        .add_attribute("action", "open_cash_out_period")
        .add_attribute("epoch", epoch.to_string())
        .add_attribute("request_id", request_id.to_string())
        .add_event(
            Event::new("lotto_cash_out_opened")
                .add_attribute("epoch", epoch.to_string())
                .add_attribute("prize_pool", prize_pool.to_string())
                .add_attribute("house_share", record.house_share.to_string())
                .add_attribute("tickets_sold", record.tickets_sold.to_string())
                .add_attribute("request_id", request_id.to_string())
                .add_attribute("timestamp", env.block.time.seconds().to_string()),
        ))
}

/// Randomness callback. Duplicate deliveries are a successful no-op.
pub fn receive_randomness(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    request_id: u64,
    randomness: Uint256,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.randomness_source {
        return Err(ContractError::Unauthorized {
            reason: "only the randomness source can deliver randomness".to_string(),
        });
    }

    let ledger = LEDGER_STATE.load(deps.storage)?;
    let Some(epoch) = PENDING_RANDOMNESS.may_load(deps.storage, request_id)? else {
        if request_id < ledger.next_request_id {
            return Ok(ignored_randomness(request_id, "duplicate"));
        }
        return Err(ContractError::UnknownRandomnessRequest { request_id });
    };
    PENDING_RANDOMNESS.remove(deps.storage, request_id);

    // The draw may only land on the current epoch while it is cashing out.
    if epoch != ledger.current_epoch || !ledger.state.is_cash_out() {
        return Ok(ignored_randomness(request_id, "stale"));
    }

    let mut record = EPOCHS.load(deps.storage, epoch)?;
    if record.drawn.is_some() {
        return Ok(ignored_randomness(request_id, "duplicate"));
    }

    let drawn = reduce_randomness(randomness);
    record.drawn = Some(drawn);
    EPOCHS.save(deps.storage, epoch, &record)?;

    Ok(Response::new()
        .add_attribute("action", "receive_randomness")
        .add_attribute("request_id", request_id.to_string())
        .add_attribute("outcome", "resolved")
        .add_event(
            Event::new("lotto_draw_resolved")
                .add_attribute("epoch", epoch.to_string())
                .add_attribute("request_id", request_id.to_string())
                .add_attribute("randomness", randomness.to_string())
                .add_attribute("winning_series", drawn.series.to_string())
                .add_attribute("winning_number", drawn.number.to_string())
                .add_attribute("timestamp", env.block.time.seconds().to_string()),
        ))
}

fn ignored_randomness(request_id: u64, outcome: &str) -> Response {
    Response::new()
        .add_attribute("action", "receive_randomness")
        .add_attribute("request_id", request_id.to_string())
        .add_attribute("outcome", outcome)
}

/// Redeem the caller's ticket. The ticket is cleared whatever it pays.
pub fn cash_out(deps: DepsMut, env: Env, info: MessageInfo) -> Result<Response, ContractError> {
    let ticket = HOLDER_TICKETS
        .may_load(deps.storage, &info.sender)?
        .ok_or(ContractError::NoTicketHeld)?;

    let mut ledger = LEDGER_STATE.load(deps.storage)?;
    if !ledger.state.is_cash_out() {
        return Err(ContractError::WrongState {
            expected: LotteryState::CashOutPeriod.to_string(),
            actual: ledger.state,
        });
    }

    let config = CONFIG.load(deps.storage)?;
    let mut record = EPOCHS
        .may_load(deps.storage, ticket.epoch)?
        .ok_or(ContractError::DrawNotResolved {
            epoch: ticket.epoch,
        })?;
    let settlement = settle_ticket(&config, &ledger, &record, &ticket)?;

    HOLDER_TICKETS.remove(deps.storage, &info.sender);
    TICKET_HOLDERS.remove(deps.storage, (ticket.epoch, ticket.series, ticket.number));

    record.tickets_redeemed += 1;
    record.paid_out = record.paid_out.checked_add(settlement.amount)?;
    let mut house_payment = Uint128::zero();
    if settlement.jackpot {
        record.jackpot_claimed = true;
        if config.tier_schedule.house_share_paid_on_jackpot && !record.house_share_paid {
            record.house_share_paid = true;
            house_payment = record.house_share;
        }
        if ticket.epoch == ledger.current_epoch {
            ledger.state = LotteryState::Concluded;
        }
    }
    EPOCHS.save(deps.storage, ticket.epoch, &record)?;

    ledger.total_paid_out = ledger.total_paid_out.checked_add(settlement.amount)?;
    ledger.total_house_paid = ledger.total_house_paid.checked_add(house_payment)?;
    LEDGER_STATE.save(deps.storage, &ledger)?;

    let mut response = Response::new();
    if !settlement.amount.is_zero() {
        response = response.add_message(token_transfer_msg(
            &config.payment_token,
            &info.sender,
            settlement.amount,
        )?);
    }
    if !house_payment.is_zero() {
        response = response.add_message(token_transfer_msg(
            &config.payment_token,
            &config.admin,
            house_payment,
        )?);
    }

    let tier = tier_label(settlement.tier.as_ref());
    Ok(response
        .add_attribute("action", "cash_out")
        .add_attribute("holder", info.sender.to_string())
        .add_attribute("epoch", ticket.epoch.to_string())
        .add_attribute("payout", settlement.amount.to_string())
        .add_event(
            Event::new("lotto_cash_out")
                .add_attribute("holder", info.sender.to_string())
                .add_attribute("epoch", ticket.epoch.to_string())
                .add_attribute("series", ticket.series.to_string())
                .add_attribute("number", ticket.number.to_string())
                .add_attribute("matching_digits", settlement.matching_digits.to_string())
                .add_attribute("series_matches", settlement.series_matches.to_string())
                .add_attribute("tier", tier)
                .add_attribute("payout", settlement.amount.to_string())
                .add_attribute("jackpot", settlement.jackpot.to_string())
                .add_attribute("house_payment", house_payment.to_string())
                .add_attribute("timestamp", env.block.time.seconds().to_string()),
        ))
}

/// Settle a held ticket against its epoch. Tickets of swept epochs settle at zero.
pub fn settle_ticket(
    config: &LedgerConfig,
    ledger: &LedgerState,
    record: &EpochRecord,
    ticket: &HeldTicket,
) -> Result<Settlement, ContractError> {
    let Some(drawn) = record.drawn else {
        // A clawback also releases tickets whose draw never arrived.
        if ledger.is_swept(record.epoch) {
            return Ok(Settlement {
                matching_digits: 0,
                series_matches: false,
                tier: None,
                jackpot: false,
                amount: Uint128::zero(),
            });
        }
        return Err(ContractError::DrawNotResolved {
            epoch: record.epoch,
        });
    };
    let ctx = PayoutContext {
        ticket_price: config.ticket_price,
        prize_pool: record.prize_pool,
        redeemable: record.redeemable(),
    };
    let held = Ticket {
        series: ticket.series,
        number: ticket.number,
    };

    let mut settlement = settle(
        &config.tier_schedule,
        &held,
        &drawn,
        &ctx,
        !record.jackpot_claimed,
    );
    if ledger.is_swept(record.epoch) {
        settlement.jackpot = false;
        settlement.amount = Uint128::zero();
    }
    Ok(settlement)
}

fn tier_label(tier: Option<&PrizeTier>) -> String {
    match tier {
        None => "none".to_string(),
        Some(tier) if tier.is_jackpot() => "jackpot".to_string(),
        Some(tier) if tier.series_must_match => {
            format!("{}_digits_same_series", tier.matching_digits)
        }
        Some(tier) => format!("{}_digits", tier.matching_digits),
    }
}

/// Start the next epoch's Buy Period.
pub fn open_buy_period(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
) -> Result<Response, ContractError> {
    let mut ledger = LEDGER_STATE.load(deps.storage)?;
    let started = cash_out_started(&ledger)?;
    ensure_elapsed(started, CASH_OUT_PERIOD_SECONDS, "cash-out", env.block.time)?;

    // A draw still pending for the closed epoch is dropped when it lands.
    let closed_epoch = ledger.current_epoch;
    let record = EPOCHS.load(deps.storage, closed_epoch)?;

    ledger.current_epoch += 1;
    ledger.state = LotteryState::BuyPeriod;
    ledger.buy_period_start = env.block.time;
    ledger.cash_out_period_start = None;
    LEDGER_STATE.save(deps.storage, &ledger)?;

    Ok(Response::new()
        .add_attribute("action", "open_buy_period")
        .add_attribute("epoch", ledger.current_epoch.to_string())
        .add_event(
            Event::new("lotto_buy_opened")
                .add_attribute("closed_epoch", closed_epoch.to_string())
                .add_attribute("epoch", ledger.current_epoch.to_string())
                .add_attribute(
                    "unredeemed_tickets",
                    (record.tickets_sold - record.tickets_redeemed).to_string(),
                )
                .add_attribute("drawn", record.drawn.is_some().to_string())
                .add_attribute("timestamp", env.block.time.seconds().to_string()),
        ))
}

/// Sweep everything the ledger holds to the admin. Admin only.
///
/// The whole CW20 balance is swept regardless of which epoch the funds came
/// from, and every epoch up to the current one stops paying out.
pub fn claw_back_remaining_funds(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can claw back funds".to_string(),
        });
    }

    let mut ledger = LEDGER_STATE.load(deps.storage)?;
    let started = cash_out_started(&ledger)?;
    ensure_elapsed(started, CASH_OUT_PERIOD_SECONDS, "cash-out", env.block.time)?;

    let custody: BalanceResponse = deps.querier.query_wasm_smart(
        config.payment_token.to_string(),
        &Cw20QueryMsg::Balance {
            address: env.contract.address.to_string(),
        },
    )?;
    let amount = custody.balance;

    ledger.swept_through_epoch = Some(ledger.current_epoch);
    ledger.total_clawed_back = ledger.total_clawed_back.checked_add(amount)?;
    LEDGER_STATE.save(deps.storage, &ledger)?;

    let mut response = Response::new();
    if !amount.is_zero() {
        response =
            response.add_message(token_transfer_msg(&config.payment_token, &config.admin, amount)?);
    }

    Ok(response
        .add_attribute("action", "claw_back_remaining_funds")
        .add_attribute("amount", amount.to_string())
        .add_event(
            Event::new("lotto_clawback")
                .add_attribute("admin", config.admin.to_string())
                .add_attribute("epoch", ledger.current_epoch.to_string())
                .add_attribute("amount", amount.to_string())
                .add_attribute("timestamp", env.block.time.seconds().to_string()),
        ))
}

/// Update configuration. Admin only.
pub fn update_config(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    params: UpdateConfigParams,
) -> Result<Response, ContractError> {
    let UpdateConfigParams {
        admin,
        randomness_source,
        tier_schedule,
    } = params;

    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can update config".to_string(),
        });
    }

    // A pending request must be answered by the source it was sent to, and
    // frozen pools keep the schedule they were frozen with.
    if randomness_source.is_some() || tier_schedule.is_some() {
        let ledger = LEDGER_STATE.load(deps.storage)?;
        if ledger.state != LotteryState::BuyPeriod {
            return Err(ContractError::WrongState {
                expected: LotteryState::BuyPeriod.to_string(),
                actual: ledger.state,
            });
        }
    }

    if let Some(admin) = admin {
        config.admin = deps.api.addr_validate(&admin)?;
    }
    if let Some(source) = randomness_source {
        config.randomness_source = deps.api.addr_validate(&source)?;
    }
    if let Some(schedule) = tier_schedule {
        schedule.validate()?;
        config.tier_schedule = schedule;
    }

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_config")
        .add_event(
            Event::new("lotto_config_updated")
                .add_attribute("admin", config.admin.to_string())
                .add_attribute("randomness_source", config.randomness_source.to_string()),
        ))
}

fn cash_out_started(ledger: &LedgerState) -> Result<Timestamp, ContractError> {
    if !ledger.state.is_cash_out() {
        return Err(ContractError::WrongState {
            expected: LotteryState::CashOutPeriod.to_string(),
            actual: ledger.state,
        });
    }
    ledger.cash_out_period_start.ok_or_else(|| {
        ContractError::Std(StdError::generic_err("cash-out period start not recorded"))
    })
}

fn ensure_elapsed(
    start: Timestamp,
    dwell_seconds: u64,
    period: &str,
    now: Timestamp,
) -> Result<(), ContractError> {
    let ready_at = start.plus_seconds(dwell_seconds);
    if now < ready_at {
        return Err(ContractError::PeriodNotElapsed {
            period: period.to_string(),
            ready_at: ready_at.seconds(),
        });
    }
    Ok(())
}

fn token_transfer_msg(
    token: &Addr,
    recipient: &Addr,
    amount: Uint128,
) -> Result<CosmosMsg, ContractError> {
    Ok(WasmMsg::Execute {
        contract_addr: token.to_string(),
        msg: to_json_binary(&Cw20ExecuteMsg::Transfer {
            recipient: recipient.to_string(),
            amount,
        })?,
        funds: vec![],
    }
    .into())
}
