//! Payout tiers.
//!
//! Redemption only asks a [`TierPolicy`] two things: which tier a ticket falls
//! into, and what that tier is worth. [`TierSchedule`] is the policy stored in
//! the contract config; other policies can be plugged into [`settle`].

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;
use lotto_common::types::NUMBER_DIGITS;
use lotto_common::{DrawnResult, Ticket};

use crate::draw::matching_trailing_digits;
use crate::error::ContractError;

const BPS_DENOMINATOR: u128 = 10_000;

#[cw_serde]
pub enum Payout {
    /// Fraction of the ticket price, in basis points.
    TicketPriceBps(u16),
    /// Fraction of the epoch's frozen prize pool, in basis points.
    PrizePoolBps(u16),
    /// Everything still redeemable in the epoch (the jackpot).
    RemainingPool,
}

#[cw_serde]
pub struct PrizeTier {
    pub matching_digits: u8,
    /// When false the tier applies to any series.
    pub series_must_match: bool,
    pub payout: Payout,
}

impl PrizeTier {
    pub fn is_jackpot(&self) -> bool {
        matches!(self.payout, Payout::RemainingPool)
    }
}

#[cw_serde]
pub struct TierSchedule {
    /// Share of each frozen prize pool that redemptions can never touch.
    pub house_share_bps: u16,
    /// Send the house share to the admin together with the jackpot payout.
    /// Otherwise it stays in custody until the clawback.
    #[serde(default)]
    pub house_share_paid_on_jackpot: bool,
    /// Evaluated in order, first match wins.
    pub tiers: Vec<PrizeTier>,
}

impl Default for TierSchedule {
    fn default() -> Self {
        TierSchedule {
            house_share_bps: 500,
            house_share_paid_on_jackpot: true,
            tiers: vec![
                PrizeTier {
                    matching_digits: NUMBER_DIGITS,
                    series_must_match: true,
                    payout: Payout::RemainingPool,
                },
                PrizeTier {
                    matching_digits: NUMBER_DIGITS,
                    series_must_match: false,
                    payout: Payout::TicketPriceBps(2000),
                },
                PrizeTier {
                    matching_digits: 3,
                    series_must_match: true,
                    payout: Payout::TicketPriceBps(1000),
                },
            ],
        }
    }
}

impl TierSchedule {
    pub fn validate(&self) -> Result<(), ContractError> {
        if u128::from(self.house_share_bps) > BPS_DENOMINATOR {
            return Err(ContractError::InvalidTierSchedule {
                reason: format!("house_share_bps {} exceeds 10000", self.house_share_bps),
            });
        }

        let mut jackpots = 0;
        for tier in &self.tiers {
            if tier.matching_digits > NUMBER_DIGITS {
                return Err(ContractError::InvalidTierSchedule {
                    reason: format!(
                        "matching_digits {} exceeds {}",
                        tier.matching_digits, NUMBER_DIGITS
                    ),
                });
            }
            match tier.payout {
                Payout::TicketPriceBps(bps) | Payout::PrizePoolBps(bps)
                    if u128::from(bps) > BPS_DENOMINATOR =>
                {
                    return Err(ContractError::InvalidTierSchedule {
                        reason: format!("payout of {} bps exceeds 10000", bps),
                    });
                }
                Payout::RemainingPool => jackpots += 1,
                _ => {}
            }
        }
        if jackpots > 1 {
            return Err(ContractError::InvalidTierSchedule {
                reason: "at most one remaining_pool tier is allowed".to_string(),
            });
        }
        Ok(())
    }
}

/// Epoch figures a payout may depend on.
#[derive(Clone, Debug)]
pub struct PayoutContext {
    pub ticket_price: Uint128,
    pub prize_pool: Uint128,
    /// Prize pool minus house share minus everything already paid.
    pub redeemable: Uint128,
}

pub trait TierPolicy {
    fn tier_for(&self, matching_digits: u8, series_matches: bool) -> Option<&PrizeTier>;

    fn house_share(&self, prize_pool: Uint128) -> Uint128;

    fn tier_amount(&self, tier: &PrizeTier, ctx: &PayoutContext) -> Uint128 {
        match tier.payout {
            Payout::TicketPriceBps(bps) => ctx.ticket_price.multiply_ratio(bps, BPS_DENOMINATOR),
            Payout::PrizePoolBps(bps) => ctx.prize_pool.multiply_ratio(bps, BPS_DENOMINATOR),
            Payout::RemainingPool => ctx.redeemable,
        }
    }
}

impl TierPolicy for TierSchedule {
    fn tier_for(&self, matching_digits: u8, series_matches: bool) -> Option<&PrizeTier> {
        self.tiers.iter().find(|tier| {
            tier.matching_digits == matching_digits && (series_matches || !tier.series_must_match)
        })
    }

    fn house_share(&self, prize_pool: Uint128) -> Uint128 {
        prize_pool.multiply_ratio(self.house_share_bps, BPS_DENOMINATOR)
    }
}

/// Result of comparing one ticket against its epoch's draw.
#[cw_serde]
pub struct Settlement {
    pub matching_digits: u8,
    pub series_matches: bool,
    pub tier: Option<PrizeTier>,
    /// True when this settlement claims the epoch's jackpot.
    pub jackpot: bool,
    pub amount: Uint128,
}

/// Settle a ticket. The amount never exceeds `ctx.redeemable`; a jackpot tier
/// pays nothing once `jackpot_available` is false.
pub fn settle<P: TierPolicy + ?Sized>(
    policy: &P,
    ticket: &Ticket,
    drawn: &DrawnResult,
    ctx: &PayoutContext,
    jackpot_available: bool,
) -> Settlement {
    let matching_digits = matching_trailing_digits(ticket.number, drawn.number);
    let series_matches = ticket.series == drawn.series;

    let Some(tier) = policy.tier_for(matching_digits, series_matches) else {
        return Settlement {
            matching_digits,
            series_matches,
            tier: None,
            jackpot: false,
            amount: Uint128::zero(),
        };
    };

    let jackpot = tier.is_jackpot() && jackpot_available;
    let amount = if tier.is_jackpot() && !jackpot_available {
        Uint128::zero()
    } else {
        policy.tier_amount(tier, ctx).min(ctx.redeemable)
    };

    Settlement {
        matching_digits,
        series_matches,
        tier: Some(tier.clone()),
        jackpot,
        amount,
    }
}
