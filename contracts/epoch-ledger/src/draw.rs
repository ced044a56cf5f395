use cosmwasm_std::Uint256;
use lotto_common::types::{MAX_SERIES, MAX_TICKET_NUMBER, MIN_SERIES, NUMBER_DIGITS};
use lotto_common::DrawnResult;

/// Drawn numbers are reduced into `[0, DRAW_NUMBER_MODULUS)`.
pub const DRAW_NUMBER_MODULUS: u16 = MAX_TICKET_NUMBER;

/// Reduce one random integer to a drawn `(series, number)` pair.
///
/// Plain modulo reduction: `series = r % 5 + 1`, `number = (r / 5) % 2000`.
/// For a 256-bit input the bias towards low residues is below 2^-240.
pub fn reduce_randomness(randomness: Uint256) -> DrawnResult {
    let series_count = Uint256::from(u128::from(MAX_SERIES - MIN_SERIES + 1));
    let series_index = randomness % series_count;
    let number = (randomness / series_count) % Uint256::from(u128::from(DRAW_NUMBER_MODULUS));

    DrawnResult {
        series: low_u16(series_index) as u8 + MIN_SERIES,
        number: low_u16(number),
    }
}

/// Count matching trailing decimal digits of two numbers written with
/// `NUMBER_DIGITS` zero-padded digits. 156 vs 1156 gives 3, 1156 vs 1156 gives 4.
pub fn matching_trailing_digits(ticket: u16, drawn: u16) -> u8 {
    let mut ticket = ticket;
    let mut drawn = drawn;
    let mut matched = 0;
    while matched < NUMBER_DIGITS && ticket % 10 == drawn % 10 {
        matched += 1;
        ticket /= 10;
        drawn /= 10;
    }
    matched
}

// caller guarantees value < 2^16
fn low_u16(value: Uint256) -> u16 {
    let bytes = value.to_be_bytes();
    u16::from_be_bytes([bytes[30], bytes[31]])
}
