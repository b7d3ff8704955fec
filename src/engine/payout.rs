//! Projected prize money from a live leaderboard position.
//!
//! Projections are informational only; scoring always uses the final
//! earnings feed.

use crate::domain::Money;
use rust_decimal::Decimal as RustDecimal;

/// Last position with an explicit share of the purse.
const TABLE_POSITIONS: u32 = 65;

/// Positions beyond this receive nothing.
const LAST_PAID_POSITION: u32 = 80;

/// Share of the purse for positions 1..=65, in ten-thousandths.
const PAYOUT_BASIS_POINTS: [i64; TABLE_POSITIONS as usize] = [
    1800, 1090, 690, 490, 410, 363, 338, 313, 293, 273, // 1-10
    253, 233, 213, 193, 183, 173, 163, 153, 143, 133, // 11-20
    123, 113, 105, 97, 89, 81, 78, 75, 72, 69, // 21-30
    66, 63, 60, 57, 55, 52, 50, 48, 46, 44, // 31-40
    42, 40, 38, 36, 34, 32, 30, 28, 27, 26, // 41-50
    25, 25, 24, 24, 24, 23, 23, 23, 23, 23, // 51-60
    22, 22, 22, 22, 22, // 61-65
];

/// Share of the purse paid to a single finishing position.
pub fn position_share(position: u32) -> RustDecimal {
    match position {
        0 => RustDecimal::ZERO,
        p if p <= TABLE_POSITIONS => RustDecimal::new(PAYOUT_BASIS_POINTS[(p - 1) as usize], 4),
        p if p <= LAST_PAID_POSITION => {
            // 0.213% at 66, down 0.002% per place.
            let share =
                RustDecimal::new(213, 5) - RustDecimal::from(p - 66) * RustDecimal::new(2, 5);
            share.max(RustDecimal::ZERO)
        }
        _ => RustDecimal::ZERO,
    }
}

/// Parse a leaderboard position such as "1", "T7". Non-finishing markers
/// ("CUT", "WD", "DQ", "-") yield `None`.
pub fn parse_position(position: &str) -> Option<(u32, bool)> {
    let upper = position.trim().to_uppercase();
    let (digits, tied) = match upper.strip_prefix('T') {
        Some(rest) => (rest, true),
        None => (upper.as_str(), false),
    };
    digits.parse::<u32>().ok().map(|p| (p, tied))
}

/// Projected earnings for a golfer at `position`.
///
/// Players sharing a position split the combined shares of the places they
/// occupy, e.g. three players at T2 split places 2, 3 and 4 evenly. The
/// result is truncated to whole units.
pub fn projected_earnings<S: AsRef<str>>(position: &str, purse: i64, all_positions: &[S]) -> Money {
    if purse <= 0 {
        return Money::zero();
    }
    let Some((base, _)) = parse_position(position) else {
        return Money::zero();
    };
    if base == 0 || base > LAST_PAID_POSITION {
        return Money::zero();
    }

    let key = position.trim().to_uppercase();
    let tie_count = all_positions
        .iter()
        .filter(|p| p.as_ref().trim().to_uppercase() == key)
        .count()
        .max(1) as u32;

    let total: RustDecimal = (0..tie_count).map(|i| position_share(base + i)).sum();
    let share = total / RustDecimal::from(tie_count);

    Money::new(RustDecimal::from(purse) * share).trunc()
}
