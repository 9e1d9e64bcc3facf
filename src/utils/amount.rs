//! Display helpers for base-unit amounts

use rust_decimal::Decimal;

/// Render `amount` base units with `decimals` places, e.g. `1_000_600` at 6 decimals is `1.0006`.
///
/// Falls back to the raw integer when the value is outside `Decimal` range.
pub fn format_units(amount: u128, decimals: u32) -> String {
    i128::try_from(amount)
        .ok()
        .and_then(|value| Decimal::try_from_i128_with_scale(value, decimals).ok())
        .map(|value| value.normalize().to_string())
        .unwrap_or_else(|| amount.to_string())
}

/// Signed variant of [`format_units`]
pub fn format_signed_units(amount: i128, decimals: u32) -> String {
    Decimal::try_from_i128_with_scale(amount, decimals)
        .map(|value| value.normalize().to_string())
        .unwrap_or_else(|_| amount.to_string())
}

/// Basis points as a percentage string, e.g. `60` is `0.60%`.
///
/// Ratios beyond the decimal range fall back to raw basis points.
pub fn format_bps(bps: i128) -> String {
    Decimal::try_from_i128_with_scale(bps, 2)
        .map(|value| format!("{}%", value))
        .unwrap_or_else(|_| format!("{} bps", bps))
}

/// Unsigned variant of [`format_bps`], for realised ratios on receipts
pub fn format_ratio_bps(bps: u128) -> String {
    i128::try_from(bps)
        .map(format_bps)
        .unwrap_or_else(|_| format!("{} bps", bps))
}
