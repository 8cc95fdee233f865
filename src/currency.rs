//! Currency formatting and VAT helpers
//!
//! Philippine-peso display conventions: two decimal places, comma
//! thousands grouping, `₱` symbol. VAT mode is exclusive; the inclusive
//! case is covered by [`calculate_subtotal_from_total`]. All helpers are
//! total for real inputs: zero divisors yield 0 instead of failing.

/// Default display symbol; override per deployment via
/// [`crate::config::Settings::currency_symbol`].
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₱";

/// Default VAT rate in percent.
pub const DEFAULT_VAT_RATE: f64 = 12.0;

/// Format an amount as currency, e.g. `₱1,234,567.89`.
pub fn format_currency(amount: f64) -> String {
    format_currency_with(DEFAULT_CURRENCY_SYMBOL, amount)
}

/// Format an amount with an explicit currency symbol.
pub fn format_currency_with(symbol: &str, amount: f64) -> String {
    if !amount.is_finite() {
        return format!("{symbol}0.00");
    }
    if amount < 0.0 {
        format!("-{symbol}{}", format_number(-amount, 2))
    } else {
        format!("{symbol}{}", format_number(amount, 2))
    }
}

/// Format a number with fixed decimals and comma thousands grouping.
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return format!("{:.decimals$}", 0.0);
    }

    let formatted = format!("{:.decimals$}", value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3);
    if value < 0.0 {
        grouped.push('-');
    }
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Parse a formatted currency string back to a number. Strips the
/// symbol, grouping commas and whitespace; unparseable input yields 0.
pub fn parse_currency(value: &str) -> f64 {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '₱' | ',') && !c.is_whitespace())
        .collect();
    cleaned.parse().unwrap_or(0.0)
}

/// VAT on a tax-exclusive amount.
pub fn calculate_vat(amount: f64, vat_rate: f64) -> f64 {
    amount * vat_rate / 100.0
}

/// Amount with exclusive VAT added on top.
pub fn calculate_total_with_vat(amount: f64, vat_rate: f64) -> f64 {
    amount + calculate_vat(amount, vat_rate)
}

/// Recover the pre-VAT subtotal from a VAT-inclusive total.
pub fn calculate_subtotal_from_total(total: f64, vat_rate: f64) -> f64 {
    let divisor = 1.0 + vat_rate / 100.0;
    if divisor == 0.0 {
        return 0.0;
    }
    total / divisor
}

/// Apply a percentage to an amount.
pub fn apply_percentage(amount: f64, percentage: f64) -> f64 {
    amount * percentage / 100.0
}

/// What percentage of `total` is `value`. Returns 0 when `total` is 0.
pub fn calculate_percentage(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    value / total * 100.0
}

/// Format a percentage for display, e.g. `12.50%`.
pub fn format_percentage(value: f64, decimals: usize) -> String {
    format!("{}%", format_number(value, decimals))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_formatting_groups_thousands() {
        assert_eq!(format_currency(1_234_567.891), "₱1,234,567.89");
        assert_eq!(format_currency(999.5), "₱999.50");
        assert_eq!(format_currency(0.0), "₱0.00");
    }

    #[test]
    fn negative_amounts_keep_the_sign_outside_the_symbol() {
        assert_eq!(format_currency(-1_500.0), "-₱1,500.00");
    }

    #[test]
    fn non_finite_amounts_format_as_zero() {
        assert_eq!(format_currency(f64::NAN), "₱0.00");
        assert_eq!(format_currency(f64::INFINITY), "₱0.00");
    }

    #[test]
    fn parse_inverts_format() {
        assert_eq!(parse_currency("₱1,234,567.89"), 1_234_567.89);
        assert_eq!(parse_currency(" 2,500.00 "), 2_500.0);
        assert_eq!(parse_currency("not a number"), 0.0);
    }

    #[test]
    fn vat_forward_and_inverse_round_trip() {
        for amount in [0.0, 1.0, 124_300.0, 9_876_543.21] {
            for rate in [0.0, 5.0, 12.0] {
                let total = calculate_total_with_vat(amount, rate);
                let back = calculate_subtotal_from_total(total, rate);
                assert!(
                    (back - amount).abs() < 1e-6,
                    "round trip failed for {amount} at {rate}%"
                );
            }
        }
    }

    #[test]
    fn vat_twelve_percent() {
        assert_eq!(calculate_vat(124_300.0, DEFAULT_VAT_RATE), 14_916.0);
        assert_eq!(
            calculate_total_with_vat(124_300.0, DEFAULT_VAT_RATE),
            139_216.0
        );
    }

    #[test]
    fn zero_divisors_yield_zero() {
        assert_eq!(calculate_subtotal_from_total(112.0, -100.0), 0.0);
        assert_eq!(calculate_percentage(50.0, 0.0), 0.0);
    }

    #[test]
    fn percentage_helpers() {
        assert_eq!(apply_percentage(100_000.0, 5.0), 5_000.0);
        assert_eq!(calculate_percentage(25.0, 200.0), 12.5);
        assert_eq!(format_percentage(12.5, 2), "12.50%");
    }
}
