use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::DatePeriod;

/// Format a decimal with thousands separators and a fixed number of decimal
/// places (midpoints round away from zero).
///
/// # Examples
///
/// ```
/// use analyzer_core::formatting::format_amount;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_amount(Decimal::new(123450, 2), 2), "1,234.50");
/// assert_eq!(format_amount(Decimal::new(1234567, 0), 0), "1,234,567");
/// assert_eq!(format_amount(Decimal::ZERO, 2), "0.00");
/// assert_eq!(format_amount(Decimal::new(-98765, 1), 1), "-9,876.5");
/// ```
pub fn format_amount(value: Decimal, decimals: u32) -> String {
    let rounded =
        value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.prec$}", rounded.abs(), prec = decimals as usize);

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut result = group_thousands(int_part);
    if let Some(frac) = frac_part {
        result.push('.');
        result.push_str(frac);
    }

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a monetary amount with two decimals and the currency code, when
/// known.
///
/// # Examples
///
/// ```
/// use analyzer_core::formatting::format_money;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_money(Decimal::new(-3000, 2), Some("EUR")), "-30.00 EUR");
/// assert_eq!(format_money(Decimal::new(150000, 2), None), "1,500.00");
/// ```
pub fn format_money(amount: Decimal, currency: Option<&str>) -> String {
    let number = format_amount(amount, 2);
    match currency {
        Some(code) if !code.is_empty() => format!("{} {}", number, code),
        _ => number,
    }
}

/// ISO `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `"2024-01-01 → 2024-03-31"`.
pub fn format_period(period: &DatePeriod) -> String {
    format!("{} → {}", format_date(period.start), format_date(period.end))
}

/// Turn a chart title into a file-name-safe slug.
///
/// ASCII alphanumerics are kept (lower-cased), every other run of
/// characters collapses into a single `-`.
///
/// # Examples
///
/// ```
/// use analyzer_core::formatting::slugify;
///
/// assert_eq!(slugify("Joint Checking (FR76…)"), "joint-checking-fr76");
/// assert_eq!(slugify("***"), "chart");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "chart".to_string()
    } else {
        slug
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_amount_rounds_half_away_from_zero() {
        assert_eq!(format_amount(dec!(0.125), 2), "0.13");
        assert_eq!(format_amount(dec!(-0.125), 2), "-0.13");
    }

    #[test]
    fn test_format_amount_negative_zero_has_no_sign() {
        assert_eq!(format_amount(dec!(-0.001), 2), "0.00");
    }

    #[test]
    fn test_format_amount_pads_decimals() {
        assert_eq!(format_amount(dec!(7), 2), "7.00");
        assert_eq!(format_amount(dec!(1000000.5), 2), "1,000,000.50");
    }

    #[test]
    fn test_format_money_empty_currency() {
        assert_eq!(format_money(dec!(1), Some("")), "1.00");
    }

    #[test]
    fn test_format_period() {
        let p = DatePeriod::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        );
        assert_eq!(format_period(&p), "2024-01-01 → 2024-03-31");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  Savings -- Main  "), "savings-main");
        assert_eq!(slugify("123"), "123");
    }
}
