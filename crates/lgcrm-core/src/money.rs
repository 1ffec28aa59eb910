// ABOUTME: Dual-currency money formatting for lead budgets and property prices.
// ABOUTME: Small budgets are assumed to be rentals in soles, larger ones sales in dollars.

use serde::{Deserialize, Serialize};

/// Budgets at or below this amount are assumed to be monthly rent in PEN.
pub const RENT_BUDGET_CEILING: f64 = 10_000.0;

const NO_AMOUNT: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Pen,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Pen => "S/",
        }
    }
}

/// Guess the currency of a lead budget from its upper bound.
pub fn guess_currency(max_budget: Option<f64>) -> Currency {
    if max_budget.unwrap_or(0.0) <= RENT_BUDGET_CEILING {
        Currency::Pen
    } else {
        Currency::Usd
    }
}

/// Format an amount with its currency symbol, rounded to whole units with
/// comma thousands separators, e.g. `S/ 1,600`.
pub fn format_money(amount: Option<f64>, currency: Currency) -> String {
    let Some(amount) = amount.filter(|a| a.is_finite()) else {
        return NO_AMOUNT.to_string();
    };

    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded < 0 { "-" } else { "" };
    format!("{sign}{} {grouped}", currency.symbol())
}

/// Format a budget range. Missing or zero bounds collapse to a single
/// amount; when both are missing the placeholder is returned.
pub fn format_budget_range(min: Option<f64>, max: Option<f64>) -> String {
    let low = min.unwrap_or(0.0);
    let high = max.unwrap_or(0.0);
    if low == 0.0 && high == 0.0 {
        return NO_AMOUNT.to_string();
    }

    let currency = guess_currency(max.or(min));
    if low != 0.0 && high != 0.0 && low != high {
        return format!(
            "{} – {}",
            format_money(Some(low), currency),
            format_money(Some(high), currency)
        );
    }

    let single = if high != 0.0 { high } else { low };
    format_money(Some(single), currency)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_budgets_are_soles() {
        assert_eq!(guess_currency(Some(2_000.0)), Currency::Pen);
        assert_eq!(guess_currency(Some(10_000.0)), Currency::Pen);
        assert_eq!(guess_currency(None), Currency::Pen);
        assert_eq!(guess_currency(Some(10_001.0)), Currency::Usd);
    }

    #[test]
    fn money_groups_thousands_and_drops_decimals() {
        assert_eq!(format_money(Some(180_000.0), Currency::Usd), "$ 180,000");
        assert_eq!(format_money(Some(1_600.4), Currency::Pen), "S/ 1,600");
        assert_eq!(format_money(Some(999.0), Currency::Pen), "S/ 999");
        assert_eq!(format_money(Some(1_234_567.0), Currency::Usd), "$ 1,234,567");
    }

    #[test]
    fn missing_amount_renders_placeholder() {
        assert_eq!(format_money(None, Currency::Usd), "—");
        assert_eq!(format_money(Some(f64::NAN), Currency::Usd), "—");
    }

    #[test]
    fn budget_range_formats() {
        assert_eq!(
            format_budget_range(Some(120_000.0), Some(180_000.0)),
            "$ 120,000 – $ 180,000"
        );
        assert_eq!(format_budget_range(Some(1_500.0), Some(2_000.0)), "S/ 1,500 – S/ 2,000");
        assert_eq!(format_budget_range(None, Some(2_000.0)), "S/ 2,000");
        assert_eq!(format_budget_range(Some(50_000.0), None), "$ 50,000");
        assert_eq!(format_budget_range(Some(900.0), Some(900.0)), "S/ 900");
        assert_eq!(format_budget_range(None, None), "—");
    }
}
