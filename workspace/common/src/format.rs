//! Display formatting for dashboard metrics.
//!
//! Every metric carries a [`MetricFormat`] tag and is rendered through a single
//! exhaustive match in [`format_metric`].

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::iso;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Currency of record for the dashboard.
pub const DEFAULT_CURRENCY: &str = "EGP";

/// Placeholder shown for values that cannot be displayed.
pub const NOT_AVAILABLE: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MetricFormat {
    Number,
    Currency,
    Percentage,
}

/// The eight operational metrics of the scenario model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    MealsDelivered,
    PeopleServed,
    CostPerMeal,
    ProgramEfficiency,
    Revenue,
    Expenses,
    Reserves,
    CashPosition,
}

impl MetricKind {
    pub const ALL: [MetricKind; 8] = [
        MetricKind::MealsDelivered,
        MetricKind::PeopleServed,
        MetricKind::CostPerMeal,
        MetricKind::ProgramEfficiency,
        MetricKind::Revenue,
        MetricKind::Expenses,
        MetricKind::Reserves,
        MetricKind::CashPosition,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::MealsDelivered => "Meals Delivered",
            MetricKind::PeopleServed => "People Served",
            MetricKind::CostPerMeal => "Cost Per Meal",
            MetricKind::ProgramEfficiency => "Program Efficiency",
            MetricKind::Revenue => "Revenue",
            MetricKind::Expenses => "Expenses",
            MetricKind::Reserves => "Reserves",
            MetricKind::CashPosition => "Cash Position",
        }
    }

    pub fn format(&self) -> MetricFormat {
        match self {
            MetricKind::MealsDelivered | MetricKind::PeopleServed => MetricFormat::Number,
            MetricKind::ProgramEfficiency => MetricFormat::Percentage,
            MetricKind::CostPerMeal
            | MetricKind::Revenue
            | MetricKind::Expenses
            | MetricKind::Reserves
            | MetricKind::CashPosition => MetricFormat::Currency,
        }
    }
}

/// Formats `value` according to `format`.
///
/// Currency amounts are rounded to the minor units of `currency_code`; an
/// unknown code falls back to two decimals and is printed as given.
pub fn format_metric(value: f64, format: MetricFormat, currency_code: &str) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    match format {
        MetricFormat::Number => group_thousands(value, 0),
        MetricFormat::Currency => {
            let (code, exponent) = match iso::find(currency_code) {
                Some(currency) => (currency.iso_alpha_code, currency.exponent),
                None => (currency_code, 2),
            };
            format!("{} {}", code, group_thousands(value, exponent))
        }
        MetricFormat::Percentage => format!("{:.1}%", value),
    }
}

/// Signed percent change with one decimal, e.g. `+4.2%`.
pub fn format_change(change: f64) -> String {
    if !change.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    if change > 0.0 {
        format!("+{:.1}%", change)
    } else {
        format!("{:.1}%", change)
    }
}

fn group_thousands(value: f64, decimals: u32) -> String {
    let Some(decimal) = Decimal::from_f64(value) else {
        return NOT_AVAILABLE.to_string();
    };
    let rounded = decimal.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let rendered = format!("{:.*}", decimals as usize, rounded);

    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered.as_str()),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{}{}.{}", sign, grouped, fraction),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_format_groups_thousands() {
        assert_eq!(format_metric(367_490_721.0, MetricFormat::Number, "EGP"), "367,490,721");
        assert_eq!(format_metric(999.4, MetricFormat::Number, "EGP"), "999");
        assert_eq!(format_metric(-1_234.0, MetricFormat::Number, "EGP"), "-1,234");
    }

    #[test]
    fn test_currency_format() {
        assert_eq!(format_metric(6.36, MetricFormat::Currency, "EGP"), "EGP 6.36");
        assert_eq!(
            format_metric(2_200_000_000.0, MetricFormat::Currency, "EGP"),
            "EGP 2,200,000,000.00"
        );
    }

    #[test]
    fn test_percentage_format() {
        assert_eq!(format_metric(83.0, MetricFormat::Percentage, "EGP"), "83.0%");
    }

    #[test]
    fn test_non_finite_values() {
        assert_eq!(format_metric(f64::NAN, MetricFormat::Number, "EGP"), NOT_AVAILABLE);
        assert_eq!(format_change(f64::INFINITY), NOT_AVAILABLE);
    }

    #[test]
    fn test_format_change_sign() {
        assert_eq!(format_change(4.24), "+4.2%");
        assert_eq!(format_change(-1.0), "-1.0%");
        assert_eq!(format_change(0.0), "0.0%");
    }

    #[test]
    fn test_metric_kind_formats() {
        assert_eq!(MetricKind::CostPerMeal.format(), MetricFormat::Currency);
        assert_eq!(MetricKind::PeopleServed.format(), MetricFormat::Number);
        assert_eq!(MetricKind::ProgramEfficiency.format(), MetricFormat::Percentage);
    }
}
