use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Economic input variables of the what-if model.
///
/// Every value is a signed percent deviation from a neutral baseline: `0` is
/// "no change", `10` is "+10 %". The dashboard sliders stay within roughly
/// `[-50, 50]`, but nothing downstream relies on that.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ScenarioFactors {
    pub economic_growth: f64,
    pub inflation_rate: f64,
    pub donor_sentiment: f64,
    pub operational_efficiency: f64,
    pub food_prices: f64,
    pub unemployment_rate: f64,
    #[serde(rename = "corporateCSR", alias = "corporateCsr")]
    pub corporate_csr: f64,
    pub government_support: f64,
    #[serde(alias = "exchangeRateEGP")]
    pub exchange_rate: f64,
    #[serde(alias = "logisticsCost")]
    pub logistics_cost_index: f64,
    pub regional_shock: f64,
}

/// Names of the eleven scenario factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Factor {
    EconomicGrowth,
    InflationRate,
    DonorSentiment,
    OperationalEfficiency,
    FoodPrices,
    UnemploymentRate,
    #[serde(rename = "corporateCSR")]
    CorporateCsr,
    GovernmentSupport,
    ExchangeRate,
    LogisticsCostIndex,
    RegionalShock,
}

impl Factor {
    pub const ALL: [Factor; 11] = [
        Factor::EconomicGrowth,
        Factor::InflationRate,
        Factor::DonorSentiment,
        Factor::OperationalEfficiency,
        Factor::FoodPrices,
        Factor::UnemploymentRate,
        Factor::CorporateCsr,
        Factor::GovernmentSupport,
        Factor::ExchangeRate,
        Factor::LogisticsCostIndex,
        Factor::RegionalShock,
    ];

    /// Human readable label used in comparison tables.
    pub fn label(&self) -> &'static str {
        match self {
            Factor::EconomicGrowth => "Economic Growth",
            Factor::InflationRate => "Inflation Rate",
            Factor::DonorSentiment => "Donor Sentiment",
            Factor::OperationalEfficiency => "Operational Efficiency",
            Factor::FoodPrices => "Food Prices",
            Factor::UnemploymentRate => "Unemployment Rate",
            Factor::CorporateCsr => "Corporate CSR",
            Factor::GovernmentSupport => "Government Support",
            Factor::ExchangeRate => "Exchange Rate",
            Factor::LogisticsCostIndex => "Logistics Cost Index",
            Factor::RegionalShock => "Regional Shock",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            Factor::EconomicGrowth => "economicGrowth",
            Factor::InflationRate => "inflationRate",
            Factor::DonorSentiment => "donorSentiment",
            Factor::OperationalEfficiency => "operationalEfficiency",
            Factor::FoodPrices => "foodPrices",
            Factor::UnemploymentRate => "unemploymentRate",
            Factor::CorporateCsr => "corporateCSR",
            Factor::GovernmentSupport => "governmentSupport",
            Factor::ExchangeRate => "exchangeRate",
            Factor::LogisticsCostIndex => "logisticsCostIndex",
            Factor::RegionalShock => "regionalShock",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Factor {
    type Err = String;

    /// Accepts the camelCase key, the snake_case field name or the kebab-case
    /// CLI spelling, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        let factor = match normalized.as_str() {
            "economicgrowth" => Factor::EconomicGrowth,
            "inflationrate" | "inflation" => Factor::InflationRate,
            "donorsentiment" => Factor::DonorSentiment,
            "operationalefficiency" => Factor::OperationalEfficiency,
            "foodprices" => Factor::FoodPrices,
            "unemploymentrate" | "unemployment" => Factor::UnemploymentRate,
            "corporatecsr" => Factor::CorporateCsr,
            "governmentsupport" => Factor::GovernmentSupport,
            "exchangerate" | "exchangerateegp" => Factor::ExchangeRate,
            "logisticscostindex" | "logisticscost" => Factor::LogisticsCostIndex,
            "regionalshock" => Factor::RegionalShock,
            _ => return Err(format!("unknown scenario factor '{}'", s)),
        };
        Ok(factor)
    }
}

impl ScenarioFactors {
    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::EconomicGrowth => self.economic_growth,
            Factor::InflationRate => self.inflation_rate,
            Factor::DonorSentiment => self.donor_sentiment,
            Factor::OperationalEfficiency => self.operational_efficiency,
            Factor::FoodPrices => self.food_prices,
            Factor::UnemploymentRate => self.unemployment_rate,
            Factor::CorporateCsr => self.corporate_csr,
            Factor::GovernmentSupport => self.government_support,
            Factor::ExchangeRate => self.exchange_rate,
            Factor::LogisticsCostIndex => self.logistics_cost_index,
            Factor::RegionalShock => self.regional_shock,
        }
    }

    pub fn set(&mut self, factor: Factor, value: f64) {
        let slot = match factor {
            Factor::EconomicGrowth => &mut self.economic_growth,
            Factor::InflationRate => &mut self.inflation_rate,
            Factor::DonorSentiment => &mut self.donor_sentiment,
            Factor::OperationalEfficiency => &mut self.operational_efficiency,
            Factor::FoodPrices => &mut self.food_prices,
            Factor::UnemploymentRate => &mut self.unemployment_rate,
            Factor::CorporateCsr => &mut self.corporate_csr,
            Factor::GovernmentSupport => &mut self.government_support,
            Factor::ExchangeRate => &mut self.exchange_rate,
            Factor::LogisticsCostIndex => &mut self.logistics_cost_index,
            Factor::RegionalShock => &mut self.regional_shock,
        };
        *slot = value;
    }

    /// Builder-style setter, handy in tests and CLI parsing.
    pub fn with(mut self, factor: Factor, value: f64) -> Self {
        self.set(factor, value);
        self
    }

    /// `(factor, value)` pairs in declaration order.
    pub fn entries(&self) -> Vec<(Factor, f64)> {
        Factor::ALL.iter().map(|f| (*f, self.get(*f))).collect()
    }

    pub fn is_neutral(&self) -> bool {
        Factor::ALL.iter().all(|f| self.get(*f) == 0.0)
    }
}

/// Unperturbed operational state of the organisation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BaselineMetrics {
    pub meals_delivered: f64,
    pub people_served: f64,
    /// Currency per meal
    pub cost_per_meal: f64,
    /// Either a ratio in `[0, 1]` or a percentage in `[0, 100]`
    pub program_efficiency: f64,
    pub revenue: f64,
    pub expenses: f64,
    pub reserves: f64,
    pub cash_position: f64,
}

impl BaselineMetrics {
    /// Reference operating figures of fiscal year 2024/25.
    pub fn fy2024_25() -> Self {
        Self {
            meals_delivered: 367_490_721.0,
            people_served: 4_960_000.0,
            cost_per_meal: 6.36,
            program_efficiency: 83.0,
            revenue: 2_200_000_000.0,
            expenses: 2_316_000_000.0,
            reserves: 731_200_000.0,
            cash_position: 459_800_000.0,
        }
    }

    pub fn efficiency_scale(&self) -> ProgramEfficiencyScale {
        ProgramEfficiencyScale::infer(self.program_efficiency)
    }
}

impl Default for BaselineMetrics {
    fn default() -> Self {
        Self::fy2024_25()
    }
}

/// Representation of `program_efficiency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProgramEfficiencyScale {
    Ratio,
    Percent,
}

impl ProgramEfficiencyScale {
    /// Values up to `1.0` are read as ratios, anything above as percentages.
    pub fn infer(value: f64) -> Self {
        if value <= 1.0 {
            ProgramEfficiencyScale::Ratio
        } else {
            ProgramEfficiencyScale::Percent
        }
    }

    pub fn upper_bound(&self) -> f64 {
        match self {
            ProgramEfficiencyScale::Ratio => 1.0,
            ProgramEfficiencyScale::Percent => 100.0,
        }
    }
}

/// Scenario-adjusted metrics plus the percent change of each against baseline.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedMetrics {
    pub meals_delivered: f64,
    pub meals_delivered_change: f64,
    pub people_served: f64,
    pub people_served_change: f64,
    pub cost_per_meal: f64,
    pub cost_per_meal_change: f64,
    pub program_efficiency: f64,
    pub program_efficiency_change: f64,
    pub revenue: f64,
    pub revenue_change: f64,
    pub expenses: f64,
    pub expenses_change: f64,
    pub reserves: f64,
    pub reserves_change: f64,
    pub cash_position: f64,
    pub cash_position_change: f64,
}

impl CalculatedMetrics {
    /// Adjusted values without the change columns.
    pub fn values(&self) -> BaselineMetrics {
        BaselineMetrics {
            meals_delivered: self.meals_delivered,
            people_served: self.people_served,
            cost_per_meal: self.cost_per_meal,
            program_efficiency: self.program_efficiency,
            revenue: self.revenue,
            expenses: self.expenses,
            reserves: self.reserves,
            cash_position: self.cash_position,
        }
    }

    /// `(adjusted value, change %)` for a metric.
    pub fn metric(&self, kind: crate::format::MetricKind) -> (f64, f64) {
        use crate::format::MetricKind;
        match kind {
            MetricKind::MealsDelivered => (self.meals_delivered, self.meals_delivered_change),
            MetricKind::PeopleServed => (self.people_served, self.people_served_change),
            MetricKind::CostPerMeal => (self.cost_per_meal, self.cost_per_meal_change),
            MetricKind::ProgramEfficiency => {
                (self.program_efficiency, self.program_efficiency_change)
            }
            MetricKind::Revenue => (self.revenue, self.revenue_change),
            MetricKind::Expenses => (self.expenses, self.expenses_change),
            MetricKind::Reserves => (self.reserves, self.reserves_change),
            MetricKind::CashPosition => (self.cash_position, self.cash_position_change),
        }
    }

    pub fn is_finite(&self) -> bool {
        crate::format::MetricKind::ALL.iter().all(|kind| {
            let (value, change) = self.metric(*kind);
            value.is_finite() && change.is_finite()
        })
    }
}

/// Request body for an ad-hoc scenario calculation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateScenarioRequest {
    /// Defaults to the FY2024/25 reference baseline
    pub baseline: Option<BaselineMetrics>,
    #[serde(default)]
    pub factors: ScenarioFactors,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factors_default_is_neutral() {
        assert!(ScenarioFactors::default().is_neutral());
        assert!(!ScenarioFactors::default().with(Factor::FoodPrices, 5.0).is_neutral());
    }

    #[test]
    fn test_factor_from_str_spellings() {
        assert_eq!("foodPrices".parse::<Factor>().unwrap(), Factor::FoodPrices);
        assert_eq!("food_prices".parse::<Factor>().unwrap(), Factor::FoodPrices);
        assert_eq!("food-prices".parse::<Factor>().unwrap(), Factor::FoodPrices);
        assert_eq!("exchangeRateEGP".parse::<Factor>().unwrap(), Factor::ExchangeRate);
        assert!("weather".parse::<Factor>().is_err());
    }

    #[test]
    fn test_factors_deserialize_dashboard_payload() {
        let json = r#"{"economicGrowth": 2, "corporateCSR": 4.5,
            "exchangeRateEGP": -3, "logisticsCost": 1}"#;
        let factors: ScenarioFactors = serde_json::from_str(json).unwrap();

        assert_eq!(factors.economic_growth, 2.0);
        assert_eq!(factors.corporate_csr, 4.5);
        assert_eq!(factors.exchange_rate, -3.0);
        assert_eq!(factors.logistics_cost_index, 1.0);
        assert_eq!(factors.food_prices, 0.0);
    }

    #[test]
    fn test_entries_follow_declaration_order() {
        let factors = ScenarioFactors::default().with(Factor::RegionalShock, -7.0);
        let entries = factors.entries();

        assert_eq!(entries.len(), 11);
        assert_eq!(entries[0].0, Factor::EconomicGrowth);
        assert_eq!(entries[10], (Factor::RegionalShock, -7.0));
    }

    #[test]
    fn test_efficiency_scale_inference() {
        assert_eq!(ProgramEfficiencyScale::infer(0.94), ProgramEfficiencyScale::Ratio);
        assert_eq!(ProgramEfficiencyScale::infer(83.0), ProgramEfficiencyScale::Percent);
        assert_eq!(
            BaselineMetrics::fy2024_25().efficiency_scale(),
            ProgramEfficiencyScale::Percent
        );
    }
}
