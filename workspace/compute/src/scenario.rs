//! What-if scenario calculator.
//!
//! Maps the eleven [`ScenarioFactors`] onto the eight operational metrics of a
//! [`BaselineMetrics`] through explicit elasticities. Each directly driven
//! metric is `baseline * (1 + weighted_sum / 100)`; meals, people served,
//! reserves and cash are derived from those so the outputs stay consistent
//! with one another.
//!
//! The calculation is pure. All-zero factors reproduce the baseline exactly,
//! and no input (including NaN or infinite factors) yields a non-finite output.
//! Values that overflow saturate at `f64::MAX` so every factor keeps its
//! direction at any magnitude.

use common::{BaselineMetrics, CalculatedMetrics, Factor, ScenarioFactors};
use tracing::{debug, instrument, trace};

/// Lower bound of the cost ratio used when deriving meals, so a cost per meal
/// driven to zero does not turn into infinitely many meals.
const MIN_COST_RATIO: f64 = 0.01;

/// Something that turns a baseline and a set of factors into adjusted metrics.
pub trait ScenarioModel {
    fn calculate(&self, baseline: &BaselineMetrics, factors: &ScenarioFactors) -> CalculatedMetrics;
}

/// Weights of the factors that drive one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Weights(pub Vec<(Factor, f64)>);

impl Weights {
    /// Weighted sum of the factors in percent points.
    pub fn apply(&self, factors: &ScenarioFactors) -> f64 {
        self.0
            .iter()
            .map(|(factor, weight)| weight * sanitize(factors.get(*factor)))
            .sum()
    }

    /// Weight of `factor`, `0` when it does not drive this metric.
    pub fn weight(&self, factor: Factor) -> f64 {
        self.0
            .iter()
            .filter(|(f, _)| *f == factor)
            .map(|(_, w)| *w)
            .sum()
    }
}

/// Elasticity constants of the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Elasticities {
    pub revenue: Weights,
    /// Extra revenue when donor sentiment and economic growth rise together,
    /// applied to `max(sentiment, 0) * max(growth, 0) / 100`.
    pub sentiment_growth_interaction: f64,
    pub expenses: Weights,
    pub cost_per_meal: Weights,
    pub program_efficiency: Weights,
    /// Share of the change in operating result that lands in reserves
    pub reserves_gap_share: f64,
    /// Share of the change in operating result that lands in cash
    pub cash_gap_share: f64,
}

impl Default for Elasticities {
    fn default() -> Self {
        Self {
            revenue: Weights(vec![
                (Factor::DonorSentiment, 0.6),
                (Factor::EconomicGrowth, 0.4),
                (Factor::CorporateCsr, 0.25),
                (Factor::GovernmentSupport, 0.2),
                (Factor::InflationRate, -0.3),
                (Factor::UnemploymentRate, -0.2),
                (Factor::RegionalShock, -0.35),
            ]),
            sentiment_growth_interaction: 0.1,
            expenses: Weights(vec![
                (Factor::FoodPrices, 0.45),
                (Factor::LogisticsCostIndex, 0.2),
                (Factor::ExchangeRate, 0.25),
                (Factor::InflationRate, 0.15),
                (Factor::OperationalEfficiency, -0.3),
            ]),
            cost_per_meal: Weights(vec![
                (Factor::FoodPrices, 0.55),
                (Factor::LogisticsCostIndex, 0.25),
                (Factor::ExchangeRate, 0.3),
                (Factor::InflationRate, 0.1),
                (Factor::OperationalEfficiency, -0.35),
                (Factor::RegionalShock, 0.2),
            ]),
            program_efficiency: Weights(vec![
                (Factor::OperationalEfficiency, 0.15),
                (Factor::RegionalShock, -0.1),
            ]),
            reserves_gap_share: 0.25,
            cash_gap_share: 0.5,
        }
    }
}

/// Linear elasticity model with multiplicative adjustment per metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElasticityModel {
    pub elasticities: Elasticities,
}

impl ElasticityModel {
    pub fn new(elasticities: Elasticities) -> Self {
        Self { elasticities }
    }
}

impl ScenarioModel for ElasticityModel {
    #[instrument(skip(self, baseline, factors))]
    fn calculate(&self, baseline: &BaselineMetrics, factors: &ScenarioFactors) -> CalculatedMetrics {
        let e = &self.elasticities;
        let base = sanitize_baseline(baseline);

        let interaction = e.sentiment_growth_interaction
            * sanitize(factors.donor_sentiment).max(0.0)
            * sanitize(factors.economic_growth).max(0.0)
            / 100.0;
        let revenue_multiplier = multiplier(e.revenue.apply(factors) + interaction);
        let expenses_multiplier = multiplier(e.expenses.apply(factors));
        let cost_multiplier = multiplier(e.cost_per_meal.apply(factors));

        trace!(
            revenue_multiplier,
            expenses_multiplier,
            cost_multiplier,
            "Computed metric multipliers"
        );

        let revenue = saturate(base.revenue * revenue_multiplier);
        let expenses = saturate(base.expenses * expenses_multiplier);
        let cost_per_meal = saturate(base.cost_per_meal * cost_multiplier);

        // A baseline outside the scale keeps its own value as the bound.
        let upper = base.efficiency_scale().upper_bound().max(base.program_efficiency);
        let lower = base.program_efficiency.min(0.0);
        let program_efficiency = saturate(
            base.program_efficiency * multiplier(e.program_efficiency.apply(factors)),
        )
        .clamp(lower, upper);

        let revenue_ratio = ratio(revenue, base.revenue);
        let efficiency_ratio = ratio(program_efficiency, base.program_efficiency);
        let cost_ratio = ratio(cost_per_meal, base.cost_per_meal).max(MIN_COST_RATIO);
        let meals_delivered =
            saturate(base.meals_delivered * revenue_ratio * efficiency_ratio / cost_ratio);

        // meals / (base_meals / base_people), degrading to the baseline when
        // either baseline figure is zero.
        let people_served =
            saturate(base.people_served * ratio(meals_delivered, base.meals_delivered));

        let gap_delta = saturate(saturate(revenue - expenses) - (base.revenue - base.expenses));
        let reserves = apply_gap(base.reserves, e.reserves_gap_share, gap_delta);
        let cash_position = apply_gap(base.cash_position, e.cash_gap_share, gap_delta);

        let result = CalculatedMetrics {
            meals_delivered,
            meals_delivered_change: percent_change(base.meals_delivered, meals_delivered),
            people_served,
            people_served_change: percent_change(base.people_served, people_served),
            cost_per_meal,
            cost_per_meal_change: percent_change(base.cost_per_meal, cost_per_meal),
            program_efficiency,
            program_efficiency_change: percent_change(base.program_efficiency, program_efficiency),
            revenue,
            revenue_change: percent_change(base.revenue, revenue),
            expenses,
            expenses_change: percent_change(base.expenses, expenses),
            reserves,
            reserves_change: percent_change(base.reserves, reserves),
            cash_position,
            cash_position_change: percent_change(base.cash_position, cash_position),
        };

        debug!(
            meals = result.meals_delivered,
            revenue = result.revenue,
            expenses = result.expenses,
            "Scenario calculated"
        );
        result
    }
}

/// Calculates a scenario with the default elasticity model.
pub fn calculate_scenario(baseline: &BaselineMetrics, factors: &ScenarioFactors) -> CalculatedMetrics {
    ElasticityModel::default().calculate(baseline, factors)
}

/// `(adjusted - baseline) / baseline * 100`.
///
/// `0` when the baseline is not positive or the result is NaN; an overflowing
/// change saturates at the `f64` range.
pub fn percent_change(baseline: f64, adjusted: f64) -> f64 {
    if !baseline.is_finite() || baseline <= 0.0 {
        return 0.0;
    }
    saturate((adjusted - baseline) / baseline * 100.0)
}

fn multiplier(weighted_sum: f64) -> f64 {
    saturate(1.0 + weighted_sum / 100.0).max(0.0)
}

fn ratio(adjusted: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        saturate(adjusted / baseline)
    } else {
        1.0
    }
}

fn apply_gap(baseline: f64, share: f64, gap_delta: f64) -> f64 {
    let adjusted = saturate(baseline + share * gap_delta);
    // A baseline that is already negative stays where it is instead of
    // jumping to zero.
    adjusted.max(baseline.min(0.0))
}

fn sanitize(value: f64) -> f64 {
    finite_or_zero(value)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// NaN becomes `0`, infinities clamp to the finite range.
fn saturate(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(f64::MIN, f64::MAX)
    }
}

fn sanitize_baseline(baseline: &BaselineMetrics) -> BaselineMetrics {
    BaselineMetrics {
        meals_delivered: finite_or_zero(baseline.meals_delivered),
        people_served: finite_or_zero(baseline.people_served),
        cost_per_meal: finite_or_zero(baseline.cost_per_meal),
        program_efficiency: finite_or_zero(baseline.program_efficiency),
        revenue: finite_or_zero(baseline.revenue),
        expenses: finite_or_zero(baseline.expenses),
        reserves: finite_or_zero(baseline.reserves),
        cash_position: finite_or_zero(baseline.cash_position),
    }
}
