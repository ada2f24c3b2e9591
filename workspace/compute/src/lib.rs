pub mod debounce;
pub mod donations;
pub mod error;
pub mod scenario;

use scenario::ElasticityModel;

pub use donations::{aggregate_by_month, month_over_month_growth, summarize};
pub use scenario::{calculate_scenario, percent_change, ScenarioModel};

/// Returns the scenario model used by the dashboard.
///
/// Every caller that has no reason to tune elasticities should go through this
/// so the API, the CLI and the debounced recalculation agree on the numbers.
pub fn default_model() -> ElasticityModel {
    ElasticityModel::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{BaselineMetrics, Factor, ScenarioFactors};

    #[test]
    fn test_default_model_matches_calculate_scenario() {
        let baseline = BaselineMetrics::fy2024_25();
        let factors = ScenarioFactors::default()
            .with(Factor::EconomicGrowth, 3.0)
            .with(Factor::ExchangeRate, 8.0);

        assert_eq!(
            default_model().calculate(&baseline, &factors),
            calculate_scenario(&baseline, &factors)
        );
    }
}
