//! Latest-value-wins debouncing.
//!
//! Input lands in a single `watch` slot, so a burst of updates collapses to the
//! newest one. A background task publishes that value once no further update
//! has arrived for the quiet period. Stale values are superseded, never
//! cancelled mid-flight, because the work behind them is synchronous.

use std::time::Duration;

use common::{BaselineMetrics, CalculatedMetrics, ScenarioFactors};
use tokio::sync::watch;
use tracing::{debug, instrument, trace};

use crate::error::{ComputeError, Result};
use crate::scenario::ScenarioModel;

/// Quiet period the dashboard waits after the last slider movement.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(50);

/// Publishes the latest pushed value after `quiet_period` without changes.
///
/// Must be created inside a Tokio runtime. Dropping the debouncer flushes a
/// still pending value to subscribers and stops the background task.
pub struct Debouncer<T> {
    input: watch::Sender<T>,
    output: watch::Receiver<T>,
    quiet_period: Duration,
}

impl<T> Debouncer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(initial: T, quiet_period: Duration) -> Self {
        let (input, input_rx) = watch::channel(initial.clone());
        let (output_tx, output) = watch::channel(initial);

        tokio::spawn(settle_loop(input_rx, output_tx, quiet_period));

        Self {
            input,
            output,
            quiet_period,
        }
    }

    /// Replaces the pending value and restarts the quiet period.
    pub fn push(&self, value: T) -> Result<()> {
        trace!("Debouncer received a new value");
        self.input
            .send(value)
            .map_err(|_| ComputeError::Debounce("settle task is no longer running".to_string()))
    }

    /// Receiver of settled values. Starts out holding the latest settled value.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.clone()
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }
}

async fn settle_loop<T>(mut input: watch::Receiver<T>, output: watch::Sender<T>, quiet_period: Duration)
where
    T: Clone + Send + Sync + 'static,
{
    loop {
        if input.changed().await.is_err() {
            trace!("Debouncer input closed while idle");
            return;
        }

        let closed = loop {
            match tokio::time::timeout(quiet_period, input.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) => break true,
                Err(_) => break false,
            }
        };

        let latest = input.borrow_and_update().clone();
        if output.send(latest).is_err() || closed {
            debug!(closed, "Debouncer settle task finished");
            return;
        }
    }
}

/// Recomputes a scenario whenever the factors settle.
///
/// Subscribers always see a result computed from a complete set of factors;
/// intermediate values of a burst are never calculated.
pub struct ScenarioRecalculator {
    debouncer: Debouncer<ScenarioFactors>,
    metrics: watch::Receiver<CalculatedMetrics>,
    baseline: BaselineMetrics,
}

impl ScenarioRecalculator {
    /// Must be called inside a Tokio runtime.
    #[instrument(skip(model))]
    pub fn new(
        model: Box<dyn ScenarioModel + Send + Sync>,
        baseline: BaselineMetrics,
        quiet_period: Duration,
    ) -> Self {
        let neutral = model.calculate(&baseline, &ScenarioFactors::default());
        let debouncer = Debouncer::new(ScenarioFactors::default(), quiet_period);
        let mut settled = debouncer.subscribe();
        let (metrics_tx, metrics) = watch::channel(neutral);

        tokio::spawn(async move {
            while settled.changed().await.is_ok() {
                let factors = *settled.borrow_and_update();
                let result = model.calculate(&baseline, &factors);
                if metrics_tx.send(result).is_err() {
                    break;
                }
            }
            trace!("Scenario recalculation task finished");
        });

        debug!(?quiet_period, "Scenario recalculator started");
        Self {
            debouncer,
            metrics,
            baseline,
        }
    }

    /// Default elasticity model and the dashboard's quiet period.
    pub fn with_defaults(baseline: BaselineMetrics) -> Self {
        Self::new(Box::new(crate::default_model()), baseline, DEFAULT_QUIET_PERIOD)
    }

    pub fn update(&self, factors: ScenarioFactors) -> Result<()> {
        self.debouncer.push(factors)
    }

    pub fn subscribe(&self) -> watch::Receiver<CalculatedMetrics> {
        self.metrics.clone()
    }

    pub fn baseline(&self) -> &BaselineMetrics {
        &self.baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Factor;
    use tokio::time::{Instant, sleep};

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_last_value() {
        let debouncer = Debouncer::new(0u32, Duration::from_millis(50));
        let mut rx = debouncer.subscribe();
        let start = Instant::now();

        debouncer.push(1).unwrap();
        sleep(Duration::from_millis(10)).await;
        debouncer.push(2).unwrap();
        sleep(Duration::from_millis(10)).await;
        debouncer.push(3).unwrap();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 3);
        assert!(start.elapsed() >= Duration::from_millis(70));
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_published_before_quiet_period() {
        let debouncer = Debouncer::new(0u32, Duration::from_millis(50));
        let rx = debouncer.subscribe();

        debouncer.push(9).unwrap();
        sleep(Duration::from_millis(30)).await;

        assert_eq!(*rx.borrow(), 0);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separated_updates_are_each_published() {
        let debouncer = Debouncer::new(0u32, Duration::from_millis(50));
        let mut rx = debouncer.subscribe();

        debouncer.push(1).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);

        sleep(Duration::from_millis(200)).await;
        debouncer.push(2).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_flushes_pending_value() {
        let debouncer = Debouncer::new(0u32, Duration::from_secs(10));
        let mut rx = debouncer.subscribe();

        debouncer.push(5).unwrap();
        drop(debouncer);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 5);
        assert!(rx.changed().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recalculator_starts_with_neutral_result() {
        let baseline = BaselineMetrics::fy2024_25();
        let recalculator = ScenarioRecalculator::with_defaults(baseline);
        let rx = recalculator.subscribe();

        let initial = *rx.borrow();
        assert_eq!(initial.values(), baseline);
        assert_eq!(initial.cost_per_meal_change, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recalculator_publishes_settled_factors() {
        let baseline = BaselineMetrics::fy2024_25();
        let recalculator = ScenarioRecalculator::with_defaults(baseline);
        let mut rx = recalculator.subscribe();

        for value in [2.0, 4.0, 6.0, 8.0, 10.0] {
            recalculator
                .update(ScenarioFactors::default().with(Factor::FoodPrices, value))
                .unwrap();
            sleep(Duration::from_millis(5)).await;
        }

        rx.changed().await.unwrap();
        let result = *rx.borrow_and_update();
        let expected = crate::scenario::calculate_scenario(
            &baseline,
            &ScenarioFactors::default().with(Factor::FoodPrices, 10.0),
        );

        assert_eq!(result, expected);
        assert!(result.cost_per_meal > baseline.cost_per_meal);
    }
}
