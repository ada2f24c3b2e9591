use std::fmt::Write;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::ValueEnum;
use common::format::{DEFAULT_CURRENCY, MetricKind, format_change, format_metric};
use common::{BaselineMetrics, CalculatedMetrics, Factor, ScenarioFactors};
use compute::debounce::ScenarioRecalculator;
use compute::{calculate_scenario, default_model};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

/// Parses `name=value`, e.g. `food-prices=12.5`.
pub fn parse_assignment(raw: &str) -> Result<(Factor, f64)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got '{}'", raw))?;
    let factor: Factor = name.trim().parse().map_err(|e: String| anyhow!(e))?;
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("invalid value for {}", factor))?;
    if !value.is_finite() {
        bail!("value for {} must be a finite number", factor);
    }
    Ok((factor, value))
}

pub fn apply_assignments(mut factors: ScenarioFactors, raw: &[String]) -> Result<ScenarioFactors> {
    for assignment in raw {
        let (factor, value) = parse_assignment(assignment)?;
        factors.set(factor, value);
    }
    Ok(factors)
}

pub fn render(result: &CalculatedMetrics, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)? + "\n"),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(result)?),
        OutputFormat::Table => {
            let mut out = String::new();
            for kind in MetricKind::ALL {
                let (value, change) = result.metric(kind);
                writeln!(
                    out,
                    "{:<20} {:>22} {:>9}",
                    kind.label(),
                    format_metric(value, kind.format(), DEFAULT_CURRENCY),
                    format_change(change)
                )?;
            }
            Ok(out)
        }
    }
}

pub async fn run_scenario(
    assignments: &[String],
    format: OutputFormat,
    interactive: bool,
    debounce_ms: u64,
) -> Result<()> {
    trace!("Entering run_scenario function");
    let baseline = BaselineMetrics::fy2024_25();
    let factors = apply_assignments(ScenarioFactors::default(), assignments)?;
    debug!("Scenario factors: {:?}", factors);

    if !interactive {
        print!("{}", render(&calculate_scenario(&baseline, &factors), format)?);
        return Ok(());
    }

    let recalculator = ScenarioRecalculator::new(
        Box::new(default_model()),
        baseline,
        Duration::from_millis(debounce_ms),
    );
    let mut results = recalculator.subscribe();
    print!("{}", render(&calculate_scenario(&baseline, &factors), format)?);
    recalculator.update(factors)?;

    let printer = tokio::spawn(async move {
        while results.changed().await.is_ok() {
            let result = *results.borrow_and_update();
            match render(&result, format) {
                Ok(text) => println!("{}", text),
                Err(e) => warn!("Failed to render scenario: {}", e),
            }
        }
    });

    info!("Reading NAME=VALUE lines from stdin, Ctrl-D to finish");
    let mut current = factors;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_assignment(line) {
            Ok((factor, value)) => {
                current.set(factor, value);
                recalculator.update(current)?;
            }
            Err(e) => eprintln!("{}", e),
        }
    }

    // Closing the input flushes the last pending change.
    drop(recalculator);
    printer.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment_spellings() {
        assert_eq!(
            parse_assignment("food-prices=12.5").unwrap(),
            (Factor::FoodPrices, 12.5)
        );
        assert_eq!(
            parse_assignment(" donorSentiment = -5 ").unwrap(),
            (Factor::DonorSentiment, -5.0)
        );
        assert!(parse_assignment("food-prices").is_err());
        assert!(parse_assignment("moon-phase=3").is_err());
        assert!(parse_assignment("inflation=abc").is_err());
        assert!(parse_assignment("inflation=NaN").is_err());
    }

    #[test]
    fn test_later_assignments_win() {
        let raw = vec!["inflation=5".to_string(), "inflation=8".to_string()];
        let factors = apply_assignments(ScenarioFactors::default(), &raw).unwrap();

        assert_eq!(factors.inflation_rate, 8.0);
    }

    #[test]
    fn test_render_formats() {
        let baseline = BaselineMetrics::fy2024_25();
        let result = calculate_scenario(&baseline, &ScenarioFactors::default());

        let table = render(&result, OutputFormat::Table).unwrap();
        assert_eq!(table.lines().count(), MetricKind::ALL.len());
        assert!(table.contains("367,490,721"));
        assert!(table.contains("EGP 6.36"));

        let json: serde_json::Value =
            serde_json::from_str(&render(&result, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["mealsDelivered"], 367_490_721.0);

        let yaml = render(&result, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("costPerMeal: 6.36"));
    }
}
