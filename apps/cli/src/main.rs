#![deny(warnings)]

//! Headless CLI: load a launch scenario, run the forecast and print a report.

use anyhow::{bail, Context, Result};
use forecast_core::{validate_result, SimpleUsageInput, SimulationParameters};
use forecast_report::{parse_start_month, render, OutputFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "usage: forecast [--scenario PATH] [--months N] [--format table|json] [--start YYYY-MM]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    scenario: Option<PathBuf>,
    months: Option<u32>,
    format: OutputFormat,
    start: Option<String>,
    help: bool,
    version: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => parsed.scenario = it.next().map(PathBuf::from),
            "--months" => {
                let value = it.next().context("--months needs a value")?;
                parsed.months = Some(
                    value
                        .parse()
                        .with_context(|| format!("--months: '{value}' is not a month count"))?,
                );
            }
            "--format" => {
                parsed.format = it.next().context("--format needs a value")?.parse()?;
            }
            "--start" => parsed.start = it.next(),
            "-h" | "--help" => parsed.help = true,
            "-V" | "--version" => parsed.version = true,
            other => bail!("unexpected argument '{other}'\n{USAGE}"),
        }
    }
    Ok(parsed)
}

/// Scenario file: the raw parameters plus the optional one-share usage form,
/// which replaces `usageSegments` when present.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioFile {
    #[serde(flatten)]
    parameters: SimulationParameters,
    simple_usage: Option<SimpleUsageInput>,
}

impl ScenarioFile {
    fn into_parameters(self) -> SimulationParameters {
        let mut parameters = self.parameters;
        if let Some(simple) = self.simple_usage {
            parameters.usage_segments = Some(simple.segments());
        }
        parameters
    }
}

/// JSON by extension, YAML otherwise.
fn load_scenario(path: &Path) -> Result<SimulationParameters> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let file: ScenarioFile = if is_json {
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
    } else {
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
    };
    Ok(file.into_parameters())
}

fn scenario_for(args: &Args) -> Result<SimulationParameters> {
    let mut params = match &args.scenario {
        Some(path) => load_scenario(path)?,
        None => SimulationParameters::quick_start(),
    };
    if let Some(months) = args.months {
        params.horizon_months = Some(f64::from(months));
    }
    Ok(params)
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }
    if args.version {
        println!(
            "forecast {} ({})",
            env!("CARGO_PKG_VERSION"),
            env!("FORECAST_GIT_SHA")
        );
        return Ok(());
    }
    info!(scenario = ?args.scenario, months = ?args.months, format = ?args.format, "starting forecast");

    let start = args.start.as_deref().map(parse_start_month).transpose()?;
    let params = scenario_for(&args)?;
    let result = forecast_engine::simulate(&params);
    validate_result(&result).context("forecast result failed validation")?;

    println!("{}", render(&result, args.format, start)?);
    info!(
        months = result.normalized_parameters.horizon_months,
        risks = result.risks.len(),
        break_even_month = ?result.summary.break_even_month,
        "forecast complete"
    );
    Ok(())
}
