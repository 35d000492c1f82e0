use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::time::Duration;
use storefront_fetch::{LazyPropsConfig, RenderMode};
use storefront_sim::prelude::*;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("storefront")
        .version(storefront_sim::VERSION)
        .about("Simulate storefront typeahead and page transitions")
        .subcommand_required(true)
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Output report as JSON"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .global(true)
                .default_value("42")
                .value_parser(value_parser!(u64))
                .help("Random seed for reproducibility"),
        )
        .subcommand(
            Command::new("typeahead")
                .about("Type a word with overlapping sequenced searches")
                .arg(
                    Arg::new("text")
                        .long("text")
                        .default_value("shoes")
                        .help("Text to type, one search per character"),
                )
                .arg(
                    Arg::new("interval-ms")
                        .long("interval-ms")
                        .default_value("30")
                        .value_parser(value_parser!(u64))
                        .help("Delay between keystrokes"),
                )
                .arg(
                    Arg::new("min-latency-ms")
                        .long("min-latency-ms")
                        .default_value("20")
                        .value_parser(value_parser!(u64))
                        .help("Fastest backend response"),
                )
                .arg(
                    Arg::new("max-latency-ms")
                        .long("max-latency-ms")
                        .default_value("200")
                        .value_parser(value_parser!(u64))
                        .help("Slowest backend response"),
                )
                .arg(
                    Arg::new("failure-rate")
                        .long("failure-rate")
                        .default_value("0.0")
                        .value_parser(parse_rate)
                        .help("Share of searches that fail, 0.0 to 1.0"),
                ),
        )
        .subcommand(
            Command::new("navigate")
                .about("Load a page through lazy props")
                .arg(
                    Arg::new("path")
                        .long("path")
                        .default_value("/p/1")
                        .help("Destination path"),
                )
                .arg(
                    Arg::new("latency-ms")
                        .long("latency-ms")
                        .default_value("120")
                        .value_parser(value_parser!(u64))
                        .help("Backend latency for the page request"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(std::path::PathBuf))
                        .help("TOML file with timeout_ms and mode"),
                )
                .arg(
                    Arg::new("timeout-ms")
                        .long("timeout-ms")
                        .value_parser(value_parser!(u64))
                        .help("Rendering deadline, overrides the config file"),
                )
                .arg(
                    Arg::new("server")
                        .long("server")
                        .action(ArgAction::SetTrue)
                        .help("Server rendering: ignore the deadline"),
                )
                .arg(
                    Arg::new("revisit")
                        .long("revisit")
                        .action(ArgAction::SetTrue)
                        .help("Navigate to the same page again afterwards"),
                )
                .arg(
                    Arg::new("fail")
                        .long("fail")
                        .action(ArgAction::SetTrue)
                        .help("Make the page request fail"),
                ),
        )
}

fn parse_rate(raw: &str) -> Result<f64, String> {
    let rate: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("{raw} is not between 0.0 and 1.0"))
    }
}

fn lazy_config(args: &ArgMatches) -> anyhow::Result<LazyPropsConfig> {
    let mut config = match args.get_one::<std::path::PathBuf>("config") {
        Some(path) => LazyPropsConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LazyPropsConfig::default(),
    };
    if let Some(&timeout_ms) = args.get_one::<u64>("timeout-ms") {
        config = config.with_timeout(Duration::from_millis(timeout_ms));
    }
    if args.get_flag("server") {
        config = config.with_mode(RenderMode::Server);
    }
    Ok(config)
}

fn print_report<R: serde::Serialize>(report: &R, text: String, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{text}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let Some((name, args)) = matches.subcommand() else {
        anyhow::bail!("missing subcommand");
    };
    let json = args.get_flag("json");
    let seed = args.get_one::<u64>("seed").copied().unwrap_or(42);

    let passed = match name {
        "typeahead" => {
            let defaults = NetworkProfile::default();
            let config = TypeaheadConfig {
                seed,
                text: args
                    .get_one::<String>("text")
                    .cloned()
                    .unwrap_or_else(|| "shoes".to_string()),
                interval_ms: args.get_one::<u64>("interval-ms").copied().unwrap_or(30),
                profile: NetworkProfile {
                    min_latency_ms: args
                        .get_one::<u64>("min-latency-ms")
                        .copied()
                        .unwrap_or(defaults.min_latency_ms),
                    max_latency_ms: args
                        .get_one::<u64>("max-latency-ms")
                        .copied()
                        .unwrap_or(defaults.max_latency_ms),
                    failure_rate: defaults.failure_rate,
                }
                .with_failure_rate(args.get_one::<f64>("failure-rate").copied().unwrap_or(0.0)),
            };
            tracing::info!(text = %config.text, seed, "running typeahead simulation");

            let report = run_typeahead(config).await;
            print_report(&report, report.generate_text(), json)?;
            report.passed()
        }
        "navigate" => {
            let config = NavigationConfig {
                seed,
                path: args
                    .get_one::<String>("path")
                    .cloned()
                    .unwrap_or_else(|| "/p/1".to_string()),
                latency_ms: args.get_one::<u64>("latency-ms").copied().unwrap_or(120),
                fail: args.get_flag("fail"),
                revisit: args.get_flag("revisit"),
                lazy: lazy_config(args)?,
            };
            tracing::info!(path = %config.path, mode = ?config.lazy.mode, "running navigation simulation");

            let report = run_navigation(config).await;
            print_report(&report, report.generate_text(), json)?;
            report.passed()
        }
        other => anyhow::bail!("unknown subcommand {other}"),
    };

    std::process::exit(if passed { 0 } else { 1 });
}
