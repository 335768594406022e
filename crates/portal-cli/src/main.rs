//! `portal` - agency portal activity and billing core from the command line

mod fixture;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use fixture::Fixture;
use portal_activity::{FeedConfig, FeedQuery, FixedClock, Role};
use portal_billing::error::check_hours;
use portal_billing::{classify_hour_usage, resolve_billing_period, PaymentSchedule};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn cli() -> Command {
    Command::new("portal")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Agency portal activity feed and retainer billing")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Feed configuration (YAML)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("feed")
                .about("Build an activity feed from a JSON fixture")
                .arg(
                    Arg::new("fixture")
                        .long("fixture")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Fixture with companies and raw records"),
                )
                .arg(
                    Arg::new("company")
                        .long("company")
                        .required(true)
                        .help("Company id"),
                )
                .arg(
                    Arg::new("role")
                        .long("role")
                        .default_value("team")
                        .value_parser(["team", "client"])
                        .help("Viewer role"),
                )
                .arg(
                    Arg::new("types")
                        .long("types")
                        .value_delimiter(',')
                        .help("Comma-separated activity type allow-list"),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize))
                        .help("Page size"),
                )
                .arg(
                    Arg::new("offset")
                        .long("offset")
                        .value_parser(value_parser!(usize))
                        .help("Filtered items to skip"),
                )
                .arg(
                    Arg::new("days-back")
                        .long("days-back")
                        .value_parser(value_parser!(u32))
                        .help("Window size in days"),
                )
                .arg(
                    Arg::new("now")
                        .long("now")
                        .value_parser(value_parser!(DateTime<Utc>))
                        .help("Evaluate the window at this instant (RFC 3339)"),
                ),
        )
        .subcommand(
            Command::new("billing")
                .about("Resolve the billing cycle containing a date")
                .arg(
                    Arg::new("date")
                        .long("date")
                        .required(true)
                        .value_parser(value_parser!(NaiveDate))
                        .help("Date (YYYY-MM-DD)"),
                )
                .arg(
                    Arg::new("schedule")
                        .long("schedule")
                        .value_parser(value_parser!(PaymentSchedule))
                        .help("Payment schedule: 1st or 15th"),
                ),
        )
        .subcommand(
            Command::new("hours")
                .about("Classify hour usage")
                .arg(
                    Arg::new("used")
                        .long("used")
                        .required(true)
                        .value_parser(value_parser!(f64))
                        .help("Hours used"),
                )
                .arg(
                    Arg::new("allocated")
                        .long("allocated")
                        .required(true)
                        .value_parser(value_parser!(f64))
                        .help("Hours allocated; 0 for no cap"),
                ),
        )
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(layer).init();
    }
}

fn load_config(args: &ArgMatches) -> anyhow::Result<FeedConfig> {
    match args.get_one::<PathBuf>("config") {
        Some(path) => Ok(FeedConfig::from_path(path)?),
        None => Ok(FeedConfig::default()),
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn feed_query(args: &ArgMatches) -> FeedQuery {
    FeedQuery {
        days_back: args.get_one::<u32>("days-back").copied(),
        type_filter: args
            .get_many::<String>("types")
            .map(|types| types.cloned().collect()),
        limit: args.get_one::<usize>("limit").copied(),
        offset: args.get_one::<usize>("offset").copied(),
        ..FeedQuery::new(
            args.get_one::<String>("company")
                .cloned()
                .unwrap_or_default(),
        )
    }
}

async fn run_feed(args: &ArgMatches, config: FeedConfig) -> anyhow::Result<()> {
    let path = args
        .get_one::<PathBuf>("fixture")
        .context("--fixture is required")?;
    let role: Role = args
        .get_one::<String>("role")
        .map_or(Ok(Role::Team), |r| r.parse())
        .map_err(anyhow::Error::msg)?;

    let mut service = Fixture::load(path)?.into_service(config)?;
    if let Some(now) = args.get_one::<DateTime<Utc>>("now") {
        service = service.with_clock(Arc::new(FixedClock(*now)));
    }

    let feed = service
        .query(feed_query(args), role)
        .await
        .context("building feed")?;
    for warning in &feed.warnings {
        tracing::warn!(%warning, "partial feed");
    }
    print_json(&feed)
}

fn run_billing(args: &ArgMatches) -> anyhow::Result<()> {
    let date = args
        .get_one::<NaiveDate>("date")
        .context("--date is required")?;
    let cycle = resolve_billing_period(*date, args.get_one::<PaymentSchedule>("schedule").copied());
    print_json(&cycle)
}

fn run_hours(args: &ArgMatches) -> anyhow::Result<()> {
    let used = *args.get_one::<f64>("used").context("--used is required")?;
    let allocated = *args
        .get_one::<f64>("allocated")
        .context("--allocated is required")?;
    check_hours("used", used)?;
    check_hours("allocated", allocated)?;
    print_json(&classify_hour_usage(used, allocated))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let config = load_config(&matches).context("loading configuration")?;

    match matches.subcommand() {
        Some(("feed", args)) => run_feed(args, config).await,
        Some(("billing", args)) => run_billing(args),
        Some(("hours", args)) => run_hours(args),
        _ => anyhow::bail!("no subcommand given; see --help"),
    }
}
