//! Deal Gap preview tool
//!
//! Reads a saved-property JSON file and prints quick breakeven estimates for
//! every strategy plus the deal opportunity score. With `--calculate` it also
//! runs one worksheet against the calculation service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dealgap_worksheet::{
    Config, DefaultsCache, HttpCalculationClient, InMemoryPreviewStore, WorksheetBuilder, WorksheetStatus,
};
use shared::worksheets::{
    BrrrrWorksheet, FlipWorksheet, HouseHackWorksheet, LtrWorksheet, StrategyConfig, StrWorksheet,
    WholesaleWorksheet,
};
use shared::{
    estimate, format_currency, score_opportunity, verdict_for_score, AssumptionSet, ListingAvailability,
    SavedProperty, StrategyId,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "dealgap-preview", about = "Quick deal estimates for a saved property")]
struct Cli {
    /// Saved property JSON file
    property_file: PathBuf,

    /// Run a full worksheet calculation for this strategy (ltr, str, brrrr, flip, house_hack, wholesale)
    #[arg(long)]
    calculate: Option<String>,

    /// Use built-in assumptions instead of fetching defaults
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dealgap_preview=debug,dealgap_worksheet=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;
    tracing::info!("Environment: {}", config.environment);

    let raw = std::fs::read_to_string(&cli.property_file)
        .with_context(|| format!("reading {}", cli.property_file.display()))?;
    let property: SavedProperty = serde_json::from_str(&raw).context("parsing saved property")?;

    let client = HttpCalculationClient::new(&config.api)?;
    let assumptions = if cli.offline {
        AssumptionSet::default()
    } else {
        let mut defaults = DefaultsCache::new(config.worksheet.defaults_ttl());
        match defaults.get_or_refresh(&client).await {
            Ok(assumptions) => assumptions,
            Err(e) => {
                tracing::warn!(error = %e, "Using built-in assumptions");
                AssumptionSet::default()
            }
        }
    };

    print_estimates(&property, &assumptions);

    if let Some(name) = cli.calculate.as_deref() {
        let strategy = StrategyId::parse(name).with_context(|| format!("unknown strategy '{}'", name))?;
        run_worksheet(strategy, &assumptions, &config, client, property).await?;
    }

    Ok(())
}

fn print_estimates(property: &SavedProperty, assumptions: &AssumptionSet) {
    let facts = property.facts();
    let availability = property
        .listing_status
        .as_deref()
        .map(ListingAvailability::parse)
        .unwrap_or_default();

    println!("{}", property.address.as_deref().unwrap_or("Saved property"));
    println!("List price: {}", format_currency(facts.list_price));
    println!();
    println!("{:<20} {:>14} {:>14} {:>6}", "Strategy", "Breakeven", "Buy price", "Score");

    for strategy in StrategyId::ALL {
        let estimate = estimate(strategy, &facts, assumptions);
        let score = score_opportunity(
            estimate.breakeven_price,
            estimate.list_price,
            availability,
            property.days_on_market,
        );
        let breakeven = if estimate.can_break_even {
            format_currency(estimate.breakeven_price)
        } else {
            "no breakeven".to_string()
        };
        println!(
            "{:<20} {:>14} {:>14} {:>3} {}",
            strategy.display_name(),
            breakeven,
            format_currency(estimate.buy_price),
            score.score,
            score.grade,
        );
    }
}

async fn run_worksheet(
    strategy: StrategyId,
    assumptions: &AssumptionSet,
    config: &Config,
    client: HttpCalculationClient,
    property: SavedProperty,
) -> anyhow::Result<()> {
    let assumptions = assumptions.sanitized();
    match strategy {
        StrategyId::Ltr => calculate(LtrWorksheet::new(assumptions), config, client, property).await,
        StrategyId::Str => calculate(StrWorksheet::new(assumptions), config, client, property).await,
        StrategyId::Brrrr => calculate(BrrrrWorksheet::new(assumptions), config, client, property).await,
        StrategyId::Flip => calculate(FlipWorksheet::new(assumptions), config, client, property).await,
        StrategyId::HouseHack => calculate(HouseHackWorksheet::new(assumptions), config, client, property).await,
        StrategyId::Wholesale => calculate(WholesaleWorksheet::new(assumptions), config, client, property).await,
    }
}

async fn calculate<C: StrategyConfig>(
    worksheet: C,
    config: &Config,
    client: HttpCalculationClient,
    property: SavedProperty,
) -> anyhow::Result<()> {
    let name = worksheet.strategy_name();
    let settings = dealgap_worksheet::WorksheetSettings {
        calculate_on_seed: true,
        ..config.worksheet.clone()
    };
    let handle = WorksheetBuilder::new(worksheet, Arc::new(client))
        .settings(settings)
        .previews(Arc::new(InMemoryPreviewStore::new()))
        .spawn();

    handle.seed(property).await?;
    let state = handle.settled().await?;

    println!();
    println!("{} worksheet", name);
    if state.status == WorksheetStatus::Error {
        if let Some(error) = &state.error {
            println!("  {}", error.banner_message());
        }
        return Ok(());
    }

    let metrics = handle.metrics();
    if let Some(message) = metrics.empty_message() {
        println!("  {}", message);
    }
    for metric in metrics.metrics() {
        println!("  {:<24} {}", metric.label, metric.value);
    }

    if let Some(data) = &state.data {
        if data.contains("deal_score") {
            let verdict = verdict_for_score(data.number("deal_score"));
            println!("  Verdict: {} ({})", verdict.label, verdict.color.as_str());
        }
    }
    Ok(())
}
