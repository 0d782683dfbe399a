use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tier_rewards_core::{AppConfig, ConfigLoader, Network, RateRepository};
use tier_rewards_data::{
    ConversionRateRepository, DatabaseClient, LevelGraphRepository, NetworkRewardRepository,
    UserRepository,
};
use tier_rewards_distribution::RewardDistributor;
use tier_rewards_rates::{pricing, ConversionRateStore, PriceOracle};
use tier_rewards_web_api::{ApiServer, AppState};

#[derive(Parser)]
#[command(name = "tier-rewards")]
#[command(about = "Reward conversion and distribution platform", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web API server
    Serve {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Server address override (host:port)
        #[arg(short, long)]
        addr: Option<String>,
    },
    /// Write the built-in default rates for any network missing a row
    SeedRates {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Pull live oracle quotes into the conversion rate table
    RefreshRates {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Print the dynamic upgrade price for a tier
    TierPrice {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Tier number (1..=5)
        #[arg(short, long)]
        tier: i16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, addr } => {
            run_server(&config, addr.as_deref()).await?;
        }
        Commands::SeedRates { config } => {
            run_seed_rates(&config).await?;
        }
        Commands::RefreshRates { config } => {
            run_refresh_rates(&config).await?;
        }
        Commands::TierPrice { config, tier } => {
            run_tier_price(&config, tier).await?;
        }
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> Result<DatabaseClient> {
    tracing::info!("Connecting to database");
    DatabaseClient::connect(&config.database.url, config.database.max_connections).await
}

fn build_state(config: &AppConfig, db: &DatabaseClient) -> Result<Arc<AppState>> {
    let rate_repo: Arc<dyn RateRepository> = Arc::new(ConversionRateRepository::new(db.pool()));
    let rates = Arc::new(
        ConversionRateStore::new(rate_repo.clone()).with_ttl(config.rates.ttl_secs),
    );
    let oracle = Arc::new(PriceOracle::new(
        &config.oracle.base_url,
        config.oracle.timeout_secs,
    )?);
    let distributor =
        RewardDistributor::new().with_policy(config.distribution.missing_rate.clone().into());

    Ok(Arc::new(AppState {
        rates,
        rate_repo,
        rewards: Arc::new(NetworkRewardRepository::new(db.pool())),
        ledger: Arc::new(UserRepository::new(db.pool())),
        graphs: Arc::new(LevelGraphRepository::new(db.pool())),
        oracle,
        distributor,
    }))
}

async fn run_server(config_path: &str, addr_override: Option<&str>) -> Result<()> {
    let config = ConfigLoader::load_from(config_path)?;
    let db = connect(&config).await?;
    let state = build_state(&config, &db)?;

    let addr = addr_override.map_or_else(
        || format!("{}:{}", config.server.host, config.server.port),
        ToString::to_string,
    );

    ApiServer::new(state).serve(&addr).await
}

async fn run_seed_rates(config_path: &str) -> Result<()> {
    let config = ConfigLoader::load_from(config_path)?;
    let db = connect(&config).await?;
    let repo = ConversionRateRepository::new(db.pool());

    let existing: Vec<Network> = repo
        .fetch_all()
        .await?
        .into_iter()
        .map(|r| r.network)
        .collect();

    let mut seeded = 0;
    for network in Network::ALL {
        if existing.contains(&network) {
            continue;
        }
        let rate = network.default_usd_rate();
        repo.upsert(network, rate).await?;
        tracing::info!(%network, %rate, "Seeded default rate");
        seeded += 1;
    }

    println!("Seeded {seeded} network(s)");
    Ok(())
}

async fn run_refresh_rates(config_path: &str) -> Result<()> {
    let config = ConfigLoader::load_from(config_path)?;
    let db = connect(&config).await?;
    let repo = ConversionRateRepository::new(db.pool());
    let oracle = PriceOracle::new(&config.oracle.base_url, config.oracle.timeout_secs)?;

    let updated = oracle.persist_live_rates(&repo).await?;
    println!("Updated {updated} network(s) from live quotes");
    Ok(())
}

async fn run_tier_price(config_path: &str, tier: i16) -> Result<()> {
    let config = ConfigLoader::load_from(config_path)?;
    let db = connect(&config).await?;
    let state = build_state(&config, &db)?;

    let records = state.rewards.list_active().await?;
    let rates = state.rates.get_rates().await;
    let price = pricing::price_for_tier(tier, &records, &rates);

    println!("Tier {tier} price: ${price}");
    Ok(())
}
