use agronond::{
    config::{commission, database},
    core::{report, settings},
    errors::Result,
};
use chrono::Utc;
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load commission configuration
    let config = commission::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    let configured_rates = config.commission.rates()?;

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Settings may override the configured rates
    let rates = settings::active_commission_rates(&db, &configured_rates).await?;
    info!(
        farmer_rate = %rates.farmer(),
        trader_rate = %rates.trader(),
        "Commission rates in force"
    );

    // 6. Today's settlement report
    let daily = report::generate_daily_report(&db, Utc::now().date_naive()).await?;
    println!("{}", report::format_daily_report(&daily));

    Ok(())
}
