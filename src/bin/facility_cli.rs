use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use facility_codes::{
    config::{self, AppConfig},
    db::{self, DbPool},
    floors::{sorted_floors, FloorOrder},
    frequency::most_frequent,
    orders::OrderKind,
    repositories::SeaOrmStore,
    services::{AssetTagService, OpenOrderRequest, OrderNumberService, RegisterAssetRequest},
    tags::{TagGenerator, TagSettings},
};
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize()?;

    match cli.command {
        Commands::Tag(args) => handle_tag(&context, args, cli.json)?,
        Commands::SortFloors(args) => handle_sort_floors(args, cli.json)?,
        Commands::Frequency(args) => handle_frequency(args, cli.json)?,
        Commands::Migrate => handle_migrate(&context, cli.json).await?,
        Commands::RegisterAsset(args) => handle_register_asset(&context, args, cli.json).await?,
        Commands::OpenOrder(args) => handle_open_order(&context, args, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "facility-cli",
    about = "Asset tags and maintenance order codes for facility records",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview the tag an asset would receive
    Tag(TagArgs),
    /// Order floor labels from top to bottom
    SortFloors(SortFloorsArgs),
    /// Most common recurrence label
    Frequency(FrequencyArgs),
    /// Apply pending database migrations
    Migrate,
    /// Register an asset and allocate its tag
    RegisterAsset(RegisterAssetArgs),
    /// Open a maintenance order and allocate its code
    OpenOrder(OpenOrderArgs),
}

#[derive(Args)]
struct TagArgs {
    #[arg(long, help = "Asset name, e.g. \"Bomba de recalque\"")]
    asset: String,
    #[arg(long, help = "Floor name, e.g. \"Térreo\" or \"Subsolo 2\"")]
    floor: String,
    #[arg(long, help = "Location name")]
    location: String,
    #[arg(long, default_value_t = 0, help = "Tags already issued under the same prefix")]
    count: u64,
}

#[derive(Args)]
struct SortFloorsArgs {
    #[arg(long, action = ArgAction::SetTrue, help = "Lowest floor first")]
    bottom_up: bool,
    #[arg(required = true)]
    labels: Vec<String>,
}

#[derive(Args)]
struct FrequencyArgs {
    labels: Vec<String>,
}

#[derive(Args)]
struct RegisterAssetArgs {
    #[arg(long)]
    location_id: Uuid,
    #[arg(long)]
    name: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Preventive,
    Corrective,
}

impl From<KindArg> for OrderKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Preventive => OrderKind::Preventive,
            KindArg::Corrective => OrderKind::Corrective,
        }
    }
}

#[derive(Args)]
struct OpenOrderArgs {
    #[arg(long, help = "Contract acronym")]
    contract: String,
    #[arg(long, value_enum)]
    kind: KindArg,
    #[arg(long)]
    asset_id: Option<Uuid>,
}

/// Owns configuration for every command and the database client for those
/// that persist anything.
struct CliContext {
    config: AppConfig,
}

impl CliContext {
    fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);
        debug!(environment = %config.environment, "CLI configuration loaded");
        Ok(Self { config })
    }

    async fn connect(&self) -> Result<Arc<DbPool>> {
        let pool = db::establish_connection_from_app_config(&self.config)
            .await
            .context("failed to connect to database")?;
        if self.config.auto_migrate {
            db::run_migrations(&pool)
                .await
                .context("failed to apply migrations")?;
        }
        Ok(Arc::new(pool))
    }

    async fn store(&self) -> Result<Arc<SeaOrmStore>> {
        Ok(Arc::new(SeaOrmStore::new(self.connect().await?)))
    }

    fn tag_generator(&self) -> TagGenerator {
        TagGenerator::new(TagSettings::from(self.config.identifiers()))
    }
}

fn handle_tag(context: &CliContext, args: TagArgs, json: bool) -> Result<()> {
    let tag = context
        .tag_generator()
        .generate(&args.asset, &args.floor, &args.location, args.count);

    if json {
        print_json(&json!({ "tag": tag }))?;
    } else {
        println!("{}", tag);
    }
    Ok(())
}

fn handle_sort_floors(args: SortFloorsArgs, json: bool) -> Result<()> {
    let order = if args.bottom_up {
        FloorOrder::BottomUp
    } else {
        FloorOrder::TopDown
    };
    let sorted = sorted_floors(&args.labels, order);

    if json {
        print_json(&sorted)?;
    } else {
        for label in sorted {
            println!("{}", label);
        }
    }
    Ok(())
}

fn handle_frequency(args: FrequencyArgs, json: bool) -> Result<()> {
    let label = most_frequent(&args.labels);

    if json {
        print_json(&json!({ "frequency": label }))?;
    } else {
        println!("{}", label);
    }
    Ok(())
}

async fn handle_migrate(context: &CliContext, json: bool) -> Result<()> {
    let pool = db::establish_connection_from_app_config(&context.config)
        .await
        .context("failed to connect to database")?;
    db::run_migrations(&pool)
        .await
        .context("failed to apply migrations")?;

    if json {
        print_json(&json!({ "migrated": true }))?;
    } else {
        println!("Migrations applied");
    }
    Ok(())
}

async fn handle_register_asset(
    context: &CliContext,
    args: RegisterAssetArgs,
    json: bool,
) -> Result<()> {
    let service = AssetTagService::from_config(context.store().await?, context.config.identifiers());
    let registered = service
        .register_asset(RegisterAssetRequest {
            location_id: args.location_id,
            name: args.name,
        })
        .await
        .context("failed to register asset")?;

    if json {
        print_json(&registered)?;
    } else {
        println!("Asset {} tagged {}", registered.id, registered.tag);
    }
    Ok(())
}

async fn handle_open_order(context: &CliContext, args: OpenOrderArgs, json: bool) -> Result<()> {
    let service =
        OrderNumberService::from_config(context.store().await?, context.config.identifiers());
    let opened = service
        .open_order(OpenOrderRequest {
            contract_acronym: args.contract,
            kind: args.kind.into(),
            asset_id: args.asset_id,
        })
        .await
        .context("failed to open maintenance order")?;

    if json {
        print_json(&opened)?;
    } else {
        println!("Order {} opened as {} ({})", opened.id, opened.code, opened.kind);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
