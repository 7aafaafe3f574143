mod render;
mod script;

use clap::{Parser, Subcommand};
use careplan_core::{
    Category, CoreConfig, IdGenerator, ItemCatalog, PlanStore, SequentialIdGenerator,
    SystemClock, UuidGenerator,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "careplan")]
#[command(about = "Treatment plan builder CLI")]
struct Cli {
    /// Catalog YAML file (defaults to the built-in catalog)
    #[arg(long, global = true, env = "CAREPLAN_CATALOG_PATH")]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog templates
    Catalog {
        /// Only list one category (procedure, medication, followUp)
        #[arg(long)]
        category: Option<Category>,
    },
    /// Replay a session script and print the resulting plan
    Replay {
        /// Session script (YAML)
        script: PathBuf,
        /// Print the final plan as JSON
        #[arg(long)]
        json: bool,
        /// Issue sequential ids with this prefix instead of random UUIDs
        #[arg(long)]
        id_prefix: Option<String>,
    },
}

fn load_catalog(path: Option<&PathBuf>) -> anyhow::Result<ItemCatalog> {
    let catalog = match path {
        Some(path) => ItemCatalog::from_yaml_file(path)?,
        None => ItemCatalog::builtin()?,
    };
    tracing::info!("loaded catalog with {} templates", catalog.len());
    Ok(catalog)
}

/// Main entry point for the careplan CLI
///
/// # Environment Variables
/// - `CAREPLAN_CATALOG_PATH`: catalog YAML file used when `--catalog` is not given
/// - `RUST_LOG`: log filter; `careplan=info` is always added
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("careplan=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Catalog { category }) => {
            let catalog = load_catalog(cli.catalog.as_ref())?;
            print!("{}", render::catalog(&catalog, category));
        }
        Some(Commands::Replay {
            script,
            json,
            id_prefix,
        }) => {
            let catalog = load_catalog(cli.catalog.as_ref())?;
            let ids: Arc<dyn IdGenerator> = match id_prefix {
                Some(prefix) => Arc::new(SequentialIdGenerator::new(prefix)?),
                None => Arc::new(UuidGenerator),
            };
            let mut store = PlanStore::new(
                Arc::new(CoreConfig::default()),
                Arc::new(catalog),
                ids,
                Arc::new(SystemClock),
            );

            let session = script::Script::from_file(&script)?;
            for report in script::replay(&mut store, session) {
                eprintln!("{}", report);
            }

            match store.current() {
                Some(plan) if json => println!("{}", serde_json::to_string_pretty(plan)?),
                Some(plan) => print!("{}", render::plan(plan)),
                None => println!("Script did not create a plan."),
            }
        }
        None => {
            println!("Use 'careplan --help' for commands");
        }
    }

    Ok(())
}
