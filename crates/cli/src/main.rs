//! Storefront sync CLI - drive the catalog, cart and session stores.
//!
//! # Usage
//!
//! ```bash
//! # List discounted products, cheapest first
//! sfs catalog list --discounted --sort asc
//!
//! # Put two lamps in the cart
//! sfs cart add 3 Lamp
//! sfs cart set 3 2
//!
//! # Sign in; the saved cart for the user is loaded
//! sfs auth login bob 1234
//! ```
//!
//! # Commands
//!
//! - `catalog` - List, search and administer products
//! - `cart` - Inspect and change the cart
//! - `auth` - Sign in, register, sign out and show the session
//!
//! Every invocation restores the previous session from the storage file,
//! runs one command and prints a JSON result on stdout. Logs go to stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_sync::Storefront;
use storefront_sync::config::SyncConfig;
use storefront_sync_core::SortOrder;

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "sfs")]
#[command(author, version, about = "Storefront state sync tools")]
struct Cli {
    /// Storage file, overriding `SFS_STORAGE_PATH`
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and administer the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Inspect and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the session
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products with their final prices
    List {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Only active products
        #[arg(long)]
        active: bool,

        /// Only discounted products
        #[arg(long)]
        discounted: bool,

        /// Lowest price (inclusive)
        #[arg(long)]
        min: Option<Decimal>,

        /// Highest price (inclusive)
        #[arg(long)]
        max: Option<Decimal>,

        /// Order by price (`asc` or `desc`)
        #[arg(short, long)]
        sort: Option<SortOrder>,
    },
    /// Search products by name
    Search {
        query: String,
    },
    /// Show one product
    Show {
        id: String,
    },
    /// Catalog summary figures
    Stats,
    /// Add a product (kept for this invocation only)
    Add {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        price: Decimal,

        /// Discount percentage
        #[arg(short, long, default_value = "0")]
        discount: Decimal,

        #[arg(short, long)]
        category: Option<String>,

        /// Add the product as inactive
        #[arg(long)]
        inactive: bool,
    },
    /// Change fields of a product (kept for this invocation only)
    Update {
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        price: Option<Decimal>,

        #[arg(short, long)]
        discount: Option<Decimal>,

        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete a product (kept for this invocation only)
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show lines and totals
    Show,
    /// Add one of a product
    Add {
        id: String,
        /// Name stored on the line; defaults to the catalog name
        name: Option<String>,
    },
    /// Remove one of a product
    Decrease {
        id: String,
    },
    /// Remove a product's line
    Remove {
        id: String,
    },
    /// Set a product's quantity; zero or less removes the line
    Set {
        id: String,
        #[arg(allow_negative_numbers = true)]
        count: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Sign in
    Login {
        username: String,
        password: String,
    },
    /// Create an account and sign in
    Register {
        username: String,
        email: String,
        password: String,
    },
    /// Sign out, saving the cart for next time
    Logout,
    /// Show the current session
    Status,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &SyncConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Report a failure that happens before tracing is set up.
#[allow(clippy::print_stderr)]
fn exit_before_logging(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(2);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match SyncConfig::from_env() {
        Ok(config) => config,
        Err(e) => exit_before_logging(&format!("Failed to load configuration: {e}")),
    };
    if let Some(path) = cli.storage.clone() {
        config.storage_path = path;
    }

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so stdout carries only JSON
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront_sync=info,storefront_sync_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &SyncConfig) -> Result<(), CliError> {
    let app = Storefront::from_config(config)?;
    app.bootstrap().await;

    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::List {
                category,
                active,
                discounted,
                min,
                max,
                sort,
            } => {
                let filter = commands::catalog::ListFilter {
                    category,
                    active,
                    discounted,
                    min,
                    max,
                    sort,
                };
                commands::catalog::list(&app, filter).await?;
            }
            CatalogAction::Search { query } => commands::catalog::search(&app, &query).await?,
            CatalogAction::Show { id } => commands::catalog::show(&app, &id).await?,
            CatalogAction::Stats => commands::catalog::stats(&app).await?,
            CatalogAction::Add {
                name,
                price,
                discount,
                category,
                inactive,
            } => {
                commands::catalog::add(&app, name, price, discount, category, !inactive).await?;
            }
            CatalogAction::Update {
                id,
                name,
                price,
                discount,
                active,
            } => {
                let changes = commands::catalog::Changes {
                    name,
                    price,
                    discount,
                    active,
                };
                commands::catalog::update(&app, &id, changes).await?;
            }
            CatalogAction::Delete { id } => commands::catalog::delete(&app, &id).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&app).await?,
            CartAction::Add { id, name } => commands::cart::add(&app, &id, name).await?,
            CartAction::Decrease { id } => commands::cart::decrease(&app, &id).await?,
            CartAction::Remove { id } => commands::cart::remove(&app, &id).await?,
            CartAction::Set { id, count } => commands::cart::set(&app, &id, count).await?,
            CartAction::Clear => commands::cart::clear(&app).await?,
        },
        Commands::Auth { action } => match action {
            AuthAction::Login { username, password } => {
                commands::auth::login(&app, &username, &password).await?;
            }
            AuthAction::Register {
                username,
                email,
                password,
            } => commands::auth::register(&app, &username, &email, &password).await?,
            AuthAction::Logout => commands::auth::logout(&app).await?,
            AuthAction::Status => commands::auth::status(&app)?,
        },
    }
    Ok(())
}
