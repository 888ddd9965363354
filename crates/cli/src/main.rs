//! FastBite CLI - storefront and admin dashboard from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the menu and fill the cart as a guest
//! fastbite products --search burger
//! fastbite cart add 65f0c1a2b3 -q 2
//!
//! # Sign in (the guest cart moves to the account) and order
//! fastbite login -e an@example.com
//! fastbite checkout --name "Nguyễn An" --phone 0901234567 --address "12 Lê Lợi" -m momo
//!
//! # Ask the assistant
//! fastbite chat "có món chay nào không?"
//!
//! # Admin dashboard
//! fastbite admin products delete 65f0c1a2b3 65f0c1a2b4
//! fastbite admin orders status 65f0d9e1aa shipping
//! fastbite admin watch
//! ```
//!
//! Storefront commands read `FASTBITE_API_URL` and friends; `admin`
//! commands additionally need `FASTBITE_ADMIN_TOKEN`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fastbite_admin::Admin;
use fastbite_admin::config::AdminConfig;
use fastbite_core::BannerPosition;
use fastbite_storefront::Storefront;
use fastbite_storefront::config::StorefrontConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::admin::AdminCommand;
use commands::cart::CartAction;
use commands::catalog::{ProductsArgs, ReviewsAction};
use commands::orders::{CheckoutArgs, OrdersAction};
use commands::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "fastbite")]
#[command(author, version, about = "FastBite storefront and admin client")]
struct Cli {
    /// Log as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the menu
    Products(ProductsArgs),
    /// List menu categories
    Categories,
    /// Show active banners
    Banners {
        #[arg(short, long)]
        position: Option<BannerPosition>,
    },
    /// View or change the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "FASTBITE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "FASTBITE_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Sign out
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Place an order from the cart
    Checkout(CheckoutArgs),
    /// Order history and tracking
    Orders {
        #[command(subcommand)]
        action: Option<OrdersAction>,
    },
    /// Price the cart with a coupon code
    Coupon { code: String },
    /// Read or write product reviews
    Reviews {
        #[command(subcommand)]
        action: ReviewsAction,
    },
    /// Suggested dishes
    Recommend {
        #[arg(short, long, default_value_t = 6)]
        limit: usize,
        #[arg(long)]
        vegetarian: bool,
    },
    /// Ask the shop assistant
    Chat {
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// Admin dashboard
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(
    dsn: Option<&str>,
    environment: Option<String>,
    sample_rate: f32,
    traces_sample_rate: f32,
) -> Option<sentry::ClientInitGuard> {
    let dsn = dsn?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: environment.map(std::borrow::Cow::Owned),
            sample_rate,
            traces_sample_rate,
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

/// Logs go to stderr so command output stays pipeable.
fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fastbite=info,fastbite_storefront=warn,fastbite_admin=warn".into());

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter));

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[allow(clippy::print_stderr)]
fn startup_failure(error: &dyn std::fmt::Display) -> ExitCode {
    eprintln!("Cấu hình không hợp lệ: {error}");
    ExitCode::from(2)
}

#[allow(clippy::print_stderr)]
fn finish(result: CliResult) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { action } => {
            let config = match AdminConfig::from_env() {
                Ok(config) => config,
                Err(e) => return startup_failure(&e),
            };
            let _sentry_guard = init_sentry(
                config.sentry_dsn.as_deref(),
                config.sentry_environment.clone(),
                config.sentry_sample_rate,
                config.sentry_traces_sample_rate,
            );
            init_tracing(cli.json_logs);

            match Admin::new(config) {
                Ok(admin) => finish(commands::admin::run(&admin, action).await),
                Err(e) => finish(Err(e.into())),
            }
        }
        command => {
            let config = match StorefrontConfig::from_env() {
                Ok(config) => config,
                Err(e) => return startup_failure(&e),
            };
            let _sentry_guard = init_sentry(
                config.sentry_dsn.as_deref(),
                config.sentry_environment.clone(),
                config.sentry_sample_rate,
                config.sentry_traces_sample_rate,
            );
            init_tracing(cli.json_logs);

            match Storefront::open(config) {
                Ok(shop) => finish(run_storefront(&shop, command).await),
                Err(e) => finish(Err(e.into())),
            }
        }
    }
}

async fn run_storefront(shop: &Storefront, command: Commands) -> CliResult {
    // Refresh or drop the stored token before anything else reads it.
    if !matches!(command, Commands::Login { .. } | Commands::Register { .. })
        && let Err(e) = shop.auth().ensure_session().await
    {
        tracing::warn!(error = %e, "Could not check the saved session");
    }

    match command {
        Commands::Products(args) => commands::catalog::products(shop, args).await,
        Commands::Categories => commands::catalog::categories(shop).await,
        Commands::Banners { position } => commands::catalog::banners(shop, position).await,
        Commands::Cart { action } => {
            commands::cart::run(shop, action.unwrap_or(CartAction::Show)).await
        }
        Commands::Login { email, password } => {
            commands::account::login(shop, &email, &password).await
        }
        Commands::Register {
            name,
            email,
            password,
            phone,
        } => commands::account::register(shop, &name, &email, &password, phone.as_deref()).await,
        Commands::Logout => commands::account::logout(shop).await,
        Commands::Whoami => commands::account::whoami(shop),
        Commands::Checkout(args) => commands::orders::checkout(shop, args).await,
        Commands::Orders { action } => {
            let action = action.unwrap_or(OrdersAction::List { page: 1, limit: 10 });
            commands::orders::run(shop, action).await
        }
        Commands::Coupon { code } => commands::cart::coupon(shop, &code).await,
        Commands::Reviews { action } => commands::catalog::reviews(shop, action).await,
        Commands::Recommend { limit, vegetarian } => {
            commands::catalog::recommend(shop, limit, vegetarian).await
        }
        Commands::Chat { message } => commands::catalog::chat(shop, &message.join(" ")).await,
        Commands::Admin { .. } => Err(CliError::Usage(
            "admin commands need the admin configuration".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_admin_delete() {
        let cli = Cli::try_parse_from(["fastbite", "admin", "products", "delete", "p1", "p2"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(cli.command, Commands::Admin { .. }));
    }
}
