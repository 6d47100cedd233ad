use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use greenloop::items::{ItemQuery, ItemStatus};
use greenloop::marketplace::{ListingType, MarketplaceListing, MarketplaceSearchParams, SortBy, SortOrder};
use greenloop::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "greenloop", version)]
#[command(about = "Command-line client for the GreenLoop marketplace API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL
    #[arg(long, global = true, env = "GREENLOOP_API_URL")]
    api_url: Option<String>,

    /// Where the session is kept between runs
    #[arg(long, global = true, env = "GREENLOOP_SESSION_FILE", default_value = ".greenloop-session.json")]
    session_file: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Output debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and keep the session
    Login {
        /// Username or email address
        identifier: String,
        #[arg(long, env = "GREENLOOP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Create an account
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "GREENLOOP_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        username: Option<String>,
    },
    /// Confirm an email address with the token from the verification mail
    Verify { token: String },
    /// Browse items
    Items {
        #[command(subcommand)]
        command: ItemsCommand,
    },
    /// List categories
    Categories,
    /// List brands
    Brands,
    /// Browse the marketplace
    Market {
        #[command(subcommand)]
        command: MarketCommand,
    },
    /// Show the profile stored on the server
    Profile,
}

#[derive(Subcommand, Debug)]
enum ItemsCommand {
    List {
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "20")]
        limit: u32,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        brand: Option<i64>,
        /// OWNED, LISTED, RENTED, SOLD or RECYCLED
        #[arg(long, value_parser = wire_enum::<ItemStatus>)]
        status: Option<ItemStatus>,
    },
    Show { id: i64 },
}

#[derive(Subcommand, Debug)]
enum MarketCommand {
    Search {
        query: Option<String>,
        /// SALE, RENTAL or SWAP; repeat for several
        #[arg(long = "type", value_parser = wire_enum::<ListingType>)]
        listing_type: Vec<ListingType>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        /// createdAt, price or title
        #[arg(long, value_parser = wire_enum::<SortBy>)]
        sort_by: Option<SortBy>,
        /// asc or desc
        #[arg(long, value_parser = wire_enum::<SortOrder>)]
        sort_order: Option<SortOrder>,
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "20")]
        limit: u32,
    },
    Featured {
        #[arg(long)]
        limit: Option<u32>,
    },
    Show { id: i64 },
}

/// Parse a value the way the backend spells it
fn wire_enum<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string())).map_err(|e| e.to_string())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_listings(listings: &[MarketplaceListing]) {
    for listing in listings {
        let price = listing
            .price
            .or(listing.rental_price_per_day)
            .map(|p| format!("{:.2}", p))
            .unwrap_or_else(|| "-".to_string());
        let kind = format!("{:?}", listing.listing_type).to_uppercase();
        println!("{:>6}  {:<6}  {:>8}  {}", listing.listing_id, kind, price, listing.title);
    }
}

async fn run(cli: Cli, cancel: CancellationToken) -> anyhow::Result<()> {
    let mut options = ClientOptions::from_env()?;
    if let Some(url) = &cli.api_url {
        options = options.with_base_url(url);
    }

    let store = Arc::new(FileStore::new(&cli.session_file));
    let greenloop = GreenLoop::new_with_options(options, store)?;
    let restored = greenloop.init().await?;
    debug!(restored, session_file = %cli.session_file.display(), "session loaded");

    match cli.command {
        Commands::Login { identifier, password } => {
            let session = greenloop
                .session()
                .login(&LoginRequest::new(&identifier, &password), &cancel)
                .await
                .map_err(Error::from)?;
            println!("Logged in as {} ({})", session.user.full_name(), session.user.email);
        }
        Commands::Logout => {
            greenloop.session().logout().await.map_err(Error::from)?;
            println!("Logged out");
        }
        Commands::Whoami => match greenloop.session().user().await {
            Some(user) if cli.json => print_json(&user)?,
            Some(user) => println!("{} <{}> {}", user.full_name(), user.email, user.user_type),
            None => println!("Not logged in"),
        },
        Commands::Register {
            first_name,
            last_name,
            email,
            password,
            username,
        } => {
            let request = RegisterRequest {
                first_name,
                last_name,
                email,
                password,
                username,
                ..Default::default()
            };
            let user = greenloop
                .session()
                .register(&request, &cancel)
                .await
                .map_err(Error::from)?;
            println!("Registered {}; check your inbox to verify the address", user.email);
        }
        Commands::Verify { token } => {
            let message = greenloop
                .session()
                .verify_email(&token, &cancel)
                .await
                .map_err(Error::from)?;
            println!("{}", message);
        }
        Commands::Items { command } => match command {
            ItemsCommand::List {
                page,
                limit,
                category,
                brand,
                status,
            } => {
                let query = ItemQuery {
                    category_id: category,
                    brand_id: brand,
                    status,
                    ..ItemQuery::page(page, limit)
                };
                let items = greenloop.items().get_items(&query, &cancel).await.map_err(Error::from)?;
                if cli.json {
                    print_json(&items)?;
                } else {
                    for item in &items.data {
                        println!("{:>6}  {:<9}  {}", item.item_id, item.current_status.to_string(), item.name);
                    }
                    println!("page {} of {} ({} items)", items.page, items.total_pages, items.total);
                }
            }
            ItemsCommand::Show { id } => {
                let item = greenloop.items().get_item(id, &cancel).await.map_err(Error::from)?;
                print_json(&item)?;
            }
        },
        Commands::Categories => {
            let categories = greenloop
                .categories()
                .get_categories(&cancel)
                .await
                .map_err(Error::from)?;
            if cli.json {
                print_json(&categories)?;
            } else {
                for category in categories {
                    println!("{:>4}  {}", category.category_id, category.name);
                }
            }
        }
        Commands::Brands => {
            let brands = greenloop.brands().get_brands(&cancel).await.map_err(Error::from)?;
            if cli.json {
                print_json(&brands)?;
            } else {
                for brand in brands {
                    let rating = brand
                        .sustainability_rating
                        .map(|r| format!("{:.1}", r))
                        .unwrap_or_else(|| "-".to_string());
                    println!("{:>4}  {:<4}  {}", brand.brand_id, rating, brand.name);
                }
            }
        }
        Commands::Market { command } => match command {
            MarketCommand::Search {
                query,
                listing_type,
                min_price,
                max_price,
                sort_by,
                sort_order,
                page,
                limit,
            } => {
                let params = MarketplaceSearchParams {
                    query,
                    listing_type,
                    min_price,
                    max_price,
                    sort_by,
                    sort_order,
                    page: Some(page),
                    limit: Some(limit),
                    ..Default::default()
                };
                let results = greenloop
                    .marketplace()
                    .search_listings(&params, &cancel)
                    .await
                    .map_err(Error::from)?;
                if cli.json {
                    print_json(&results)?;
                } else {
                    print_listings(&results.data);
                    println!("page {} of {} ({} listings)", results.page, results.total_pages, results.total);
                }
            }
            MarketCommand::Featured { limit } => {
                let listings = greenloop
                    .marketplace()
                    .get_featured_listings(limit, &cancel)
                    .await
                    .map_err(Error::from)?;
                if cli.json {
                    print_json(&listings)?;
                } else {
                    print_listings(&listings);
                }
            }
            MarketCommand::Show { id } => {
                let listing = greenloop
                    .marketplace()
                    .get_listing(id, &cancel)
                    .await
                    .map_err(Error::from)?;
                print_json(&listing)?;
            }
        },
        Commands::Profile => {
            if !greenloop.session().is_authenticated().await {
                return Err(Error::NotLoggedIn.into());
            }
            let profile = greenloop
                .users()
                .get_current_user(&cancel)
                .await
                .map_err(Error::from)?;
            print_json(&profile)?;
        }
    }

    greenloop.dispose();
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    if let Err(err) = run(cli, cancel)
        .await
        .context("greenloop command failed")
    {
        let message = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<Error>())
            .map(Error::user_message)
            .unwrap_or_else(|| format!("{:#}", err));
        eprintln!("error: {}", message);
        std::process::exit(1);
    }
}
