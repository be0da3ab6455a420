use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

mod app;
mod clipboard;
mod ui;

use app::{App, AppEvent};
use newsdesk::api::{Article, HttpNewsApi, NewsApi};
use newsdesk::config::Config;
use newsdesk::detail::DetailLoader;
use newsdesk::feed::FeedController;
use newsdesk::storage::{Database, DatabaseError, ShelfKind, Shelves};
use newsdesk::util::{html_to_text, strip_control_chars};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Base delay between retries of a failed request; doubles each attempt.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Get the config directory path (~/.config/newsdesk/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("newsdesk"))
}

#[derive(Parser, Debug)]
#[command(name = "newsdesk", about = "Terminal reader for a paginated news API")]
struct Args {
    /// News API base URL (overrides api_base_url from the config file)
    #[arg(long, value_name = "URL")]
    api: Option<String>,

    /// Config file path (default: ~/.config/newsdesk/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reset database (delete and recreate)
    #[arg(long)]
    reset_db: bool,

    /// Keep saved/read lists in memory only for this run
    #[arg(long)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the home feed
    Feed {
        /// Pages to load after the first one
        #[arg(long, default_value_t = 0)]
        more: u32,
    },
    /// Print one article with its related articles
    Show { id: String },
    /// Print the saved list
    Saved,
    /// Print the read list
    Read,
}

/// Log to a file in the config directory so output never lands on the TUI.
fn init_logging(config_dir: &Path) -> Result<()> {
    let log_path = config_dir.join("newsdesk.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    // Set directory permissions on Unix (user-only access)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) =
            std::fs::set_permissions(&config_dir, std::fs::Permissions::from_mode(0o700))
        {
            eprintln!(
                "Warning: failed to restrict permissions on {}: {}",
                config_dir.display(),
                e
            );
        }
    }

    init_logging(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(api) = &args.api {
        config.api_base_url = api.clone();
    }

    let api = HttpNewsApi::new(&config.api_base_url)
        .with_context(|| format!("Invalid API base URL '{}'", config.api_base_url))?
        .timeout(config.request_timeout())
        .retries(config.max_retries, RETRY_BACKOFF);
    let api = Arc::new(api);
    tracing::info!(api = %api.base_url(), "Starting newsdesk");

    let db_path = config_dir.join("newsdesk.db");
    if args.reset_db && db_path.exists() {
        std::fs::remove_file(&db_path).context("Failed to delete database")?;
        println!("Database reset.");
    }

    let db_location = if args.ephemeral {
        ":memory:".to_string()
    } else {
        db_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?
            .to_string()
    };
    let db = match Database::open(&db_location).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of newsdesk appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };
    let shelves = Arc::new(Shelves::new(db));

    match args.command {
        Some(Command::Feed { more }) => print_feed(api, &config, more).await,
        Some(Command::Show { id }) => print_article(api, &config, &id).await,
        Some(Command::Saved) => print_shelf(&shelves, ShelfKind::Saved).await,
        Some(Command::Read) => print_shelf(&shelves, ShelfKind::Read).await,
        None => {
            let mut app = App::new(api, shelves, &config);
            let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
            ui::run(&mut app, event_tx, event_rx).await?;
            Ok(())
        }
    }
}

fn print_row(article: &Article) {
    println!(
        "{:<26} {:<14} {}  {}",
        article.id,
        strip_control_chars(&article.category),
        article.display_date(),
        strip_control_chars(&article.title)
    );
}

async fn print_feed<A: NewsApi>(api: A, config: &Config, more: u32) -> Result<()> {
    let mut feed = FeedController::new(api, config.feed_settings());
    feed.load_initial().await;
    for _ in 0..more {
        if !feed.load_more().await {
            break;
        }
    }

    let session = feed.session();
    if let Some(err) = session.last_error() {
        anyhow::bail!("Failed to load news: {}", err);
    }
    if let Some(lead) = session.lead() {
        println!("Lead:");
        print_row(lead);
        println!();
    }
    for article in session.articles() {
        print_row(article);
    }
    println!(
        "\n{} articles, page {}{}",
        session.articles().len(),
        session.page(),
        if session.has_more() { "" } else { ", no more news" }
    );
    Ok(())
}

async fn print_article<A: NewsApi>(api: A, config: &Config, id: &str) -> Result<()> {
    let mut loader = DetailLoader::new(api, StdRng::from_os_rng(), config.related_settings());
    let Some(detail) = loader
        .load(id)
        .await
        .context("Failed to load news. Please try again.")?
    else {
        anyhow::bail!("News not found: {}", id);
    };

    let article = &detail.article;
    println!("{}", strip_control_chars(&article.title));
    println!(
        "{} · {} · {}",
        article.display_date(),
        strip_control_chars(&article.author),
        strip_control_chars(&article.category)
    );
    println!();
    println!("{}\n", strip_control_chars(&article.summary()));
    println!("{}", strip_control_chars(&html_to_text(&article.body)));

    if !detail.related.is_empty() {
        println!("\nRelated news:");
        for related in &detail.related {
            print_row(related);
        }
    }
    Ok(())
}

async fn print_shelf(shelves: &Shelves<Database>, kind: ShelfKind) -> Result<()> {
    let list = shelves
        .list(kind)
        .await
        .with_context(|| format!("Failed to read {} list", kind.label()))?;
    if list.is_empty() {
        println!("No {} news.", kind.label().to_lowercase());
        return Ok(());
    }
    for article in &list {
        print_row(article);
    }
    Ok(())
}
