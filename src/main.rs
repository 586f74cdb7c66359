use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use linkdeck::classifier::{self, ALL_CATEGORIES};
use linkdeck::config::Config;
use linkdeck::events::{load_change_events, ControllerInput, RefetchTrigger};
use linkdeck::preferences::Preferences;
use linkdeck::scheduler::{self, SchedulerConfig};
use linkdeck::state::{Action, AppState};
use linkdeck::{ranking, Bookmark, MemoryStore, RestStore, SyncController, User};

mod progress;

#[derive(Parser)]
#[command(name = "linkdeck")]
#[command(about = "Bookmark ranking and live sync against a hosted backend", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank bookmarks from a JSON snapshot by visits and recency
    Rank {
        /// JSON array of bookmark rows
        #[arg(short, long)]
        file: PathBuf,

        /// Only show one category (e.g. "Dev Tools")
        #[arg(long, default_value = ALL_CATEGORIES)]
        filter: String,
    },

    /// Print the category of one or more URLs
    Classify {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// List the filter categories present in a JSON snapshot
    Categories {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Replay a change stream over a snapshot, offline
    Replay {
        /// JSON array of bookmark rows held by the store
        #[arg(short, long)]
        snapshot: PathBuf,

        /// JSON-lines change events ({"kind":"insert"|"update"|"delete",...})
        #[arg(short, long)]
        events: PathBuf,

        /// Owner of the replayed rows
        #[arg(short, long, default_value = "local")]
        user: String,
    },

    /// Fetch and rank bookmarks from the hosted store
    Fetch {
        #[arg(long, default_value = ALL_CATEGORIES)]
        filter: String,
    },

    /// Add a bookmark to the hosted store
    Add {
        #[arg(short, long, default_value = "")]
        title: String,

        #[arg(short, long)]
        url: String,
    },

    /// Delete a bookmark from the hosted store
    Delete {
        #[arg(long)]
        id: String,
    },

    /// Record a visit; without --id visits the recommended bookmark
    Visit {
        #[arg(long)]
        id: Option<String>,
    },

    /// Keep a live collection, refetching on a cron schedule
    Watch {
        /// Cron expression (default: every 5 minutes)
        #[arg(short, long, default_value = "0 */5 * * * *")]
        cron: String,
    },

    /// Show or toggle the persisted dark mode preference
    Theme {
        #[arg(long)]
        toggle: bool,

        /// Preferences file (default: ~/.linkdeck-preferences.json)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rank { file, filter } => {
            let bookmarks = load_bookmarks(&file)?;
            let ranked = ranking::rank(&bookmarks);
            print_ranked(&ranked, &filter);
        }

        Commands::Classify { urls } => {
            for url in urls {
                println!("{}\t{}", classifier::classify(&url).label(), url);
            }
        }

        Commands::Categories { file } => {
            let bookmarks = load_bookmarks(&file)?;
            for category in classifier::available_categories(&bookmarks) {
                println!("{}", category);
            }
        }

        Commands::Replay { snapshot, events, user } => {
            let rows = load_bookmarks(&snapshot)?;
            let events = load_change_events(&events)?;
            info!("📼 Replaying {} change events over {} bookmarks", events.len(), rows.len());

            let store = Arc::new(MemoryStore::with_rows(user.clone(), rows));
            let mut controller = SyncController::new(store);
            controller.set_identity(Some(User {
                id: user.clone(),
                email: format!("{}@localhost", user),
            }));
            controller.refetch(RefetchTrigger::InitialLoad).await;

            let (tx, rx) = mpsc::channel(events.len().max(1));
            let task = tokio::spawn(controller.run(rx));
            for event in events {
                tx.send(ControllerInput::Change(event)).await?;
            }
            tx.send(ControllerInput::Shutdown).await?;

            let controller = task.await?;
            print_ranked(&controller.ranked(), ALL_CATEGORIES);
        }

        Commands::Fetch { filter } => {
            let controller = connect().await?;
            print_ranked(&controller.ranked(), &filter);
        }

        Commands::Add { title, url } => {
            let config = Config::from_env()?;
            let mut controller = SyncController::new(Arc::new(RestStore::new(&config)));
            controller.set_identity(Some(config.user()));

            let added = controller
                .add(&title, &url)
                .await
                .with_context(|| format!("Bookmark {} was not added", url))?;
            println!("✅ Added {} ({})", added.title, added.id);
        }

        Commands::Delete { id } => {
            let config = Config::from_env()?;
            let mut controller = SyncController::new(Arc::new(RestStore::new(&config)));
            controller.set_identity(Some(config.user()));

            controller
                .delete(&id)
                .await
                .with_context(|| format!("Bookmark {} was not deleted", id))?;
            println!("🗑️  Deleted {}", id);
        }

        Commands::Visit { id } => {
            let mut controller = connect().await?;
            let visited = match id {
                Some(id) => controller
                    .record_visit(&id)
                    .map(|receipt| (id, receipt)),
                None => controller
                    .visit_recommended()
                    .map(|(bookmark, receipt)| (bookmark.id, receipt)),
            };

            match visited {
                Some((id, receipt)) => {
                    receipt.await?;
                    if let Some(bookmark) = controller.bookmarks().iter().find(|b| b.id == id) {
                        println!("👉 {} ({} visits) {}", bookmark.title, bookmark.visit_count, bookmark.url);
                    }
                }
                None => println!("⚠️  Nothing to visit"),
            }
        }

        Commands::Watch { cron } => {
            let config = Config::from_env()?;
            let controller = SyncController::new(Arc::new(RestStore::new(&config)));
            let (tx, rx) = mpsc::channel(config.channel_capacity);
            let task = tokio::spawn(controller.run(rx));

            tx.send(ControllerInput::Identity(Some(config.user()))).await?;
            scheduler::run_scheduled_refetch(SchedulerConfig::new(cron), tx).await?;

            let controller = task.await?;
            print_ranked(&controller.ranked(), ALL_CATEGORIES);
        }

        Commands::Theme { toggle, file } => {
            let path = match file {
                Some(path) => path,
                None => Preferences::default_path()?,
            };
            let mut prefs = Preferences::load_from(&path)?;
            if toggle {
                prefs.toggle_dark_mode();
                prefs.save_to(&path)?;
            }
            println!("dark_mode: {}", prefs.dark_mode);
        }
    }

    Ok(())
}

/// Signed-in controller over the hosted store with the collection loaded
async fn connect() -> Result<SyncController<RestStore>> {
    let config = Config::from_env()?;
    let mut controller = SyncController::new(Arc::new(RestStore::new(&config)));
    controller.set_identity(Some(config.user()));

    let spinner = progress::create_spinner("Fetching bookmarks...");
    if controller.refetch(RefetchTrigger::InitialLoad).await {
        progress::finish_with_success(&spinner, &format!("{} bookmarks", controller.bookmarks().len()));
    } else {
        progress::finish_with_error(&spinner, "Could not reach the store");
    }
    Ok(controller)
}

fn load_bookmarks(path: &Path) -> Result<Vec<Bookmark>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read bookmarks from {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse bookmarks in {:?}", path))
}

fn print_ranked(ranked: &[Bookmark], filter: &str) {
    let state = AppState::new(Preferences::default())
        .apply(Action::Snapshot(ranked.to_vec()))
        .apply(Action::SelectCategory(filter.to_string()));

    println!("\n📊 Bookmarks ({})", state.category());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (position, bookmark) in state.visible().iter().enumerate() {
        println!(
            "  {:>3}. [{}] {} visits  {}  {}",
            position + 1,
            classifier::classify(&bookmark.url).label(),
            bookmark.visit_count,
            bookmark.title,
            bookmark.url
        );
    }
    println!("  ─────────────────────────────────────────");
    match state.recommendation() {
        Some(pick) => println!("  Recommended: {} ({})", pick.title, pick.id),
        None => println!("  Recommended: none"),
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}
