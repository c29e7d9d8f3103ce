use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kanban::{report, App, Config};

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Optional: KANBAN_STORE_PATH (default: ./kanban.events)");
            eprintln!("Optional: KANBAN_STORE_BACKEND (jsonl or redb, default: jsonl)");
            eprintln!("Optional: KANBAN_CACHE_CAPACITY (default: 1000)");
            std::process::exit(1);
        }
    };

    tracing::info!("Store path: {}", config.store_path.display());
    tracing::info!("Store backend: {:?}", config.backend);

    let app = match App::open(&config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Startup error: {}", e);
            std::process::exit(1);
        }
    };

    match report::render(&app, Utc::now().date_naive()) {
        Ok(text) => print!("{text}"),
        Err(e) => {
            eprintln!("Report error: {}", e);
            std::process::exit(1);
        }
    }
}
