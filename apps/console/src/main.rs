use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hr_console::client::ApiClient;
use hr_console::commands::{self, Cli};
use hr_console::config::Config;
use hr_console::session::{FileSessionStore, SessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env()?;

    // Initialize structured logging (stderr, so command output stays clean)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("hr_console={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("hr-console v{} against {}", env!("CARGO_PKG_VERSION"), config.api_base_url);

    let store: Arc<dyn SessionStore> = Arc::new(
        FileSessionStore::open(&config.session_file).context("Failed to open session store")?,
    );
    let mut session_events = store.subscribe();

    let client = ApiClient::from_config(&config, store.clone())
        .context("Failed to build HTTP client")?;

    let outcome = commands::run(cli.command, &client).await;

    if commands::drain_signed_out(&mut session_events, store.as_ref()) {
        info!("Session cleared");
        eprintln!("You are signed out. Sign in on the web app and run `hr-console session import`.");
    }

    outcome.map_err(commands::user_facing)
}
