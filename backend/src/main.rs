//! File Flexer - a self-hosted file conversion web app
//!
//! Serves an embedded web UI backed by a REST + WebSocket API. Conversions
//! are delegated to a remote conversion service; the app tracks the single
//! in-flight attempt and pushes its status to connected clients.

mod catalog;
mod config;
mod convert;
mod server;
mod session;

use anyhow::Result;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::Settings;
use crate::convert::{ConversionFlow, ConvertClient};
use crate::session::SessionProvider;

/// Application state shared across all components
pub struct AppState {
    pub settings: RwLock<Settings>,
    pub flow: ConversionFlow,
    pub session: SessionProvider,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self> {
        let client = ConvertClient::new(&settings.convert_api)?;
        let flow = ConversionFlow::new(client);
        let session = SessionProvider::new(&settings.auth)?;
        Ok(Self {
            settings: RwLock::new(settings),
            flow,
            session,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("Starting File Flexer v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = config::load_or_create_default()?;
    info!("Configuration loaded from {:?}", config::config_path());

    // Create shared application state
    let state = Arc::new(AppState::new(settings)?);

    server::run(state).await
}
