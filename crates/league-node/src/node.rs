//! League node - configuration, shared state, and the run loop.
//!
//! Architecture:
//! - Single daemon process with two RocksDB stores (league data and
//!   the node-local user directory)
//! - HTTP API for interactive clients and the scheduler's finalize
//!   trigger

use crate::api;
use crate::catalog::{catalog_from_file, default_catalog};
use crate::directory::UserDirectory;
use league_core::TierCatalog;
use league_engine::{
    Clock, LogNotifier, MembershipTracker, Result, RoomAllocator, RoomLock, Storage,
    SystemClock, WeeklyFinalizer,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a league node.
#[derive(Debug, Clone)]
pub struct LeagueConfig {
    /// Data directory; league and user stores live underneath.
    pub data_dir: PathBuf,

    /// HTTP API listen address.
    pub api_addr: SocketAddr,

    /// Fixed civil-timezone offset, whole hours east of UTC.
    pub utc_offset_hours: i32,

    /// Optional JSON file overriding the compiled-in tier catalog.
    pub tiers_file: Option<PathBuf>,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl LeagueConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let data_dir = PathBuf::from(
            std::env::var("LEAGUE_DATA_DIR").unwrap_or_else(|_| "./league-data".to_string()),
        );

        let api_addr = std::env::var("LEAGUE_API_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .expect("Invalid LEAGUE_API_ADDR");

        let utc_offset_hours = std::env::var("LEAGUE_UTC_OFFSET_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let tiers_file = std::env::var("LEAGUE_TIERS_FILE").map(PathBuf::from).ok();

        Self {
            data_dir,
            api_addr,
            utc_offset_hours,
            tiers_file,
        }
    }
}

/// Shared state for the league node - one engine stack shared by all
/// handlers.
pub struct NodeState {
    pub catalog: TierCatalog,
    pub storage: Arc<Storage>,
    pub directory: Arc<UserDirectory>,
    pub clock: Arc<SystemClock>,
    pub allocator: RoomAllocator,
    pub tracker: MembershipTracker,
    pub finalizer: WeeklyFinalizer,
}

/// The league daemon.
pub struct LeagueNode {
    config: LeagueConfig,
    state: Arc<NodeState>,
}

impl LeagueNode {
    /// Open the stores and wire the engine together.
    pub fn new(config: LeagueConfig) -> Result<Self> {
        let catalog = match &config.tiers_file {
            Some(path) => catalog_from_file(path)?,
            None => default_catalog(),
        };

        let storage = Arc::new(Storage::open(config.data_dir.join("league"))?);
        let directory = Arc::new(UserDirectory::open(config.data_dir.join("users"))?);
        let clock = Arc::new(SystemClock::from_offset_hours(config.utc_offset_hours));

        // One lock instance: joins and finalize commits must serialize
        // against each other, not just against themselves.
        let lock = RoomLock::new();
        let allocator = RoomAllocator::new(
            storage.clone(),
            directory.clone(),
            clock.clone(),
            catalog.clone(),
            lock.clone(),
        );
        let tracker = MembershipTracker::new(storage.clone());
        let finalizer = WeeklyFinalizer::new(
            storage.clone(),
            directory.clone(),
            clock.clone(),
            Arc::new(LogNotifier),
            catalog.clone(),
            lock,
        );

        let state = Arc::new(NodeState {
            catalog,
            storage,
            directory,
            clock,
            allocator,
            tracker,
            finalizer,
        });

        Ok(Self { config, state })
    }

    /// Shared state handle (router construction, tests).
    pub fn state(&self) -> Arc<NodeState> {
        self.state.clone()
    }

    /// Serve the HTTP API until the process is stopped.
    pub async fn run(&self) -> Result<()> {
        tracing::info!("League node starting");
        tracing::info!("  API: http://{}", self.config.api_addr);
        tracing::info!("  Data: {:?}", self.config.data_dir);
        tracing::info!("  Week: {}", self.state.clock.current_week());

        let router = api::build_router(self.state.clone());
        let listener = tokio::net::TcpListener::bind(self.config.api_addr).await?;
        tracing::info!("HTTP server listening on {}", self.config.api_addr);
        axum::serve(listener, router).await?;
        Ok(())
    }
}
