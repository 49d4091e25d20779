//! File-driven CLI harness for the campaign engine.
//!
//! The production deployment serves these five methods over JSON-RPC on two
//! bound sockets (§6) — that listener is an external collaborator and out of
//! scope here. This binary drives the same handlers directly from the
//! command line so the engine can be exercised and scripted without one:
//! one invocation per RPC call, snapshot and statistics state persisted to
//! disk between invocations exactly as the real server would.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use campaign_engine::core::config::Config;
use campaign_engine::core::error::{CoreError, Result};
use campaign_engine::core::version::{self, CURRENT_VERSION};
use campaign_engine::map::PerCoalition;
use campaign_engine::orchestrator;
use campaign_engine::services::notify::{MessageSink, NullMessageSink, WebhookSink};
use campaign_engine::services::persistence::{FileSnapshotStore, SnapshotStore};
use campaign_engine::services::Services;
use campaign_engine::stats::store::SqliteConflictStore;
use campaign_engine::transport::dto::{
    ChangeScoreRequest, MissionEndRequest, ProcessJsonRequest, RpcErrorResponse, SupportDestroyedRequest,
    UnitDestroyedRequest,
};

#[derive(Parser)]
#[command(name = "campaign-engine", about = "Dynamic campaign decision engine")]
struct Cli {
    /// Campaign snapshot file (§6 persistence). Created on first `processjson`.
    #[arg(long, default_value = "campaign.json", global = true)]
    snapshot: PathBuf,

    /// SQLite statistics store (§6 `statistics`/`unit_types` tables).
    #[arg(long, default_value = "statistics.db", global = true)]
    stats_db: PathBuf,

    /// Sectioned config file (§6). Defaults are used for any absent section.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for a brand-new campaign's RNG stream (design note: "Random determinism").
    #[arg(long, default_value_t = 0, global = true)]
    rng_seed: u64,

    #[command(subcommand)]
    method: Method,
}

/// One variant per JSON-RPC method in §6.
#[derive(Subcommand)]
enum Method {
    /// Main turn step: ingest the host's report, decide, respond.
    Processjson {
        /// Path to the `processjson` request JSON payload.
        #[arg(long)]
        input: PathBuf,
    },
    /// Mid-mission death event.
    Unitdestroyed {
        #[arg(long)]
        unitname: String,
        #[arg(long)]
        groupname: String,
        #[arg(long)]
        time: i64,
    },
    /// Mid-mission support-unit loss; forces next-turn restock.
    Supportdestroyed {
        #[arg(long)]
        coalition: String,
    },
    /// Finalizes the stage: statistics extraction, victory check.
    Missionend {
        /// Path to the `missionend` request JSON payload.
        #[arg(long)]
        input: PathBuf,
    },
    /// Mid-mission scoring event.
    Changescore {
        #[arg(long)]
        reason: String,
        #[arg(long)]
        coalition: String,
        #[arg(long)]
        unitname: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            let config = Config::from_str(&text)?;
            config.validate()?;
            config
        }
        None => Config::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(if config.logging.level.is_empty() {
            "campaign_engine=info".to_string()
        } else {
            config.logging.level.clone()
        })
        .init();

    let snapshot_store: Arc<dyn SnapshotStore> = Arc::new(FileSnapshotStore::new(&cli.snapshot));
    let conflict_store = Arc::new(SqliteConflictStore::open(&cli.stats_db)?);
    let message_sink: Arc<dyn MessageSink> = match &config.comms.webhook_url {
        Some(url) => Arc::new(WebhookSink::new(url.clone(), config.comms.username.clone())),
        None => Arc::new(NullMessageSink),
    };

    let allowed_aa_units = PerCoalition::new(config.campaign.aa_red.clone(), config.campaign.aa_blue.clone());
    let services = Services::new(config, snapshot_store.clone(), message_sink, conflict_store);

    let mut campaign = load_or_create_campaign(&services, snapshot_store.as_ref(), cli.rng_seed, allowed_aa_units)?;

    match cli.method {
        Method::Processjson { input } => {
            let text = fs::read_to_string(input)?;
            let req: ProcessJsonRequest = serde_json::from_str(&text)
                .map_err(|e| CoreError::MalformedRequest(format!("invalid processjson payload: {e}")))?;
            let response = orchestrator::process_turn(&mut campaign, &services, &req)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Method::Unitdestroyed { unitname, groupname, time } => {
            let req = UnitDestroyedRequest { unitname, groupname, time };
            orchestrator::handle_unit_destroyed(&mut campaign, &req)?;
            services.snapshot_store.save(&campaign)?;
            println!("\"ok\"");
        }
        Method::Supportdestroyed { coalition } => {
            let req = SupportDestroyedRequest { coalition };
            orchestrator::handle_support_destroyed(&mut campaign, &req)?;
            services.snapshot_store.save(&campaign)?;
            println!("{{}}");
        }
        Method::Missionend { input } => {
            let text = fs::read_to_string(input)?;
            let req: MissionEndRequest = serde_json::from_str(&text)
                .map_err(|e| CoreError::MalformedRequest(format!("invalid missionend payload: {e}")))?;
            let response = orchestrator::handle_mission_end(&mut campaign, &services, &req)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Method::Changescore { reason, coalition, unitname } => {
            let req = ChangeScoreRequest { reason, coalition, unitname };
            orchestrator::handle_change_score(&mut campaign, &services, &req)?;
            services.snapshot_store.save(&campaign)?;
            println!("{{}}");
        }
    }

    Ok(())
}

/// Loads the persisted campaign, discarding it per §7 `IncompatibleSnapshot`
/// if its `software_version` is older than the configured minimum, and
/// starting a fresh campaign if none is on disk or it was just discarded.
fn load_or_create_campaign(
    services: &Services,
    snapshot_store: &dyn SnapshotStore,
    rng_seed: u64,
    allowed_aa_units: PerCoalition<Vec<String>>,
) -> Result<campaign_engine::campaign::Campaign> {
    let minimum = version::Version::parse(&services.config.minimum_snapshot_version)?;

    if let Some(loaded) = snapshot_store.load()? {
        match version::Version::parse(&loaded.software_version) {
            Ok(found) if found >= minimum => return Ok(loaded),
            Ok(_) => {
                tracing::warn!(found = %loaded.software_version, "snapshot older than minimum version, resetting");
            }
            Err(_) => {
                tracing::warn!(found = %loaded.software_version, "unparsable snapshot version, resetting");
            }
        }
    }

    Ok(campaign_engine::campaign::Campaign::new(
        CURRENT_VERSION.to_string(),
        rng_seed,
        allowed_aa_units,
    ))
}

fn print_error(e: &CoreError) {
    let envelope = RpcErrorResponse::from(CoreError::Internal(e.to_string()));
    match serde_json::to_string(&envelope) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!("{{\"code\":\"1\",\"error\":{:?}}}", e.to_string()),
    }
}
