//! Waypoint CLI - scripted demo of the offline-first sync engine.
//!
//! Runs an offline/online scenario against in-memory stores: queues
//! local edits while "offline", reconnects, lets the network monitor
//! trigger a queue pass, then does a full resync and prints queue
//! stats along the way.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use waypoint_common::{EntityKind, Operation, Record};
use waypoint_storage::{ManualConnectivity, MemoryCache, MemoryQueue, MemoryRemote, QueueStore};
use waypoint_sync::{QueueStats, SyncConfig, SyncService, SyncStores};

#[derive(Parser)]
#[command(name = "waypoint")]
#[command(about = "Waypoint - offline-first sync engine demo")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Number of trip edits to queue while offline.
    #[arg(short, long, default_value_t = 3)]
    edits: usize,

    /// Inject a remote failure on one of the queued edits.
    #[arg(long)]
    fail_one: bool,
}

fn print_stats(label: &str, stats: &QueueStats) {
    println!(
        "{}: pending={} syncing={} synced={} failed={}",
        label, stats.pending, stats.syncing, stats.synced, stats.failed
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let owner = "demo-user";

    let queue = Arc::new(MemoryQueue::new());
    let trips = Arc::new(MemoryRemote::new(EntityKind::Trip));
    let expenses = Arc::new(MemoryRemote::new(EntityKind::Expense));
    let connectivity = Arc::new(ManualConnectivity::new(false));

    // Seed the "authoritative" store with one existing trip.
    let seeded_trip = Uuid::new_v4().to_string();
    trips.insert(
        Record::new(
            seeded_trip.clone(),
            Utc::now(),
            json!({"id": seeded_trip.clone(), "owner_id": owner, "name": "Lisbon"}),
        )
        .context("Failed to build seed trip")?,
    );
    expenses.insert(
        Record::new(
            Uuid::new_v4().to_string(),
            Utc::now(),
            json!({"trip_id": seeded_trip, "amount": 42.50, "label": "dinner"}),
        )
        .context("Failed to build seed expense")?,
    );

    let service = SyncService::new(
        SyncStores {
            trips_remote: trips.clone(),
            expenses_remote: expenses.clone(),
            trip_cache: Arc::new(MemoryCache::new()),
            expense_cache: Arc::new(MemoryCache::new()),
            queue: queue.clone(),
            connectivity: connectivity.clone(),
        },
        SyncConfig::default(),
    );

    let _subscription = service.on_status_change(|status| println!("[status] {}", status));

    // Offline: record local edits into the queue.
    info!("Queueing {} edits while offline", cli.edits);
    for n in 0..cli.edits {
        let id = Uuid::new_v4().to_string();
        let record = Record::new(
            id.clone(),
            Utc::now(),
            json!({"id": id.clone(), "owner_id": owner, "name": format!("Trip {}", n + 1)}),
        )
        .context("Failed to build trip record")?;
        let item = queue
            .enqueue(EntityKind::Trip, &id, Operation::Create, Some(record))
            .await
            .context("Failed to enqueue edit")?;
        if cli.fail_one && n == 0 {
            trips.fail_entity(&item.entity_id, "simulated backend outage");
        }
    }

    // A sync attempt while offline is a silent no-op.
    service.start_sync().await.context("Offline pass failed")?;
    print_stats("before reconnect", &service.stats().await?);

    // Reconnect: the monitor notices and triggers a pass.
    service.start_network_monitoring();
    info!("Going online");
    connectivity.set_online(true);
    tokio::time::sleep(Duration::from_millis(200)).await;

    print_stats("after reconnect", &service.stats().await?);

    // Pull everything back down on top of the drained queue.
    service
        .force_full_sync(owner)
        .await
        .context("Full sync failed")?;
    print_stats("after full sync", &service.stats().await?);

    service.stop_network_monitoring();
    Ok(())
}
