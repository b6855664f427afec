//! `rpindex sync` and `rpindex status`.

use std::sync::Arc;

use anyhow::Result;

use rpindex_core::{CheckpointManager, ChainClient, SyncEngine, SyncOutcome};

use crate::GlobalArgs;

/// One catch-up run, to `target` or the finalized height.
pub async fn run_sync(args: &GlobalArgs, target: Option<u64>) -> Result<()> {
    let config = args.sync_config()?;
    let store = args.open_store().await?;
    let client = Arc::new(args.connect_chain().await?);

    let target = match target {
        Some(t) => t,
        None => client.finalized_height().await?,
    };
    let engine = SyncEngine::new(config, client, store)?;

    match engine.run_once(target).await? {
        SyncOutcome::Completed(report) => {
            println!("Synced {} → {}", report.start_cursor, report.cursor);
            println!("  Chunks: {}", report.chunks);
            println!("  Events: {}", report.events);
        }
        SyncOutcome::AlreadyRunning => println!("A sync run is already in progress"),
    }
    Ok(())
}

/// Print what the local database holds; no node needed.
pub async fn run_status(args: &GlobalArgs) -> Result<()> {
    let store = args.open_store().await?;
    let cursor = CheckpointManager::new(store.clone(), args.genesis_block)
        .cursor()
        .await?;
    let nodes = store.entry_count().await?;

    println!("Database:  {}", args.db_dir.display());
    println!("Cursor:    {cursor}");
    println!("Overrides: {nodes}");
    Ok(())
}
