//! `rpindex info`: contract addresses and how far behind the index is.

use anyhow::Result;

use rpindex_core::{CheckpointManager, ChainClient};

use crate::GlobalArgs;

pub async fn run(args: &GlobalArgs) -> Result<()> {
    let client = args.connect_chain().await?;
    let head = client.head_height().await?;
    let finalized = client.finalized_height().await?;

    let store = args.open_store().await?;
    let cursor = CheckpointManager::new(store, args.genesis_block).cursor().await?;

    let contracts = client.contracts();
    println!("rpindex v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("RPC:                     {}", args.rpc);
    println!("Rocket Storage:          {}", contracts.rocket_storage.to_checksum());
    println!("Rocket Minipool Manager: {}", contracts.minipool_manager.to_checksum());
    println!();
    println!("Head block:      {head}");
    println!("Finalized block: {finalized}");
    println!("Index cursor:    {cursor}");
    println!("Behind:          {} blocks", finalized.saturating_sub(cursor));
    Ok(())
}
