//! `attest status` — Query the status of a running Attest node.

use clap::Args;
use serde::Deserialize;

use super::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    version: String,
    issuer: String,
    key_id: String,
    store_backend: String,
    uptime_secs: u64,
}

pub async fn run(args: &StatusArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.endpoint);
    let Some(status) = client.get::<StatusResponse>("/vc/v1/status").await? else {
        return Ok(());
    };

    println!("Node Status:");
    println!("  Version:    {}", status.version);
    println!("  Issuer:     {}", status.issuer);
    println!("  Key ID:     {}", status.key_id);
    println!("  Store:      {}", status.store_backend);
    println!("  Uptime:     {}s", status.uptime_secs);
    Ok(())
}
