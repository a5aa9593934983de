//! `attest revoke` — Revoke a credential.

use clap::Args;
use serde::Deserialize;
use serde_json::json;

use super::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct RevokeArgs {
    /// Credential id.
    pub id: String,

    /// Why the credential is revoked.
    #[arg(short, long, default_value = "unspecified")]
    pub reason: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevocationBody {
    vc_id: String,
    status: String,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    revoked_at: Option<String>,
}

#[derive(Deserialize)]
struct RevokeResponse {
    #[serde(rename = "Revocation")]
    revocation: RevocationBody,
}

pub async fn run(args: &RevokeArgs) -> anyhow::Result<()> {
    let body = json!({
        "RequestInfo": NodeClient::request_info("vc-revoke"),
        "RevocationRequest": { "vcId": args.id, "reason": args.reason },
    });

    let client = NodeClient::new(&args.endpoint);
    let Some(resp) = client.post::<RevokeResponse>("/vc/v1/_revoke", &body).await? else {
        return Ok(());
    };
    let revocation = resp.revocation;

    println!("Credential {} is {}", revocation.vc_id, revocation.status);
    if let Some(reason) = revocation.reason {
        println!("  Reason:   {}", reason);
    }
    if let Some(at) = revocation.revoked_at {
        println!("  Since:    {}", at);
    }
    Ok(())
}
