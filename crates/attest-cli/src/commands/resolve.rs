//! `attest resolve` — Resolve a scanned presentation payload.

use clap::Args;
use serde::Deserialize;
use serde_json::{json, Value};

use super::client::{NodeClient, DEFAULT_ENDPOINT};
use super::verify::{print_result, VerificationResult};

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Scanned payload (the verification URL from the QR code).
    pub payload: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Resolution {
    code_fresh: bool,
    verification: VerificationResult,
    #[serde(default)]
    display: Option<Value>,
}

#[derive(Deserialize)]
struct ResolveResponse {
    #[serde(rename = "Resolution")]
    resolution: Resolution,
}

pub async fn run(args: &ResolveArgs) -> anyhow::Result<()> {
    let body = json!({
        "RequestInfo": NodeClient::request_info("vc-resolve"),
        "ScanRequest": { "payload": args.payload },
    });

    let client = NodeClient::new(&args.endpoint);
    let Some(resp) = client.post::<ResolveResponse>("/vc/v1/_resolve", &body).await? else {
        return Ok(());
    };
    let resolution = resp.resolution;

    if !resolution.code_fresh {
        println!("Note: this presentation code has expired; ask the holder for a new one.");
    }
    print_result(&resolution.verification);

    if let Some(display) = resolution.display {
        println!();
        println!("Permit details:");
        for key in ["holderName", "permitType", "businessName", "validUntil"] {
            if let Some(value) = display.get(key).and_then(Value::as_str) {
                println!("  {:<13} {}", format!("{}:", key), value);
            }
        }
        if let Some(claims) = display.get("claims").and_then(Value::as_array) {
            for line in claims.iter().filter_map(Value::as_str) {
                println!("  - {}", line);
            }
        }
    }
    Ok(())
}
