//! `attest verify` — Verify a credential by id or as a presented document.

use clap::Args;
use serde::Deserialize;
use serde_json::json;

use super::client::{NodeClient, DEFAULT_ENDPOINT};
use super::json_arg;

#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("target").required(true).args(["id", "credential"]))]
pub struct VerifyArgs {
    /// Credential id to verify against the store.
    #[arg(long)]
    pub id: Option<String>,

    /// Credential JSON (inline or path to file) to verify as presented.
    #[arg(short, long)]
    pub credential: Option<String>,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
pub struct VerifyCheck {
    pub name: String,
    pub passed: bool,
    pub detail: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub valid: bool,
    pub reason: String,
    pub credential_id: String,
    pub checks: Vec<VerifyCheck>,
}

#[derive(Deserialize)]
struct VerifyResponse {
    #[serde(rename = "VerificationResult")]
    verification_result: VerificationResult,
}

pub fn print_result(result: &VerificationResult) {
    if result.valid {
        println!("Credential {} is VALID", result.credential_id);
    } else {
        println!("Credential {} is INVALID ({})", result.credential_id, result.reason);
    }
    println!();
    for check in &result.checks {
        let icon = if check.passed { "PASS" } else { "FAIL" };
        print!("  [{}] {}", icon, check.name);
        if let Some(ref detail) = check.detail {
            print!(": {}", detail);
        }
        println!();
    }
}

pub async fn run(args: &VerifyArgs) -> anyhow::Result<()> {
    let request = match (&args.credential, &args.id) {
        (Some(document), _) => json!({ "credential": json_arg(document, "credential")? }),
        (None, Some(id)) => json!({ "vcId": id }),
        (None, None) => anyhow::bail!("pass --id or --credential"),
    };
    let body = json!({
        "RequestInfo": NodeClient::request_info("vc-verify"),
        "VerificationRequest": request,
    });

    let client = NodeClient::new(&args.endpoint);
    if let Some(resp) = client.post::<VerifyResponse>("/vc/v1/_verify", &body).await? {
        print_result(&resp.verification_result);
    }
    Ok(())
}
