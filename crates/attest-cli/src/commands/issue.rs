//! `attest issue` — Issue a permit credential.

use clap::Args;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;

use super::client::{NodeClient, DEFAULT_ENDPOINT};
use super::json_arg;

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Permit claims as JSON (inline or path to file).
    #[arg(short, long)]
    pub claims: String,

    /// Holder identity (DID). The node's default holder when omitted.
    #[arg(long)]
    pub holder: Option<String>,

    /// Credential type(s), comma-separated.
    #[arg(short = 't', long, value_delimiter = ',')]
    pub credential_type: Vec<String>,

    /// Write the signed credential to this file.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct IssueResponse {
    #[serde(rename = "VerifiableCredential")]
    verifiable_credential: Value,
}

pub fn request_body(args: &IssueArgs, claims: Value) -> Value {
    let mut request = json!({ "credentialSubject": claims });
    if let Some(holder) = &args.holder {
        request["holderDid"] = json!(holder);
    }
    if !args.credential_type.is_empty() {
        request["types"] = json!(args.credential_type);
    }
    json!({
        "RequestInfo": NodeClient::request_info("vc-issue"),
        "CredentialRequest": request,
    })
}

pub async fn run(args: &IssueArgs) -> anyhow::Result<()> {
    let claims = json_arg(&args.claims, "claims")?;
    if !claims.is_object() {
        anyhow::bail!("claims must be a JSON object");
    }

    let client = NodeClient::new(&args.endpoint);
    let Some(resp) = client
        .post::<IssueResponse>("/vc/v1/_issue", &request_body(args, claims))
        .await?
    else {
        return Ok(());
    };
    let vc = resp.verifiable_credential;

    println!("Credential issued!");
    println!("  ID:       {}", vc["id"].as_str().unwrap_or("?"));
    println!("  Issuer:   {}", vc["issuer"].as_str().unwrap_or("?"));
    println!("  Holder:   {}", vc["credentialSubject"]["id"].as_str().unwrap_or("?"));
    println!("  Issued:   {}", vc["issuanceDate"].as_str().unwrap_or("?"));
    println!("  Key:      {}", vc["proof"]["verificationMethod"].as_str().unwrap_or("?"));

    if let Some(path) = &args.out {
        std::fs::write(path, serde_json::to_string_pretty(&vc)?)?;
        println!("  Saved to: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let args = IssueArgs {
            claims: String::new(),
            holder: Some("did:example:jane".into()),
            credential_type: vec!["PermitCredential".into()],
            out: None,
            endpoint: DEFAULT_ENDPOINT.into(),
        };
        let body = request_body(&args, json!({"permitType": "FOOD_VENDOR"}));
        assert_eq!(body["RequestInfo"]["apiId"], "vc-issue");
        assert_eq!(body["CredentialRequest"]["holderDid"], "did:example:jane");
        assert_eq!(body["CredentialRequest"]["types"][0], "PermitCredential");
        assert_eq!(
            body["CredentialRequest"]["credentialSubject"]["permitType"],
            "FOOD_VENDOR"
        );
    }
}
