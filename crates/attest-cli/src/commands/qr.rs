//! `attest qr` — Generate a QR presentation code for a credential.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::Args;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;

use super::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct QrArgs {
    /// Credential id.
    pub id: String,

    /// Write the QR code PNG to this file.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QrCodeBody {
    qr_code_data: String,
    qr_code_image: String,
    expiry_time: i64,
}

#[derive(Deserialize)]
struct QrResponse {
    #[serde(rename = "QRCode")]
    qr_code: QrCodeBody,
}

/// PNG bytes from a `data:image/png;base64,` URL.
pub fn png_from_data_url(data_url: &str) -> anyhow::Result<Vec<u8>> {
    let encoded = data_url
        .strip_prefix("data:image/png;base64,")
        .ok_or_else(|| anyhow::anyhow!("QR image is not a PNG data URL"))?;
    Ok(STANDARD.decode(encoded)?)
}

pub async fn run(args: &QrArgs) -> anyhow::Result<()> {
    let body = json!({
        "RequestInfo": NodeClient::request_info("vc-qr-generate"),
        "QRRequest": { "vcId": args.id },
    });

    let client = NodeClient::new(&args.endpoint);
    let Some(resp) = client.post::<QrResponse>("/vc/v1/_generateQR", &body).await? else {
        return Ok(());
    };
    let code = resp.qr_code;

    println!("Presentation code generated");
    println!("  URL:      {}", code.qr_code_data);
    match chrono::DateTime::from_timestamp_millis(code.expiry_time) {
        Some(expiry) => println!("  Expires:  {}", expiry.to_rfc3339()),
        None => println!("  Expires:  {}", code.expiry_time),
    }

    if let Some(path) = &args.out {
        std::fs::write(path, png_from_data_url(&code.qr_code_image)?)?;
        println!("  Saved to: {}", path.display());
    }
    Ok(())
}
