pub mod client;
pub mod init;
pub mod issue;
pub mod qr;
pub mod resolve;
pub mod revoke;
pub mod status;
pub mod verify;

/// Read a JSON argument given inline or as a path to a file.
pub fn json_arg(value: &str, what: &str) -> anyhow::Result<serde_json::Value> {
    let text = if std::path::Path::new(value).exists() {
        std::fs::read_to_string(value)?
    } else {
        value.to_string()
    };
    serde_json::from_str(&text).map_err(|e| anyhow::anyhow!("invalid {} JSON: {}", what, e))
}
