//! `attest init` — Write a default node configuration file.

use attest_core::EngineConfig;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the configuration.
    #[arg(short, long, default_value = "attest.toml")]
    pub output: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,

    /// Issuer identity to write into `[engine]`.
    #[arg(long)]
    pub issuer: Option<String>,

    /// Signing seed file to write into `[signing]`.
    #[arg(long, default_value = "./data/issuer.key")]
    pub key_file: PathBuf,
}

/// Default node configuration as TOML.
pub fn default_config_toml(args: &InitArgs) -> anyhow::Result<String> {
    let engine = EngineConfig {
        issuer: args.issuer.clone(),
        ..Default::default()
    };

    let mut doc = toml::Table::new();
    doc.insert(
        "api".into(),
        toml::Value::Table(toml::toml! {
            listen_addr = "127.0.0.1"
            port = 9001
        }),
    );
    doc.insert(
        "storage".into(),
        toml::Value::Table(toml::toml! {
            backend = "memory"
            data_dir = "./data"
            timeout_ms = 2000
        }),
    );
    doc.insert(
        "logging".into(),
        toml::Value::Table(toml::toml! {
            level = "info"
            format = "text"
        }),
    );
    let mut signing = toml::Table::new();
    signing.insert(
        "key_file".into(),
        toml::Value::String(args.key_file.display().to_string()),
    );
    signing.insert("retired_keys".into(), toml::Value::Array(Vec::new()));
    doc.insert("signing".into(), toml::Value::Table(signing));
    doc.insert("engine".into(), toml::Value::try_from(&engine)?);

    Ok(toml::to_string_pretty(&doc)?)
}

pub fn run(args: &InitArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            args.output.display()
        );
    }

    let contents = default_config_toml(args)?;
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&args.output, contents)?;

    println!("Wrote node configuration to {}", args.output.display());
    println!("Start the node with: attest-node --config {}", args.output.display());
    Ok(())
}
