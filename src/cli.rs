use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};
use serde_json::Value;
use std::io::Read;
use std::time::Duration;
use tracing::info;

use crate::provider::{Provider, Registry};
use crate::vault::VaultConfig;

#[derive(Parser)]
#[command(
    name = "vaultform",
    about = "Reconcile declared Vault resources against a Vault server",
    version
)]
pub struct Cli {
    /// Vault server address.
    #[arg(
        long,
        default_value = "http://127.0.0.1:8200",
        global = true,
        env = "VAULT_ADDR"
    )]
    pub vault_addr: String,

    /// Vault token used for every request.
    #[arg(long, global = true, env = "VAULT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Vault Enterprise namespace.
    #[arg(long, global = true, env = "VAULT_NAMESPACE")]
    pub namespace: Option<String>,

    /// CA certificate (PEM) used to verify the server.
    #[arg(long, global = true, env = "VAULT_CACERT")]
    pub ca_cert: Option<String>,

    /// Disable TLS certificate verification.
    #[arg(
        long,
        global = true,
        env = "VAULT_SKIP_VERIFY",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub skip_tls_verify: bool,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the schema of every resource and data source.
    Schema,
    /// Create or update a resource. Prints the resulting state.
    Apply {
        /// Resource type, e.g. vault_mfa_login_enforcement
        resource_type: String,
        /// JSON file with the desired configuration ("-" for stdin).
        #[arg(long)]
        config: String,
        /// JSON file with the prior state, if the resource already exists.
        #[arg(long)]
        state: Option<String>,
    },
    /// Re-read a resource. Prints the refreshed state; a null id means it is gone.
    Refresh {
        resource_type: String,
        #[arg(long)]
        state: String,
    },
    /// Delete a resource.
    Destroy {
        resource_type: String,
        #[arg(long)]
        state: String,
    },
    /// Import an existing object by its identifier. Prints the state.
    Import { resource_type: String, id: String },
    /// Read a data source. Prints its output.
    Data {
        /// Data source type, e.g. vault_kv_secret_list
        data_source_type: String,
        #[arg(long)]
        config: String,
    },
}

impl Cli {
    pub fn vault_config(&self) -> VaultConfig {
        let mut config =
            VaultConfig::new(&self.vault_addr).with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(token) = &self.token {
            config = config.with_token(token);
        }
        if let Some(namespace) = &self.namespace {
            config = config.with_namespace(namespace);
        }
        if let Some(ca_cert) = &self.ca_cert {
            config = config.with_ca_cert(ca_cert);
        }
        config.skip_tls_verify = self.skip_tls_verify;
        config
    }
}

fn read_json(source: &str) -> Result<Value> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read JSON from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))?
    };
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", source))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run(cli: Cli) -> Result<()> {
    if let Commands::Schema = cli.command {
        // no server needed, so no token either
        return print_json(&Registry::default().schema());
    }

    let provider = Provider::configure(&cli.vault_config())?;

    match cli.command {
        Commands::Schema => {}
        Commands::Apply {
            resource_type,
            config,
            state,
        } => {
            let config = read_json(&config)?;
            let prior = state.as_deref().map(read_json).transpose()?;
            let state = provider.apply(&resource_type, prior, config).await?;
            info!("{} applied", resource_type);
            print_json(&state)?;
        }
        Commands::Refresh {
            resource_type,
            state,
        } => {
            let state = provider.refresh(&resource_type, read_json(&state)?).await?;
            print_json(&state)?;
        }
        Commands::Destroy {
            resource_type,
            state,
        } => {
            provider.destroy(&resource_type, read_json(&state)?).await?;
            info!("{} destroyed", resource_type);
        }
        Commands::Import { resource_type, id } => {
            let state = provider.import(&resource_type, &id).await?;
            print_json(&state)?;
        }
        Commands::Data {
            data_source_type,
            config,
        } => {
            let output = provider
                .read_data(&data_source_type, read_json(&config)?)
                .await?;
            print_json(&output)?;
        }
    }

    Ok(())
}
