//! Command-line argument structures for the `acq-*` CLI tools.

use crate::backend::{Backend, ProcessBackend, StoredWalkBackend};
use crate::config::{BackendKind, Credentials, HostConfig, Paths};
use crate::detect::OnError;
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Output format for CLI tools.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output for scripting.
    Json,
    /// Raw tab-separated output for scripting.
    Raw,
}

/// Arguments describing the host to query.
///
/// Either a JSON host configuration (`--host-config`) or individual flags.
#[derive(Debug, Parser)]
pub struct HostArgs {
    /// Hostname; also the address unless --address is given.
    #[arg(value_name = "HOST")]
    pub host: String,

    /// Host configuration file (JSON). Connection flags are ignored when given.
    #[arg(long = "host-config", value_name = "FILE")]
    pub host_config: Option<PathBuf>,

    /// IP address or DNS name to query.
    #[arg(long = "address")]
    pub address: Option<String>,

    /// Community string (v1/v2c).
    #[arg(short = 'c', long = "community", default_value = "public")]
    pub community: String,

    /// SNMPv3 credentials: LEVEL,USER or LEVEL,AUTH,USER,PASS[,PRIV,PRIVPASS].
    #[arg(long = "usm", value_delimiter = ',', num_args = 1.., conflicts_with = "community")]
    pub usm: Option<Vec<String>>,

    /// Use SNMPv2c.
    #[arg(long = "v2c")]
    pub v2c: bool,

    /// Walk with snmpbulkwalk (implies v2c).
    #[arg(long = "bulk")]
    pub bulk: bool,

    /// Repetitions per bulk request.
    #[arg(long = "bulk-size", default_value_t = crate::config::DEFAULT_BULK_SIZE)]
    pub bulk_size: u32,

    /// UDP port.
    #[arg(short = 'p', long = "port", default_value_t = crate::config::DEFAULT_PORT)]
    pub port: u16,

    /// Address is IPv6.
    #[arg(long = "ipv6")]
    pub ipv6: bool,

    /// Per-request timeout in seconds passed to the tools.
    #[arg(short = 't', long = "timeout")]
    pub timeout: Option<f64>,

    /// Retry count passed to the tools.
    #[arg(short = 'r', long = "retries")]
    pub retries: Option<u32>,

    /// Character encoding of string values (e.g. cp1252).
    #[arg(long = "encoding")]
    pub encoding: Option<String>,

    /// Answer from this stored walk instead of querying the device.
    #[arg(long = "stored-walk", value_name = "PATH")]
    pub stored_walk: Option<PathBuf>,

    /// Directory with the net-snmp tools (default: search PATH).
    #[arg(long = "tools-dir", value_name = "DIR")]
    pub tools_dir: Option<PathBuf>,

    /// Base directory for caches and stored walks.
    #[arg(long = "var-dir", value_name = "DIR", default_value = "var")]
    pub var_dir: PathBuf,
}

impl HostArgs {
    /// The host configuration from file or flags.
    pub fn host_config(&self) -> Result<HostConfig> {
        if let Some(path) = &self.host_config {
            return HostConfig::load(path);
        }

        let credentials = match &self.usm {
            Some(parts) => Credentials::from_tuple(parts)?,
            None => Credentials::community(&self.community),
        };
        let address = self.address.clone().unwrap_or_else(|| self.host.clone());
        let mut builder = HostConfig::builder(&self.host, address)
            .credentials(credentials)
            .port(self.port)
            .ipv6(self.ipv6)
            .snmpv2c(self.v2c)
            .bulkwalk(self.bulk)
            .bulk_size(self.bulk_size);
        if let Some(secs) = self.timeout {
            builder = builder.timeout(crate::config::seconds("timeout", secs)?);
        }
        if let Some(retries) = self.retries {
            builder = builder.retries(retries);
        }
        if let Some(label) = &self.encoding {
            builder = builder.character_encoding(label);
        }
        if self.stored_walk.is_some() {
            builder = builder.backend(BackendKind::StoredWalk);
        }
        Ok(builder.build())
    }

    pub fn paths(&self) -> Paths {
        Paths::new(&self.var_dir)
    }

    /// Backend for the configured host.
    pub fn backend(&self, cancel: CancellationToken) -> Result<Backend> {
        let config = Arc::new(self.host_config()?);
        if let Some(path) = &self.stored_walk {
            return Ok(Backend::StoredWalk(StoredWalkBackend::open(config, path)));
        }
        match (&self.tools_dir, config.backend) {
            (Some(dir), BackendKind::Classic) => Ok(Backend::Process(
                ProcessBackend::new(config, cancel).with_tools_dir(dir),
            )),
            _ => Ok(Backend::for_host(config, &self.paths(), cancel)),
        }
    }
}

/// Detection arguments for `acq-fetch`.
#[derive(Debug, Parser)]
pub struct DetectArgs {
    /// Run detection and fetch only detected sections.
    #[arg(long = "detect")]
    pub detect: bool,

    /// Failure policy during detection: raise, warn, or ignore.
    #[arg(long = "on-error", default_value = "raise")]
    pub on_error: OnError,

    /// Do not read or write the single value cache.
    #[arg(long = "no-scan-cache")]
    pub no_scan_cache: bool,
}

/// Output control arguments.
#[derive(Debug, Parser)]
pub struct OutputArgs {
    /// Output format: human, json, or raw.
    #[arg(short = 'O', long = "output", default_value = "human")]
    pub format: OutputFormat,

    /// Always display values as hex.
    #[arg(long = "hex")]
    pub hex: bool,

    /// Show elapsed time on stderr.
    #[arg(long = "timing")]
    pub timing: bool,

    /// Enable debug logging (snmp_acquire=debug).
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Enable trace logging (snmp_acquire=trace).
    #[arg(short = 'D', long = "trace")]
    pub trace: bool,
}

impl OutputArgs {
    /// Initialize tracing based on debug/trace flags.
    pub fn init_tracing(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = if self.trace {
            "snmp_acquire=trace"
        } else if self.debug {
            "snmp_acquire=debug"
        } else {
            "snmp_acquire=warn"
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Cancel `token` on Ctrl-C so running commands are killed.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupted, cancelling");
            token.cancel();
        }
    });
}
