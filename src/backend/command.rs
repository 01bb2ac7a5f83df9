//! net-snmp command lines as explicit values.
//!
//! A [`SnmpCommand`] is assembled from the host configuration once per
//! request and then run with a deadline and a cancellation token. The child
//! process is killed whenever the run future is dropped before it exits.

use crate::config::{Credentials, DEFAULT_PORT, HostConfig};
use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::version::Version;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Which net-snmp tool to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `snmpget`
    Get,
    /// `snmpgetnext -Cf`
    GetNext,
    /// `snmpwalk`, or `snmpbulkwalk` for bulk-walk hosts
    Walk,
}

/// Output of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// A fully assembled net-snmp invocation.
#[derive(Clone)]
pub struct SnmpCommand {
    program: &'static str,
    args: Vec<String>,
    address: String,
    deadline: Duration,
    /// Indices into `args` holding secrets, masked in logs.
    secret_args: Vec<usize>,
}

impl SnmpCommand {
    /// Build the invocation of `kind` for `oid` against the configured host.
    pub fn new(config: &HostConfig, kind: CommandKind, oid: &Oid, context: Option<&str>) -> Self {
        let mut cmd = Self {
            program: "snmpget",
            args: Vec::new(),
            address: config.address.clone(),
            deadline: match kind {
                CommandKind::Walk => config.timing.walk_deadline(),
                _ => config.timing.get_deadline(),
            },
            secret_args: Vec::new(),
        };

        match kind {
            CommandKind::Get => {}
            CommandKind::GetNext => {
                cmd.program = "snmpgetnext";
                cmd.arg("-Cf");
            }
            CommandKind::Walk if config.bulkwalk => {
                cmd.program = "snmpbulkwalk";
                cmd.arg(format!("-Cr{}", config.bulk_size));
            }
            CommandKind::Walk => cmd.program = "snmpwalk",
        }

        match &config.credentials {
            Credentials::Community(community) => {
                cmd.arg(config.version().flag());
                cmd.arg("-c");
                cmd.secret(community.expose());
            }
            Credentials::Usm(usm) => {
                cmd.arg(Version::V3.flag());
                cmd.arg("-l");
                cmd.arg(usm.level.to_string());
                if let Some((protocol, password)) = &usm.auth {
                    cmd.arg("-a");
                    cmd.arg(protocol.to_string());
                    cmd.arg("-u");
                    cmd.arg(&usm.security_name);
                    cmd.arg("-A");
                    cmd.secret(password.expose());
                } else {
                    cmd.arg("-u");
                    cmd.arg(&usm.security_name);
                }
                if let Some((protocol, password)) = &usm.privacy {
                    cmd.arg("-x");
                    cmd.arg(protocol.to_string());
                    cmd.arg("-X");
                    cmd.secret(password.expose());
                }
            }
        }

        // Loading MIBs costs a lot of CPU and is never needed with -On
        cmd.arg("-m");
        cmd.arg("");
        cmd.arg("-M");
        cmd.arg("");

        if let Some(timeout) = config.timing.timeout {
            cmd.arg("-t");
            cmd.arg(format!("{:.2}", timeout));
        }
        if let Some(retries) = config.timing.retries {
            cmd.arg("-r");
            cmd.arg(retries.to_string());
        }

        if kind == CommandKind::Walk {
            // Some agents return OIDs out of order; sorting happens afterwards
            cmd.arg("-Cc");
        }

        if let Some(context) = context
            && config.credentials.is_v3()
        {
            cmd.arg("-n");
            cmd.arg(context);
        }

        for flag in ["-On", "-OQ", "-Oe", "-Ot"] {
            cmd.arg(flag);
        }
        cmd.arg(target_spec(config));
        cmd.arg(oid.to_string());
        cmd
    }

    fn arg(&mut self, arg: impl Into<String>) {
        self.args.push(arg.into());
    }

    fn secret(&mut self, arg: &str) {
        self.secret_args.push(self.args.len());
        self.args.push(arg.to_string());
    }

    /// Tool name, e.g. `snmpbulkwalk`.
    pub fn program(&self) -> &str {
        self.program
    }

    /// Arguments after the tool name.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Device address this command talks to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Override the deadline after which the process is killed.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Shell-like rendering with secrets masked and empty arguments quoted.
    pub fn display_line(&self) -> String {
        let mut line = self.program.to_string();
        for (i, arg) in self.args.iter().enumerate() {
            line.push(' ');
            if self.secret_args.contains(&i) {
                line.push_str("***");
            } else if arg.is_empty() {
                line.push_str("''");
            } else {
                line.push_str(arg);
            }
        }
        line
    }

    /// Run the command and collect its output.
    ///
    /// `tools_dir` overrides where the net-snmp binaries are looked up
    /// (default: `PATH`). A non-zero exit status is a transport error carrying
    /// the tool's stderr.
    pub async fn run(
        &self,
        tools_dir: Option<&Path>,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput> {
        let program: PathBuf = match tools_dir {
            Some(dir) => dir.join(self.program),
            None => PathBuf::from(self.program),
        };

        tracing::trace!(
            snmp.address = %self.address,
            snmp.command = %self.display_line(),
            "running command"
        );

        let child = tokio::process::Command::new(&program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::Spawn {
                command: program.display().to_string(),
                source,
            })?;

        let start = Instant::now();
        let output = tokio::select! {
            output = child.wait_with_output() => output.map_err(|source| Error::Spawn {
                command: program.display().to_string(),
                source,
            })?,
            _ = cancel.cancelled() => {
                tracing::debug!(snmp.address = %self.address, "command cancelled, killing process");
                return Err(Error::Cancelled { address: self.address.clone() });
            }
            _ = tokio::time::sleep(self.deadline) => {
                tracing::debug!(
                    snmp.address = %self.address,
                    snmp.deadline = ?self.deadline,
                    "command deadline exceeded, killing process"
                );
                return Err(Error::Timeout {
                    address: self.address.clone(),
                    elapsed: start.elapsed(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                stderr
            };
            return Err(Error::Transport {
                address: self.address.clone(),
                message,
            });
        }

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

impl std::fmt::Debug for SnmpCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SnmpCommand({})", self.display_line())
    }
}

/// `[udp6:]address[:port]`, with IPv6 addresses bracketed.
fn target_spec(config: &HostConfig) -> String {
    let mut target = String::new();
    if config.is_ipv6_primary {
        target.push_str("udp6:");
    }
    if config.address.contains(':') {
        target.push('[');
        target.push_str(&config.address);
        target.push(']');
    } else {
        target.push_str(&config.address);
    }
    if config.port != DEFAULT_PORT {
        target.push_str(&format!(":{}", config.port));
    }
    target
}
