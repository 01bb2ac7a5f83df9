//! acq-get: Fetch single SNMP values.
//!
//! Part of the snmp-acquire CLI utilities.

use clap::Parser;
use snmp_acquire::ScalarOid;
use snmp_acquire::cli::args::{HostArgs, OutputArgs, cancel_on_ctrl_c};
use snmp_acquire::cli::output::{OutputContext, write_error};
use snmp_acquire::value::TextDecoder;
use std::process::ExitCode;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Fetch one or more SNMP values.
///
/// An OID ending in `.*` returns the first value below that prefix.
#[derive(Debug, Parser)]
#[command(name = "acq-get", version, about)]
struct Args {
    #[command(flatten)]
    host: HostArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// SNMPv3 context to query.
    #[arg(short = 'n', long = "context")]
    context: Option<String>,

    /// OIDs to fetch (dotted notation, optionally ending in `.*`).
    #[arg(required = true, value_name = "OID")]
    oids: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    let oids: Vec<ScalarOid> = match args.oids.iter().map(|s| ScalarOid::parse(s)).collect() {
        Ok(oids) => oids,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());
    let backend = match args.host.backend(cancel) {
        Ok(backend) => backend,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };
    let decoder = match TextDecoder::for_label(backend.config().character_encoding.as_deref()) {
        Ok(decoder) => decoder,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let mut values = Vec::with_capacity(oids.len());
    for oid in oids {
        match backend.get(&oid, args.context.as_deref()).await {
            Ok(value) => values.push((oid, value.map(|v| v.to_vec()))),
            Err(e) => {
                write_error(&e);
                return ExitCode::FAILURE;
            }
        }
    }
    let elapsed = start.elapsed();

    let output_ctx = OutputContext {
        format: args.output.format,
        force_hex: args.output.hex,
        show_timing: args.output.timing,
        decoder,
    };
    let timing = args.output.timing.then_some(elapsed);

    if let Err(e) = output_ctx.write_values(&backend.config().hostname, &values, timing) {
        eprintln!("Error writing output: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
