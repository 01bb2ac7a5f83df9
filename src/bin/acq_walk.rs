//! acq-walk: Walk SNMP subtrees, or capture them as a stored walk.
//!
//! Part of the snmp-acquire CLI utilities.

use clap::Parser;
use snmp_acquire::Oid;
use snmp_acquire::cli::args::{HostArgs, OutputArgs, cancel_on_ctrl_c};
use snmp_acquire::cli::output::{OutputContext, write_error};
use snmp_acquire::export::{default_export_oids, write_stored_walk};
use snmp_acquire::value::TextDecoder;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Walk SNMP subtrees.
#[derive(Debug, Parser)]
#[command(name = "acq-walk", version, about)]
struct Args {
    #[command(flatten)]
    host: HostArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// SNMPv3 context to query.
    #[arg(short = 'n', long = "context", conflicts_with = "export")]
    context: Option<String>,

    /// Write the walk to FILE in stored walk format instead of printing it.
    #[arg(long = "export", value_name = "FILE")]
    export: Option<PathBuf>,

    /// Subtrees to walk (default for --export: mib-2 and enterprises).
    #[arg(value_name = "OID")]
    oids: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    let mut oids: Vec<Oid> = match args.oids.iter().map(|s| Oid::parse(s)).collect() {
        Ok(oids) => oids,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };
    if oids.is_empty() {
        if args.export.is_none() {
            eprintln!("Error: an OID is required unless --export is given");
            return ExitCode::FAILURE;
        }
        oids = default_export_oids();
    }

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());
    let backend = match args.host.backend(cancel) {
        Ok(backend) => backend,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();

    if let Some(path) = &args.export {
        let mut file = match tokio::fs::File::create(path).await {
            Ok(file) => file,
            Err(e) => {
                write_error(&snmp_acquire::Error::io(path, e));
                return ExitCode::FAILURE;
            }
        };
        return match write_stored_walk(&backend, &oids, &mut file).await {
            Ok(written) => {
                if args.output.timing {
                    eprintln!(
                        "Exported {} rows in {:.1}ms",
                        written,
                        start.elapsed().as_secs_f64() * 1000.0
                    );
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                write_error(&e);
                ExitCode::FAILURE
            }
        };
    }

    let decoder = match TextDecoder::for_label(backend.config().character_encoding.as_deref()) {
        Ok(decoder) => decoder,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let mut rows = Vec::new();
    for oid in &oids {
        match backend.walk(oid, None, None, args.context.as_deref()).await {
            Ok(mut subtree) => rows.append(&mut subtree),
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

    if let Err(e) = output_ctx.write_rows(&backend.config().hostname, &rows, timing) {
        eprintln!("Error writing output: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
