//! acq-fetch: Detect and fetch monitoring sections from one host.
//!
//! Part of the snmp-acquire CLI utilities.

use clap::Parser;
use snmp_acquire::cli::args::{DetectArgs, HostArgs, OutputArgs, cancel_on_ctrl_c};
use snmp_acquire::cli::output::{OutputContext, write_error};
use snmp_acquire::fetcher::HostFetcher;
use snmp_acquire::section::{SectionName, SectionStore};
use snmp_acquire::value::TextDecoder;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Detect and fetch monitoring sections.
///
/// Without --detect or --section every section of the store is fetched.
#[derive(Debug, Parser)]
#[command(name = "acq-fetch", version, about)]
struct Args {
    #[command(flatten)]
    host: HostArgs,

    #[command(flatten)]
    detect: DetectArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Section definitions (JSON).
    #[arg(long = "sections", value_name = "FILE")]
    sections: PathBuf,

    /// Fetch only these sections.
    #[arg(short = 's', long = "section", value_name = "NAME", conflicts_with = "detect")]
    section: Vec<String>,

    /// Only print the detected sections.
    #[arg(long = "detect-only", requires = "detect")]
    detect_only: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    match run(&args).await {
        Ok(code) => code,
        Err(e) => {
            write_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> snmp_acquire::Result<ExitCode> {
    let store = SectionStore::load(&args.sections)?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let backend = args.host.backend(cancel.clone())?;
    let decoder = TextDecoder::for_label(backend.config().character_encoding.as_deref())?;
    let mut fetcher = HostFetcher::with_backend(backend, args.host.paths(), cancel);

    let output_ctx = OutputContext {
        format: args.output.format,
        force_hex: args.output.hex,
        show_timing: args.output.timing,
        decoder,
    };

    let start = Instant::now();
    let sections: Vec<SectionName> = if args.detect.detect {
        let found = fetcher
            .detect(&store, args.detect.on_error, !args.detect.no_scan_cache)
            .await?;
        if args.detect_only {
            if let Err(e) = output_ctx.write_sections(&found) {
                eprintln!("Error writing output: {}", e);
                return Ok(ExitCode::FAILURE);
            }
            return Ok(ExitCode::SUCCESS);
        }
        found
    } else if args.section.is_empty() {
        store.iter().map(|(name, _)| name.clone()).collect()
    } else {
        args.section
            .iter()
            .map(|name| SectionName::from(name.as_str()))
            .collect()
    };

    let tables = fetcher.fetch(&store, &sections).await?;
    let timing = args.output.timing.then(|| start.elapsed());

    if let Err(e) = output_ctx.write_tables(&tables, timing) {
        eprintln!("Error writing output: {}", e);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
