//! Output formatting for CLI tools.
//!
//! Supports human-readable, JSON, and raw output formats.

use crate::cli::args::OutputFormat;
use crate::oid::ScalarOid;
use crate::section::SectionName;
use crate::table::{Cell, Table};
use crate::value::TextDecoder;
use crate::varbind::VarBind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::Duration;

/// A single value ready for output.
#[derive(Debug, Serialize)]
pub struct ValueResult {
    pub oid: String,
    #[serde(rename = "type")]
    pub value_type: &'static str,
    pub value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_hex: Option<String>,
}

/// Result of a get or walk, ready for output.
#[derive(Debug, Serialize)]
pub struct OperationResult {
    pub host: String,
    pub results: Vec<ValueResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_ms: Option<f64>,
}

/// Output context for formatting.
pub struct OutputContext {
    pub format: OutputFormat,
    pub force_hex: bool,
    pub show_timing: bool,
    pub decoder: TextDecoder,
}

impl OutputContext {
    /// Create a new output context with default settings.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            force_hex: false,
            show_timing: false,
            decoder: TextDecoder::default(),
        }
    }

    /// Write get results; `None` values are written as missing.
    pub fn write_values(
        &self,
        host: &str,
        values: &[(ScalarOid, Option<Vec<u8>>)],
        elapsed: Option<Duration>,
    ) -> io::Result<()> {
        let results = values
            .iter()
            .map(|(oid, value)| match value {
                Some(bytes) => self.format_value(oid.to_string(), bytes),
                None => ValueResult {
                    oid: oid.to_string(),
                    value_type: "Missing",
                    value: serde_json::Value::Null,
                    raw_hex: None,
                },
            })
            .collect();
        self.write_result(&OperationResult {
            host: host.to_string(),
            results,
            timing_ms: elapsed.map(|d| d.as_secs_f64() * 1000.0),
        })
    }

    /// Write walk rows.
    pub fn write_rows(
        &self,
        host: &str,
        rows: &[VarBind],
        elapsed: Option<Duration>,
    ) -> io::Result<()> {
        let results = rows
            .iter()
            .map(|row| self.format_value(row.oid.to_string(), &row.value))
            .collect();
        self.write_result(&OperationResult {
            host: host.to_string(),
            results,
            timing_ms: elapsed.map(|d| d.as_secs_f64() * 1000.0),
        })
    }

    /// Write detected section names, one per line (or a JSON array).
    pub fn write_sections(&self, sections: &[SectionName]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(sections).map_err(io::Error::other)?;
                writeln!(stdout, "{}", json)
            }
            OutputFormat::Human | OutputFormat::Raw => {
                for name in sections {
                    writeln!(stdout, "{}", name)?;
                }
                Ok(())
            }
        }
    }

    /// Write fetched tables per section.
    pub fn write_tables(
        &self,
        tables: &BTreeMap<SectionName, Vec<Table>>,
        elapsed: Option<Duration>,
    ) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(tables).map_err(io::Error::other)?;
                writeln!(stdout, "{}", json)?;
            }
            OutputFormat::Human => {
                for (name, section_tables) in tables {
                    writeln!(stdout, "<<<{}>>>", name)?;
                    for table in section_tables {
                        self.write_table(&mut stdout, table, " | ")?;
                    }
                }
            }
            OutputFormat::Raw => {
                for (name, section_tables) in tables {
                    writeln!(stdout, "[{}]", name)?;
                    for table in section_tables {
                        self.write_table(&mut stdout, table, "\t")?;
                    }
                }
            }
        }
        if self.show_timing
            && let Some(elapsed) = elapsed
        {
            eprintln!("Timing: {:.1}ms", elapsed.as_secs_f64() * 1000.0);
        }
        Ok(())
    }

    fn write_table<W: Write>(&self, w: &mut W, table: &Table, separator: &str) -> io::Result<()> {
        for row in table {
            let cells: Vec<String> = row.iter().map(|cell| self.format_cell(cell)).collect();
            writeln!(w, "{}", cells.join(separator))?;
        }
        Ok(())
    }

    fn format_cell(&self, cell: &Cell) -> String {
        match cell {
            Cell::Text(text) if self.force_hex => format_hex_string(text.as_bytes()),
            Cell::Text(text) => text.clone(),
            Cell::Binary(bytes) => format_hex_string(bytes),
        }
    }

    fn format_value(&self, oid: String, bytes: &[u8]) -> ValueResult {
        if self.force_hex || !is_printable(bytes) {
            let hex = hex_string(bytes);
            ValueResult {
                oid,
                value_type: "Hex-STRING",
                value: serde_json::Value::String(format_hex_string(bytes)),
                raw_hex: Some(hex),
            }
        } else {
            ValueResult {
                oid,
                value_type: "STRING",
                value: serde_json::Value::String(self.decoder.decode(bytes)),
                raw_hex: None,
            }
        }
    }

    fn write_result(&self, result: &OperationResult) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        match self.format {
            OutputFormat::Human => self.write_human(&mut stdout, result),
            OutputFormat::Json => self.write_json(&mut stdout, result),
            OutputFormat::Raw => self.write_raw(&mut stdout, result),
        }
    }

    fn write_human<W: Write>(&self, w: &mut W, result: &OperationResult) -> io::Result<()> {
        for vb in &result.results {
            write!(w, "{} = ", vb.oid)?;
            match &vb.value {
                serde_json::Value::String(s) if vb.value_type == "STRING" => {
                    writeln!(w, "{}: \"{}\"", vb.value_type, s)?
                }
                serde_json::Value::String(s) => writeln!(w, "{}: {}", vb.value_type, s)?,
                _ => writeln!(w, "No value")?,
            }
        }

        if self.show_timing
            && let Some(ms) = result.timing_ms
        {
            writeln!(w, "\nTiming: {:.1}ms", ms)?;
        }

        Ok(())
    }

    fn write_json<W: Write>(&self, w: &mut W, result: &OperationResult) -> io::Result<()> {
        let json = serde_json::to_string_pretty(result).map_err(io::Error::other)?;
        writeln!(w, "{}", json)
    }

    fn write_raw<W: Write>(&self, w: &mut W, result: &OperationResult) -> io::Result<()> {
        for vb in &result.results {
            let value_str = match &vb.value {
                serde_json::Value::String(s) => s.clone(),
                _ => String::new(),
            };
            writeln!(w, "{}\t{}", vb.oid, value_str)?;
        }
        Ok(())
    }
}

/// Check if bytes are printable ASCII/UTF-8.
fn is_printable(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return true;
    }

    let printable = |c: char| !c.is_control() || c.is_ascii_whitespace();
    match std::str::from_utf8(bytes) {
        Ok(s) => s.chars().all(printable),
        Err(_) => false,
    }
}

/// Format bytes as hex string (lowercase, no separator).
fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Format bytes as spaced hex for display.
fn format_hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Write an error message to stderr.
pub fn write_error(err: &crate::Error) {
    eprintln!("Error: {}", err);
}
