//! Backend running the net-snmp command line tools.

use super::command::{CommandKind, SnmpCommand};
use crate::config::HostConfig;
use crate::error::Result;
use crate::oid::{Oid, ScalarOid};
use crate::value::{is_soft_miss, strip_value};
use crate::varbind::{RowInfo, VarBind};
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs `snmpget`/`snmpgetnext`/`snmpwalk`/`snmpbulkwalk` per request.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    config: Arc<HostConfig>,
    tools_dir: Option<PathBuf>,
    cancel: CancellationToken,
}

impl ProcessBackend {
    pub fn new(config: Arc<HostConfig>, cancel: CancellationToken) -> Self {
        Self {
            config,
            tools_dir: None,
            cancel,
        }
    }

    /// Look up the tools in `dir` instead of `PATH`.
    pub fn with_tools_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tools_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub async fn get(&self, oid: &ScalarOid, context: Option<&str>) -> Result<Option<Bytes>> {
        let kind = if oid.is_next() {
            CommandKind::GetNext
        } else {
            CommandKind::Get
        };
        let cmd = SnmpCommand::new(&self.config, kind, oid.oid(), context);
        let output = cmd.run(self.tools_dir.as_deref(), &self.cancel).await?;

        let Some(first) = parse_response(&output.stdout).into_iter().next() else {
            return Ok(None);
        };

        if oid.is_next() && !first.oid.is_below(oid.oid()) {
            tracing::trace!(
                snmp.oid = %oid,
                snmp.next = %first.oid,
                "getnext left the requested subtree"
            );
            return Ok(None);
        }
        Ok(Some(first.value))
    }

    pub async fn walk(&self, oid: &Oid, context: Option<&str>) -> Result<RowInfo> {
        let cmd = SnmpCommand::new(&self.config, CommandKind::Walk, oid, context);
        let output = cmd.run(self.tools_dir.as_deref(), &self.cancel).await?;
        Ok(parse_response(&output.stdout)
            .into_iter()
            .filter(|vb| vb.oid.starts_with(oid))
            .collect())
    }
}

/// Parse `oid = value` lines as printed with `-On -OQ`.
///
/// Lines without `=` or with an unparsable OID are skipped. Soft misses (no
/// such object/instance, end of MIB) produce no row. A quoted value that does
/// not end on its line continues on the following lines, joined with a space.
pub fn parse_response(stdout: &[u8]) -> Vec<VarBind> {
    let mut rows = Vec::new();
    let mut lines = stdout.split(|&b| b == b'\n').map(<[u8]>::trim_ascii);

    while let Some(line) = lines.next() {
        if line.is_empty() {
            continue;
        }
        let Some(eq) = line.iter().position(|&b| b == b'=') else {
            tracing::debug!(
                snmp.line = %String::from_utf8_lossy(line),
                "skipping malformed response line"
            );
            continue;
        };

        let oid_text = line[..eq].trim_ascii();
        let mut value = line[eq + 1..].trim_ascii().to_vec();

        if value.first() == Some(&b'"') && value.last() != Some(&b'"') {
            for next in lines.by_ref() {
                value.push(b' ');
                value.extend_from_slice(next);
                if value.last() == Some(&b'"') {
                    break;
                }
            }
        }

        let oid = match std::str::from_utf8(oid_text).map(Oid::parse) {
            Ok(Ok(oid)) => oid,
            _ => {
                tracing::debug!(
                    snmp.line = %String::from_utf8_lossy(line),
                    "skipping response line with invalid OID"
                );
                continue;
            }
        };

        if is_soft_miss(&value) {
            tracing::trace!(snmp.oid = %oid, "soft miss");
            continue;
        }

        rows.push(VarBind::new(oid, strip_value(&value)));
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    #[test]
    fn test_parse_simple_lines() {
        let out = b".1.3.6.1.2.1.1.1.0 = \"Linux sw1\"\n.1.3.6.1.2.1.1.3.0 = 1234567\n";
        let rows = parse_response(out);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].oid, oid!(1, 3, 6, 1, 2, 1, 1, 1, 0));
        assert_eq!(&rows[0].value[..], b"Linux sw1");
        assert_eq!(&rows[1].value[..], b"1234567");
    }

    #[test]
    fn test_split_on_first_equals_only() {
        let rows = parse_response(b".1.3.6.1.2.1.1.5.0 = \"a=b\"\n");
        assert_eq!(&rows[0].value[..], b"a=b");
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let out = b"garbage without separator\nnot.an.oid = 5\n.1.3.6.1.2.1.1.7.0 = 72\n";
        let rows = parse_response(out);
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0].value[..], b"72");
    }

    #[test]
    fn test_soft_misses_produce_no_rows() {
        let out = b".1.3.6.1.2.1.1.9.0 = No Such Object available on this agent at this OID\n\
                    .1.3.6.1.2.1.1.9.1 = No Such Instance currently exists at this OID\n";
        assert!(parse_response(out).is_empty());
    }

    #[test]
    fn test_multiline_hex_dump() {
        let out = b".1.3.6.1.2.1.2.2.1.6.2 = \"00 1A 2B 3C \n4D 5E \"\n\
                    .1.3.6.1.2.1.2.2.1.6.3 = \"\"\n";
        let rows = parse_response(out);
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0].value[..], &[0x00, 0x1A, 0x2B, 0x3C, 0x4D, 0x5E]);
        assert_eq!(&rows[1].value[..], b"");
    }

    #[test]
    fn test_latin1_bytes_preserved() {
        let rows = parse_response(b".1.3.6.1.2.1.1.6.0 = \"Z\xFCrich\"\n");
        assert_eq!(&rows[0].value[..], b"Z\xFCrich");
    }
}
