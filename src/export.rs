//! Capturing a device walk in the stored walk format.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::value::render_value;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Subtrees captured when no OIDs are given: `mib-2` and `enterprises`.
pub fn default_export_oids() -> Vec<Oid> {
    vec![crate::oid!(1, 3, 6, 1, 2, 1), crate::oid!(1, 3, 6, 1, 4, 1)]
}

/// Walk `oids` and write every row as an `<oid> <value>` line.
///
/// Subtrees are written in numeric order. Values are rendered so that
/// [`StoredWalkBackend`](crate::backend::StoredWalkBackend) reads back the
/// same bytes. A subtree whose walk fails is logged and left out; only
/// cancellation and write errors stop the export. Returns the number of rows
/// written.
pub async fn write_stored_walk<W>(backend: &Backend, oids: &[Oid], writer: &mut W) -> Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut oids = oids.to_vec();
    oids.sort();
    oids.dedup();

    let mut written = 0;
    for oid in &oids {
        let rows = match backend.walk_contexts(oid, None, None).await {
            Ok(rows) => rows,
            Err(e @ Error::Cancelled { .. }) => return Err(e),
            Err(e) => {
                tracing::warn!(snmp.oid = %oid, error = %e, "walk failed, subtree left out of export");
                continue;
            }
        };

        let mut chunk = String::new();
        for row in &rows {
            chunk.push_str(&format!("{} {}\n", row.oid, render_value(&row.value)));
        }
        writer
            .write_all(chunk.as_bytes())
            .await
            .map_err(|source| Error::Io { path: None, source })?;
        tracing::debug!(snmp.oid = %oid, snmp.rows = rows.len(), "exported subtree");
        written += rows.len();
    }

    writer
        .flush()
        .await
        .map_err(|source| Error::Io { path: None, source })?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StoredWalkBackend;
    use crate::config::HostConfig;
    use crate::oid;
    use std::sync::Arc;

    const DUMP: &str = "\
.1.3.6.1.2.1.1.1.0 \"Linux sw1\"
.1.3.6.1.2.1.1.3.0 123456
.1.3.6.1.2.1.2.2.1.6.2 \"00 1A 2B 3C 4D 5E \"
.1.3.6.1.4.1.2021.4.5.0 8048236
";

    fn stored(text: &str) -> Backend {
        let config = Arc::new(HostConfig::builder("sw1", "10.0.0.1").build());
        Backend::StoredWalk(StoredWalkBackend::from_text(config, text))
    }

    #[tokio::test]
    async fn test_export_reads_back_identically() {
        let source = stored(DUMP);
        let mut out = Vec::new();
        let written = write_stored_walk(&source, &default_export_oids(), &mut out)
            .await
            .unwrap();
        assert_eq!(written, 4);

        let copy = stored(std::str::from_utf8(&out).unwrap());
        for oid in default_export_oids() {
            assert_eq!(
                copy.walk(&oid, None, None, None).await.unwrap(),
                source.walk(&oid, None, None, None).await.unwrap()
            );
        }
    }

    #[tokio::test]
    async fn test_export_sorted_and_deduplicated() {
        let source = stored(DUMP);
        let mut out = Vec::new();
        write_stored_walk(
            &source,
            &[oid!(1, 3, 6, 1, 4, 1), oid!(1, 3, 6, 1, 2, 1, 1), oid!(1, 3, 6, 1, 4, 1)],
            &mut out,
        )
        .await
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                ".1.3.6.1.2.1.1.1.0 \"Linux sw1\"",
                ".1.3.6.1.2.1.1.3.0 \"123456\"",
                ".1.3.6.1.4.1.2021.4.5.0 \"8048236\"",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_subtree_skipped() {
        let config = Arc::new(HostConfig::builder("sw1", "10.0.0.1").build());
        let missing = Backend::StoredWalk(StoredWalkBackend::open(config, "/nonexistent/dump"));
        let mut out = Vec::new();
        let written = write_stored_walk(&missing, &default_export_oids(), &mut out)
            .await
            .unwrap();
        assert_eq!(written, 0);
        assert!(out.is_empty());
    }
}
