//! Zone-file text to [`Zone`]
//!
//! Understands one record per line (`host [ttl] IN type data`), `$TTL`
//! and `$INCLUDE`. Blank lines and lines starting with `;` are skipped;
//! other `$` directives are ignored.

use dnssync_core::{Error, Record, Result, Time, Zone};
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// How deep `$INCLUDE` may nest before the file is rejected
pub const MAX_INCLUDE_DEPTH: usize = 16;

const INCLUDE_DIRECTIVE: &str = "$INCLUDE";
const TTL_DIRECTIVE: &str = "$TTL";

/// Read `file` with every `$INCLUDE` replaced by the included file's lines
///
/// Include paths are relative to `base`, not to the including file.
pub async fn read_zone_lines(base: &Path, file: &Path) -> Result<Vec<String>> {
    let mut lines = Vec::new();

    // Lines still to visit, last one first
    let mut pending: Vec<(String, usize)> = read_lines(file)
        .await?
        .into_iter()
        .rev()
        .map(|line| (line, 0))
        .collect();

    while let Some((line, depth)) = pending.pop() {
        let Some(target) = line.strip_prefix(INCLUDE_DIRECTIVE) else {
            lines.push(line);
            continue;
        };

        let target = target.split_whitespace().next().ok_or_else(|| {
            Error::parse(format!("{INCLUDE_DIRECTIVE} without a file name"))
        })?;
        if depth >= MAX_INCLUDE_DEPTH {
            return Err(Error::parse(format!(
                "{INCLUDE_DIRECTIVE} nested deeper than {MAX_INCLUDE_DEPTH} levels at {target}"
            )));
        }

        let included = read_lines(&base.join(target)).await?;
        debug!("[zonefile] Included {} line(s) from {}", included.len(), target);
        pending.extend(included.into_iter().rev().map(|line| (line, depth + 1)));
    }

    Ok(lines)
}

async fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).await.map_err(|e| {
        Error::Io(io::Error::new(
            e.kind(),
            format!("Could not read {}: {e}", path.display()),
        ))
    })?;
    Ok(text
        .lines()
        .map(|line| line.replace('\r', "").trim().to_string())
        .collect())
}

/// Build a zone from its lines
///
/// `$TTL` applies to every record without its own TTL, wherever it appears
/// in the file. Inherited TTLs are not written back out by the export.
pub fn parse_zone(domain: &str, lines: &[String]) -> Result<Zone> {
    let mut default_ttl = None;
    let mut record_lines = Vec::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if let Some(value) = line.strip_prefix(TTL_DIRECTIVE) {
            if let Some(value) = value.split_whitespace().next() {
                default_ttl = Some(Time::parse(value)?);
            }
        } else if line.starts_with('$') {
            debug!("[zonefile] Ignoring directive: {}", line);
        } else {
            record_lines.push(line);
        }
    }

    let records = record_lines
        .into_iter()
        .map(|line| {
            let record = Record::parse(line)?;
            Ok(match (record.ttl(), default_ttl) {
                (None, Some(ttl)) => record.with_inherited_ttl(ttl),
                _ => record,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Zone::new(domain)
        .with_default_ttl(default_ttl)
        .with_records(records))
}
