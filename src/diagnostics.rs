use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

const MAX_LOG_BYTES: u64 = 1_000_000;

#[derive(Debug, Serialize)]
pub struct AuditEvent {
    pub ts: String,
    pub op: String,
    pub detail: String,
}

/// Audit lines may quote counterparty identifiers; strip phone-number-like
/// digit runs and email-shaped tokens before anything hits disk.
/// Store-generated ids are timestamp-based and exempt.
fn sanitize(input: &str) -> String {
    input
        .split_whitespace()
        .map(|token| {
            if token.starts_with("thread:") || token.starts_with("msg:") {
                return token.to_string();
            }
            let digits = token.chars().filter(|c| c.is_ascii_digit()).count();
            if digits >= 9 || token.contains('@') {
                "[redacted]".to_string()
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn log_event(log_dir: &Path, op: &str, detail: &str) -> io::Result<()> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join("inbox-audit.log");
    trim_log(&path)?;
    let event = AuditEvent {
        ts: Utc::now().to_rfc3339(),
        op: op.to_string(),
        detail: sanitize(detail),
    };
    let line = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

fn trim_log(path: &PathBuf) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let meta = fs::metadata(path)?;
    if meta.len() <= MAX_LOG_BYTES {
        return Ok(());
    }
    let data = fs::read(path)?;
    let keep_from = data.len().saturating_sub((MAX_LOG_BYTES / 2) as usize);
    fs::write(path, &data[keep_from..])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sanitize_redacts_phones_and_emails() {
        let cleaned = sanitize("reported by +6281234567890 contact buyer@example.com done");
        assert!(cleaned.contains("[redacted]"));
        assert!(!cleaned.contains("6281234567890"));
        assert!(!cleaned.contains("example.com"));
        assert!(cleaned.contains("done"));
    }

    #[test]
    fn sanitize_keeps_short_ids() {
        let cleaned = sanitize("thread t1 reported");
        assert_eq!(cleaned, "thread t1 reported");
    }

    #[test]
    fn sanitize_keeps_store_generated_ids() {
        let cleaned = sanitize("thread thread:1722850000000 reported");
        assert!(cleaned.contains("thread:1722850000000"));
    }

    #[test]
    fn log_event_writes_line() {
        let dir = tempdir().expect("temp");
        log_event(dir.path(), "report", "thread t1").expect("log");
        let contents =
            fs::read_to_string(dir.path().join("inbox-audit.log")).expect("read log");
        assert!(contents.contains("\"op\":\"report\""));
        assert!(contents.contains("thread t1"));
    }
}
