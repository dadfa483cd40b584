//! Append-only plain-text visit log
//!
//! Each visit becomes one delimited multi-line block. Appends are serialized
//! through an async mutex and written with a single `write_all`, so blocks
//! from concurrent requests never interleave.

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::EnrichmentError;
use crate::models::{VisitRecord, VisitSource};

pub const ENTRY_DELIMITER: &str = "-----------";

pub struct VisitLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl VisitLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one visit block, creating the file if needed
    pub async fn append(&self, visit: &VisitRecord) -> Result<(), EnrichmentError> {
        let entry = format_log_entry(visit);

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    /// Whole log as raw bytes
    pub async fn read_all(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

/// Render the raw log block for a visit
pub fn format_log_entry(visit: &VisitRecord) -> String {
    let heading = match visit.source {
        VisitSource::Redirect => "🔗 Redirect Capture",
        VisitSource::Beacon => "✅ Deep Tracking",
    };

    let json_or_na = |value: Option<String>| value.unwrap_or_else(|| "N/A".to_string());

    let fingerprint = json_or_na(
        visit
            .fingerprint
            .as_ref()
            .and_then(|fp| serde_json::to_string(fp).ok()),
    );
    let geo = serde_json::to_string(&visit.geo).unwrap_or_else(|_| "{}".to_string());
    let client_geo = json_or_na(
        visit
            .client_geo
            .as_ref()
            .and_then(|g| serde_json::to_string(g).ok()),
    );
    let duration = visit
        .duration_ms
        .map(|ms| format!("{ms}ms"))
        .unwrap_or_else(|| "N/A".to_string());

    let id = log_field(visit.id.as_deref().unwrap_or("N/A"));
    let ip = log_field(&visit.client_ip);
    let ua = log_field(visit.user_agent.as_deref().unwrap_or("N/A"));
    let (fingerprint, geo, client_geo) = (
        log_field(&fingerprint),
        log_field(&geo),
        log_field(&client_geo),
    );

    format!(
        "\n\n{heading}\nTime: {time}\nID: {id}\nIP: {ip}\nUser-Agent: {ua}\nDuration: {duration}\nFingerprint: {fingerprint}\nGeo: {geo}\nClient Geo: {client_geo}\nEvents: {events}\nVPN Suspected: {vpn}\n{ENTRY_DELIMITER}\n",
        time = visit.received_at.to_rfc3339(),
        events = visit.event_count(),
        vpn = visit.vpn_suspected,
    )
}

/// Keep a client-supplied value on one line and free of the block delimiter
fn log_field(value: &str) -> String {
    let max_dashes = ENTRY_DELIMITER.len() - 1;
    let mut out = String::with_capacity(value.len());
    let mut dashes = 0;
    for c in value.chars() {
        if c == '-' {
            if dashes == max_dashes {
                out.push('\\');
                dashes = 0;
            }
            dashes += 1;
            out.push(c);
        } else if c.is_control() {
            dashes = 0;
            out.extend(c.escape_default());
        } else {
            dashes = 0;
            out.push(c);
        }
    }
    out
}
