//! CSV rendering and conditional gzip compression for exports.

use crate::error::Result;
use crate::models::LogDocument;
use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

const CSV_HEADER: &str =
    "timestamp,level,endpoint,status_code,response_time_ms,message,server,user_id,client_ip";

/// Finished export: bytes plus the metadata a download response needs.
#[derive(Debug, Clone)]
pub struct ExportPayload {
    pub filename: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub gzipped: bool,
}

/// Renders documents as CSV. Fields containing commas, quotes or newlines
/// are quoted with doubled inner quotes; newlines inside messages are
/// flattened to spaces so each record stays on one line.
pub fn to_csv(docs: &[LogDocument]) -> String {
    let mut out = String::with_capacity(docs.len() * 96 + CSV_HEADER.len() + 1);
    out.push_str(CSV_HEADER);
    out.push('\n');

    for doc in docs {
        let fields = [
            doc.timestamp.to_rfc3339(),
            doc.level.clone(),
            doc.endpoint.clone().unwrap_or_default(),
            doc.status_code.map(|c| c.to_string()).unwrap_or_default(),
            doc.response_time_ms
                .map(|v| v.to_string())
                .unwrap_or_default(),
            doc.message.clone(),
            doc.server.clone().unwrap_or_default(),
            doc.user_id.clone().unwrap_or_default(),
            doc.client_ip.clone().unwrap_or_default(),
        ];
        let row: Vec<String> = fields.iter().map(|f| escape_csv_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn escape_csv_field(field: &str) -> String {
    let flattened = field.replace(['\r', '\n'], " ");
    if flattened.contains([',', '"']) {
        format!("\"{}\"", flattened.replace('"', "\"\""))
    } else {
        flattened
    }
}

/// Timestamped download name, e.g. `logs_export_20260828_141530.csv`.
pub fn export_filename() -> String {
    format!("logs_export_{}.csv", Utc::now().format("%Y%m%d_%H%M%S"))
}

/// Builds the final payload, gzip-compressing bodies at or above
/// `compression_threshold` bytes (level 6, matching typical proxy defaults).
pub fn build_payload(csv: String, compression_threshold: usize) -> Result<ExportPayload> {
    let raw = csv.into_bytes();
    if raw.len() < compression_threshold {
        return Ok(ExportPayload {
            filename: export_filename(),
            content_type: "text/csv",
            body: raw,
            gzipped: false,
        });
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(6));
    encoder
        .write_all(&raw)
        .and_then(|_| encoder.finish())
        .map(|body| ExportPayload {
            filename: export_filename(),
            content_type: "text/csv",
            body,
            gzipped: true,
        })
        .map_err(|e| crate::error::AppError::store_error(format!("gzip failed: {}", e)))
}
