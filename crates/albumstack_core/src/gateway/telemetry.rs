//! Per-request access log records and trace segments.
//!
//! # Invariants
//! - Exactly one access record and one trace segment per handled request.
//! - Access record field names equal the declared access log format keys.

use chrono::{DateTime, Utc};
use crate::logging::access_log_target;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use uuid::Uuid;

/// Placeholder the managed gateway writes for absent identity fields.
pub const ABSENT_FIELD: &str = "-";

/// Log target of emitted trace segments.
pub const TRACE_TARGET: &str = "trace";

const REQUEST_TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogRecord {
    pub request_id: String,
    pub caller: String,
    pub http_method: String,
    pub ip: String,
    pub protocol: String,
    pub request_time: String,
    pub resource_path: String,
    pub response_length: usize,
    pub status: u16,
    pub user: String,
}

/// Formats a timestamp the way `$context.requestTime` renders it.
pub fn format_request_time(at: DateTime<Utc>) -> String {
    at.format(REQUEST_TIME_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceHttp {
    pub method: String,
    pub path: String,
    pub status: u16,
}

/// One trace segment for a handled request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSegment {
    pub trace_id: String,
    pub id: String,
    pub name: String,
    /// Epoch seconds.
    pub start_time: f64,
    pub end_time: f64,
    pub http: TraceHttp,
    /// Set for 4xx responses.
    pub error: bool,
    /// Set for 5xx responses.
    pub fault: bool,
}

impl TraceSegment {
    /// Generates a trace id of the form `1-<epoch hex>-<96 random bits hex>`.
    pub fn new_trace_id(at: DateTime<Utc>) -> String {
        let random = Uuid::new_v4().simple().to_string();
        format!("1-{:08x}-{}", at.timestamp(), &random[..24])
    }

    /// Generates a 64-bit segment id in hex.
    pub fn new_segment_id() -> String {
        Uuid::new_v4().simple().to_string()[..16].to_string()
    }

    /// `X-Amzn-Trace-Id` header value for this segment.
    pub fn header_value(&self) -> String {
        format!("Root={};Parent={};Sampled=1", self.trace_id, self.id)
    }
}

/// Destination of access records and trace segments.
pub trait TelemetrySink {
    fn record_access(&self, record: &AccessLogRecord);
    fn record_segment(&self, segment: &TraceSegment);
}

/// Writes telemetry through the `log` facade.
///
/// Access records are written as one JSON object per line to the access
/// log target, trace segments at `info` to target `trace`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetrySink;

impl TelemetrySink for LogTelemetrySink {
    fn record_access(&self, record: &AccessLogRecord) {
        match serde_json::to_string(record) {
            Ok(line) => info!(target: access_log_target(), "{line}"),
            Err(err) => warn!(
                "event=access_log module=gateway status=error request_id={} error={err}",
                record.request_id
            ),
        }
    }

    fn record_segment(&self, segment: &TraceSegment) {
        match serde_json::to_string(segment) {
            Ok(line) => info!(target: TRACE_TARGET, "{line}"),
            Err(err) => warn!(
                "event=trace_segment module=gateway status=error trace_id={} error={err}",
                segment.trace_id
            ),
        }
    }
}

/// Keeps telemetry in memory; used by tests and the CLI `invoke` summary.
#[derive(Debug, Default)]
pub struct MemoryTelemetrySink {
    access: Mutex<Vec<AccessLogRecord>>,
    segments: Mutex<Vec<TraceSegment>>,
}

impl MemoryTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access_records(&self) -> Vec<AccessLogRecord> {
        self.access
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn segments(&self) -> Vec<TraceSegment> {
        self.segments
            .lock()
            .map(|segments| segments.clone())
            .unwrap_or_default()
    }
}

impl TelemetrySink for MemoryTelemetrySink {
    fn record_access(&self, record: &AccessLogRecord) {
        if let Ok(mut records) = self.access.lock() {
            records.push(record.clone());
        }
    }

    fn record_segment(&self, segment: &TraceSegment) {
        if let Ok(mut segments) = self.segments.lock() {
            segments.push(segment.clone());
        }
    }
}
