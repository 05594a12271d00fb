// Hit tracing
// Append-only JSONL log of accepted hits for replay analysis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

use crate::gesture::{ActionSink, HitEvent, SinkError};

/// A single hit in the trace file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// RFC 3339 time of the hit
    pub timestamp: String,

    /// Identifies the session that produced the hit
    pub session_id: String,

    /// Milliseconds since the session started
    pub offset_ms: f64,

    pub hand: String,
    pub zone: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub midi_note: Option<u8>,

    pub velocity: f32,
}

impl TraceEntry {
    /// Serialize to JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Action sink appending one JSON line per hit
pub struct TraceSink {
    file_path: PathBuf,
    session_id: Uuid,
    started: Instant,
    started_wall: DateTime<Utc>,
}

impl TraceSink {
    /// Trace hits of a session that started at `started`
    pub fn new(file_path: PathBuf, started: Instant) -> Self {
        TraceSink {
            file_path,
            session_id: Uuid::new_v4(),
            started,
            started_wall: Utc::now(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn entry_for(&self, hit: &HitEvent) -> TraceEntry {
        let offset = hit.at.saturating_duration_since(self.started);
        let wall = chrono::Duration::from_std(offset)
            .map(|d| self.started_wall + d)
            .unwrap_or(self.started_wall);

        TraceEntry {
            timestamp: wall.to_rfc3339(),
            session_id: self.session_id.to_string(),
            offset_ms: offset.as_secs_f64() * 1000.0,
            hand: hit.hand.clone(),
            zone: hit.zone.clone(),
            midi_note: hit.midi_note,
            velocity: hit.velocity,
        }
    }
}

impl ActionSink for TraceSink {
    fn trigger(&mut self, hit: &HitEvent) -> Result<(), SinkError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        let json_line = self.entry_for(hit).to_json_line()?;
        file.write_all(json_line.as_bytes())?;
        file.flush()?;

        Ok(())
    }
}

/// Read trace entries from a JSONL file
pub fn read_trace_file(path: &Path) -> Result<Vec<TraceEntry>, SinkError> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let entry: TraceEntry = serde_json::from_str(line)?;
        entries.push(entry);
    }

    Ok(entries)
}
