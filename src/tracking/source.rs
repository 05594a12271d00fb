// Observation sources
// Frames come from a JSON-lines stream: a recorded file, stdin, or a bridge subprocess

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use thiserror::Error;

use super::landmarks::{parse_frame, FrameGeometry, TrackedFrame};

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed frame on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to start landmark bridge `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Landmark bridge did not signal ready, got: {0}")]
    NotReady(String),

    #[error("Landmark bridge command is empty")]
    EmptyCommand,
}

/// Anything that yields tracked frames in order
pub trait ObservationSource {
    /// Next frame, or `None` once input is exhausted
    fn next_frame(&mut self) -> Result<Option<TrackedFrame>, TrackingError>;
}

impl<S: ObservationSource + ?Sized> ObservationSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<TrackedFrame>, TrackingError> {
        (**self).next_frame()
    }
}

/// Reads one JSON frame per line
pub struct JsonLinesSource<R: BufRead> {
    reader: R,
    geometry: FrameGeometry,
    line_number: usize,
    buffer: String,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R, geometry: FrameGeometry) -> Self {
        Self {
            reader,
            geometry,
            line_number: 0,
            buffer: String::new(),
        }
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    /// Lines consumed so far, blank ones included
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl JsonLinesSource<BufReader<File>> {
    /// Replay a recorded frame file
    pub fn open(path: &Path, geometry: FrameGeometry) -> Result<Self, TrackingError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), geometry))
    }
}

impl<R: BufRead> ObservationSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<TrackedFrame>, TrackingError> {
        loop {
            self.buffer.clear();
            if self.reader.read_line(&mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buffer.trim();
            if line.is_empty() {
                continue;
            }

            return parse_frame(line, &self.geometry)
                .map(Some)
                .map_err(|source| TrackingError::Parse {
                    line: self.line_number,
                    source,
                });
        }
    }
}

/// Frames from a landmark bridge subprocess.
///
/// The bridge prints `READY` once its model is loaded, then one JSON frame
/// per line on stdout. The child is killed when the source is dropped.
pub struct BridgeSource {
    child: Child,
    frames: JsonLinesSource<BufReader<ChildStdout>>,
}

impl BridgeSource {
    /// Start `command[0]` with the remaining elements as arguments
    pub fn spawn(command: &[String], geometry: FrameGeometry) -> Result<Self, TrackingError> {
        let (program, args) = command.split_first().ok_or(TrackingError::EmptyCommand)?;
        let display = command.join(" ");

        log::info!("Starting landmark bridge: {}", display);
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| TrackingError::Spawn {
                command: display.clone(),
                source,
            })?;

        let Some(stdout) = child.stdout.take() else {
            stop_child(&mut child);
            return Err(TrackingError::NotReady("no stdout".to_string()));
        };
        let mut reader = BufReader::new(stdout);

        let mut ready_line = String::new();
        if let Err(e) = reader.read_line(&mut ready_line) {
            stop_child(&mut child);
            return Err(e.into());
        }
        if ready_line.trim() != "READY" {
            stop_child(&mut child);
            return Err(TrackingError::NotReady(ready_line.trim().to_string()));
        }

        log::info!("Landmark bridge ready");

        let mut frames = JsonLinesSource::new(reader, geometry);
        frames.line_number = 1;
        Ok(Self { child, frames })
    }
}

impl ObservationSource for BridgeSource {
    fn next_frame(&mut self) -> Result<Option<TrackedFrame>, TrackingError> {
        self.frames.next_frame()
    }
}

impl Drop for BridgeSource {
    fn drop(&mut self) {
        stop_child(&mut self.child);
    }
}

/// Kill the bridge process and reap it
fn stop_child(child: &mut Child) {
    let _ = child.kill();
    if let Err(e) = child.wait() {
        log::warn!("Failed to reap landmark bridge: {}", e);
    }
}
