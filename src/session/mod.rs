// Session module
// Runs a performance end to end and exports what was played

pub mod midi;
pub mod runner;
pub mod trace;

pub use midi::{export_midi, midi_velocity, write_midi_file, MidiError, MidiExportOptions};
pub use runner::{Session, SessionError, SessionSummary};
pub use trace::{read_trace_file, TraceEntry, TraceSink};
