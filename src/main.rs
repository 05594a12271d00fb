use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use air_instruments::audio::{render_instrument_samples, SamplePlayer, SoundBank};
use air_instruments::config::{ConfigError, KitConfig, MAX_FRAME_DIMENSION};
use air_instruments::gesture::{SinkChain, ZoneDispatcher};
use air_instruments::instruments::{get_instrument, list_instrument_names, list_instruments};
use air_instruments::session::{
    write_midi_file, MidiExportOptions, Session, SessionError, TraceSink,
};
use air_instruments::tracking::{BridgeSource, JsonLinesSource, ObservationSource};

#[derive(Parser, Debug)]
#[command(name = "air-instruments", version, about = "Camera-driven air drums and piano")]
struct Cli {
    /// Kit configuration JSON
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play an instrument from hand landmark frames
    Play {
        /// Instrument to play (overrides the configuration)
        #[arg(long)]
        instrument: Option<String>,

        /// Replay recorded frames from a JSON-lines file ("-" for stdin)
        #[arg(long)]
        frames: Option<PathBuf>,

        /// Landmark bridge command line, e.g. "python3 hand_bridge.py"
        #[arg(long)]
        bridge: Option<String>,

        /// Directory holding the instrument's sound files
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Append every hit to a JSONL trace
        #[arg(long)]
        trace: Option<PathBuf>,

        /// Write the performance to a MIDI file
        #[arg(long)]
        midi_out: Option<PathBuf>,

        /// Flip landmarks horizontally
        #[arg(long)]
        mirror: bool,

        /// Do not open an audio device
        #[arg(long)]
        silent: bool,
    },

    /// List the built-in instruments
    List,

    /// Print an instrument's zone layout as JSON
    Layout {
        instrument: String,

        #[arg(long, default_value_t = 1280, value_parser = frame_dimension())]
        width: u32,

        #[arg(long, default_value_t = 720, value_parser = frame_dimension())]
        height: u32,
    },

    /// Synthesize a WAV file for every zone of an instrument
    RenderSamples {
        instrument: Option<String>,

        /// Output directory (defaults to the instrument's asset directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn frame_dimension() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=i64::from(MAX_FRAME_DIMENSION))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), SessionError> {
    let mut config = match &cli.config {
        Some(path) => KitConfig::load(path)?,
        None => KitConfig::default(),
    };

    match cli.command {
        Command::Play {
            instrument,
            frames,
            bridge,
            assets,
            trace,
            midi_out,
            mirror,
            silent,
        } => {
            if let Some(name) = instrument {
                config.instrument = name;
            }
            if let Some(command) = bridge {
                config.bridge_command = command.split_whitespace().map(String::from).collect();
            }
            config.asset_dir = assets.or(config.asset_dir);
            config.trace_path = trace.or(config.trace_path);
            config.midi_out = midi_out.or(config.midi_out);
            config.frame.mirror |= mirror;
            play(&config, frames, silent)
        }
        Command::List => {
            for summary in list_instruments(config.frame.width, config.frame.height) {
                println!(
                    "{:<6} {:<12} {:>2} zones  {}",
                    summary.name, summary.title, summary.zone_count, summary.description
                );
            }
            Ok(())
        }
        Command::Layout {
            instrument,
            width,
            height,
        } => {
            let instrument = get_instrument(&instrument, width, height).ok_or_else(|| {
                ConfigError::UnknownInstrument {
                    name: instrument.clone(),
                    available: list_instrument_names().join(", "),
                }
            })?;
            let json = instrument.to_json_bytes().map_err(ConfigError::from)?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(&json)?;
            writeln!(stdout)?;
            Ok(())
        }
        Command::RenderSamples { instrument, out } => {
            if let Some(name) = instrument {
                config.instrument = name;
            }
            let instrument = config.instrument()?;
            let dir = match out {
                Some(dir) => dir,
                None => config.asset_dir(&instrument)?,
            };
            let written = render_instrument_samples(&instrument, &dir, &config.player.synth)?;
            log::info!("Rendered {} samples into {}", written.len(), dir.display());
            Ok(())
        }
    }
}

fn play(config: &KitConfig, frames: Option<PathBuf>, silent: bool) -> Result<(), SessionError> {
    let instrument = config.instrument()?;
    let dispatcher =
        ZoneDispatcher::new(instrument.zones.clone(), config.dispatcher_config(&instrument)?);
    let started = Instant::now();

    let mut sinks = SinkChain::new();
    if !silent {
        let mut bank = SoundBank::new(
            config.resolver(&instrument)?,
            instrument.voice,
            config.player.clone(),
        );
        let missing = bank.preload(instrument.zone_names());
        if !missing.is_empty() {
            log::warn!(
                "No sound files for {} ({})",
                missing.join(", "),
                if config.player.synth_fallback {
                    "using synthesized voices"
                } else {
                    "they will be silent"
                }
            );
        }
        sinks.push(Box::new(SamplePlayer::open(bank)?));
    }
    if let Some(path) = &config.trace_path {
        let trace = TraceSink::new(path.clone(), started);
        log::info!("Tracing hits to {} (session {})", path.display(), trace.session_id());
        sinks.push(Box::new(trace));
    }

    let source: Box<dyn ObservationSource> = match frames {
        Some(path) if path.as_os_str() != "-" => {
            Box::new(JsonLinesSource::open(&path, config.frame.clone())?)
        }
        Some(_) => Box::new(JsonLinesSource::new(io::stdin().lock(), config.frame.clone())),
        None if !config.bridge_command.is_empty() => {
            Box::new(BridgeSource::spawn(&config.bridge_command, config.frame.clone())?)
        }
        None => Box::new(JsonLinesSource::new(io::stdin().lock(), config.frame.clone())),
    };

    log::info!("Playing {} ({} zones)", instrument.title, instrument.zones.len());
    let mut session = Session::new(source, dispatcher, Box::new(sinks)).started_at(started);
    if config.midi_out.is_some() {
        session = session.with_recording();
    }

    let summary = session.run()?;
    println!(
        "{} frames, {} observations, {} hits",
        summary.frames, summary.observations, summary.hits
    );

    if let Some(path) = &config.midi_out {
        let options = MidiExportOptions {
            track_name: config.midi.track_name.clone().or_else(|| Some(instrument.title.clone())),
            ..config.midi.clone()
        };
        write_midi_file(
            path,
            session.recorded_hits(),
            session.started(),
            instrument.midi_channel,
            &options,
        )?;
    }

    Ok(())
}
