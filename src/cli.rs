//! CLI interface for Journey.
//!
//! A headless driver for the timeline engine. Each subcommand opens a
//! session (restoring the saved viewport), applies its commands, prints
//! the result, and leaves the viewport saved for the next run.
//!
//! Journey data comes from `--data` or the `data` key in
//! `~/.journey/config.toml`.

mod format;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use jiff::Timestamp;
use tracing::debug;

use crate::config::Config;
use crate::engine::Engine;
use crate::filter::{DateRange, TimelineFilter};
use crate::input::{Input, KeyPress};
use crate::model::{EventType, JourneyRequest, Scale};
use crate::playback::Step;
use crate::provider::FileProvider;
use crate::storage::{KeyValueStore, MemoryStore, SqliteStore};

use format::{
    format_item, format_milestones, format_projects, format_scales, format_stats, format_ticks,
    format_viewport,
};

/// Journey: walk through your development timeline.
#[derive(Debug, Parser)]
#[command(name = "journey", after_long_help = USAGE_HELP)]
pub struct Cli {
    /// Journey JSON document. Overrides `data` in the config file.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// `SQLite` file for the saved viewport.
    #[arg(long, global = true, conflicts_with = "no_persist")]
    store: Option<PathBuf>,

    /// Keep the viewport in memory only.
    #[arg(long, global = true)]
    no_persist: bool,

    /// Only load events from the last N days of the journey.
    #[arg(long, global = true)]
    days: Option<u32>,

    /// Only load events from this project. Can be repeated.
    #[arg(long, global = true)]
    project: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

const USAGE_HELP: &str = r"Examples:
  journey --data journey.json show --scale 6h --position 0.5
  journey --data journey.json keys ctrl++ shift+right right
  journey --data journey.json jump evt-42
  journey --data journey.json play --speed 2 --fps 60
  journey --data journey.json --project uroboro stats

The viewport (scale and position) is saved after every change and
restored on the next run.";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the zoom levels with their window and tick spacing.
    Scales,

    /// Print the viewport, its ticks, and the visible markers.
    Show(ShowArgs),

    /// Replay key presses, then print the view.
    ///
    /// Keys: space, left, right, shift+left, shift+right, home, end,
    /// escape, ctrl++ (or ctrl+=), ctrl+-.
    Keys {
        #[arg(required = true)]
        keys: Vec<KeyPress>,
    },

    /// Select an event and center the viewport on it.
    Jump {
        /// Event ID.
        id: String,
    },

    /// Play forward from the current position until the end.
    Play {
        /// Speed multiplier, 0.5 to 3.
        #[arg(long)]
        speed: Option<f64>,

        /// Stop after this many frames even if the end was not reached.
        #[arg(long, default_value_t = 100_000)]
        max_frames: usize,

        /// Frames per second. 0 runs as fast as possible.
        #[arg(long, default_value_t = 0.0)]
        fps: f64,
    },

    /// Print project summaries and journey statistics.
    Stats,
}

#[derive(Debug, clap::Args)]
pub struct ShowArgs {
    /// Switch to this scale first (15m, 1h, 6h, 24h, 7d, full).
    #[arg(long)]
    scale: Option<Scale>,

    /// Move to this position (0 to 1) first.
    #[arg(long)]
    position: Option<f64>,

    /// Only show events of this type. Can be repeated.
    #[arg(long = "type")]
    kinds: Vec<EventType>,

    /// Only show events with this tag. Can be repeated.
    #[arg(long)]
    tag: Vec<String>,

    /// Case-insensitive text search over content, project, and tags.
    #[arg(long)]
    search: Option<String>,

    /// Only show events from this project. Can be repeated.
    #[arg(long)]
    filter_project: Vec<String>,

    /// Only show events at or after this instant (RFC 3339).
    #[arg(long)]
    from: Option<Timestamp>,

    /// Only show events at or before this instant (RFC 3339).
    #[arg(long)]
    to: Option<Timestamp>,
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config) -> Result<(), String> {
    let cli = Cli::parse();

    if matches!(cli.command, Command::Scales) {
        print!("{}", format_scales());
        return Ok(());
    }

    let mut engine = open_engine(&cli, config)?;

    match cli.command {
        Command::Scales => Ok(()),
        Command::Show(args) => cmd_show(&mut engine, args),
        Command::Keys { keys } => cmd_keys(&mut engine, keys),
        Command::Jump { id } => cmd_jump(&mut engine, &id),
        Command::Play {
            speed,
            max_frames,
            fps,
        } => cmd_play(&mut engine, speed, max_frames, fps),
        Command::Stats => cmd_stats(&engine),
    }
}

/// Build the engine from flags and config, restore the viewport, and load.
fn open_engine(cli: &Cli, config: &Config) -> Result<Engine, String> {
    let data = cli.data.clone().or_else(|| config.data.clone()).ok_or(
        "no journey data: pass --data <FILE> or set `data` in ~/.journey/config.toml",
    )?;

    let store: Box<dyn KeyValueStore> = if cli.no_persist {
        Box::new(MemoryStore::new())
    } else {
        let path = cli
            .store
            .clone()
            .or_else(|| config.store.clone())
            .or_else(SqliteStore::default_path)
            .ok_or("could not determine home directory")?;
        let store = SqliteStore::open(&path)
            .map_err(|e| format!("failed to open store at {}: {e}", path.display()))?;
        Box::new(store)
    };

    debug!(data = %data.display(), "opening journey");
    let mut engine = Engine::new(
        Box::new(FileProvider::new(data)),
        store,
        config.engine_options(),
    );

    let request = JourneyRequest {
        days: cli.days.or(config.days),
        projects: cli.project.clone(),
    };
    if !engine.load(&request) {
        let error = engine.state().error.unwrap_or_default();
        return Err(format!("failed to load journey: {error}"));
    }
    Ok(engine)
}

fn cmd_show(engine: &mut Engine, args: ShowArgs) -> Result<(), String> {
    if let Some(scale) = args.scale {
        engine.set_scale(scale);
    }
    if let Some(position) = args.position {
        engine.set_position(position);
    }

    let date_range = match (args.from, args.to) {
        (None, None) => None,
        (from, to) => {
            let journey = engine.journey().ok_or("no journey loaded")?;
            let range = DateRange {
                start: from.unwrap_or(journey.start()),
                end: to.unwrap_or(journey.end()),
            };
            if range.start > range.end {
                return Err(format!("--from {} is after --to {}", range.start, range.end));
            }
            Some(range)
        }
    };

    let filter = TimelineFilter {
        projects: args.filter_project.into_iter().collect(),
        event_types: args.kinds.into_iter().collect(),
        tags: args.tag.into_iter().collect(),
        date_range,
        search_query: args.search.unwrap_or_default(),
    };
    if !filter.is_identity() {
        engine.set_filter(filter);
    }

    print_view(engine);
    Ok(())
}

fn cmd_keys(engine: &mut Engine, keys: Vec<KeyPress>) -> Result<(), String> {
    for key in keys {
        let changed = engine.handle_input(Input::Key(key));
        let outcome = if changed { "applied" } else { "ignored" };
        println!("{:<12} {outcome}", key.to_string());
    }
    println!();
    print_view(engine);
    Ok(())
}

fn cmd_jump(engine: &mut Engine, id: &str) -> Result<(), String> {
    if !engine.handle_input(Input::DoubleClick(id.to_string())) {
        return Err(format!("no event with id {id}"));
    }
    print_view(engine);
    Ok(())
}

fn cmd_play(
    engine: &mut Engine,
    speed: Option<f64>,
    max_frames: usize,
    fps: f64,
) -> Result<(), String> {
    if let Some(speed) = speed {
        engine.set_play_speed(speed);
    }
    if !engine.play() {
        let scale = engine.state().viewport.scale;
        return Err(format!(
            "nothing to play at scale {scale}: zoom in to a fixed window first"
        ));
    }

    let pause = (fps.is_finite() && fps > 0.0).then(|| Duration::from_secs_f64(1.0 / fps));
    let mut frames = 0;
    let mut last_decile = decile(engine.state().viewport.position);

    while frames < max_frames {
        let Some(step) = engine.advance_frame() else {
            break;
        };
        frames += 1;

        let viewport = engine.state().viewport;
        let current = decile(viewport.position);
        if current != last_decile || step == Step::Finished {
            println!("{}", format_viewport(&viewport));
            last_decile = current;
        }
        if let Some(pause) = pause {
            thread::sleep(pause);
        }
    }

    if engine.state().playback.is_playing {
        engine.pause();
        println!("stopped after {frames} frames");
    } else {
        println!("reached the end after {frames} frames");
    }
    Ok(())
}

fn cmd_stats(engine: &Engine) -> Result<(), String> {
    let journey = engine.journey().ok_or("no journey loaded")?;
    print!("{}", format_projects(journey.projects()));
    println!();
    print!("{}", format_stats(journey.stats()));
    println!();
    print!("{}", format_milestones(journey.milestones()));
    Ok(())
}

fn print_view(engine: &Engine) {
    let state = engine.state();
    let viewport = state.viewport;

    println!("{}", format_viewport(&viewport));
    println!("ticks: {}", format_ticks(&engine.ticks(), viewport.scale));

    let items = engine.visible_items();
    if items.is_empty() {
        println!("No events in view");
        return;
    }
    for item in &items {
        let selected = state.selected_event.as_deref();
        println!("{}", format_item(item, &viewport, selected));
    }
}

#[allow(clippy::cast_possible_truncation)]
fn decile(position: f64) -> i64 {
    (position * 10.0).floor() as i64
}
