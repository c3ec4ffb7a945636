//! tenkey - numeric keypad scale player
//!
//! Run with: cargo run -- [--config tenkey.toml] [--scale 3]

mod app;
mod ui;

use std::{fs::File, path::PathBuf};

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tenkey::{config::Config, dsp::Waveform, session::Session};

use ui::{KeypadEvents, TenkeyUi, TerminalSurface};

#[derive(Parser, Debug)]
#[command(name = "tenkey", version, about = "Play scale degrees from the numeric keypad")]
struct Args {
    /// TOML file with settings and custom scales
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scale to start on (0-based, clamped)
    #[arg(short, long)]
    scale: Option<usize>,

    /// Accept digits from the main keyboard row, not just the keypad
    #[arg(long)]
    any_digits: bool,

    /// Oscillator shape: sine, square, sawtooth, triangle
    #[arg(short, long)]
    waveform: Option<Waveform>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Where to write the log (the terminal belongs to the UI)
    #[arg(long, default_value = "tenkey.log")]
    log_file: PathBuf,
}

fn init_logging(path: &PathBuf, verbose: bool) {
    use simplelog::*;

    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    let file = match File::create(path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("cannot create log file {}: {e}", path.display());
            return;
        }
    };

    if WriteLogger::init(level, Config::default(), file).is_ok() {
        log::info!("tenkey starting (log level: {level:?})");
    }
}

fn load_config(args: &Args) -> EyreResult<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .wrap_err_with(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if args.any_digits {
        config.require_keypad = false;
    }
    if let Some(waveform) = args.waveform {
        config.waveform = waveform;
    }
    Ok(config)
}

fn run(
    args: &Args,
    config: &Config,
    context: Option<tenkey::audio::RealtimeContext>,
    output: Option<app::AudioOutput>,
    enhanced: bool,
    terminal: &mut ratatui::DefaultTerminal,
) -> EyreResult<()> {
    let mut session = Session::new(
        config,
        context,
        TerminalSurface::default(),
        KeypadEvents::new(enhanced),
    )?;
    if let Some(index) = args.scale {
        session.select_scale(index);
    }
    session.start()?;

    TenkeyUi::new(session, output, enhanced).run(terminal)
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_logging(&args.log_file, args.verbose);

    let mut config = load_config(&args)?;

    let (context, output) = match app::start_audio(config.master_gain) {
        Ok((context, output)) => (Some(context), Some(output)),
        Err(e) => {
            log::warn!("audio unavailable, running silent: {e:#}");
            (None, None)
        }
    };

    let mut terminal = ratatui::init();

    let enhanced = KeypadEvents::probe();
    if !enhanced && config.require_keypad {
        log::warn!("terminal does not report keypad keys; accepting any digits");
        config.require_keypad = false;
    }

    let result = run(&args, &config, context, output, enhanced, &mut terminal);

    ratatui::restore();
    result
}
