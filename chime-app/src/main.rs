//! CHIME - arithmetic quiz with procedural sound feedback
//!
//! Terminal front-end: one question at a time, four choices, and a short
//! synthesized sound for every game event.

mod app;
mod quiz;

use std::env;
use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chime_audio::{AudioEngine, Backend, Config, CpalBackend, UnavailableBackend};
use chime_tui::Theme;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::App;

/// Frame rate for UI updates
const FPS: u64 = 30;

/// Environment variable holding the log filter
const LOG_ENV: &str = "CHIME_LOG";

/// Command line options
#[derive(Debug, Default, PartialEq)]
struct Options {
    /// Run without opening an audio device
    silent: bool,
    theme: Option<String>,
}

fn parse_args(args: &[String]) -> Options {
    let mut options = Options::default();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--silent" => options.silent = true,
            "--theme" => options.theme = iter.next().cloned(),
            other => {
                if let Some(name) = other.strip_prefix("--theme=") {
                    options.theme = Some(name.to_string());
                }
            }
        }
    }
    options
}

/// Log to a file; the terminal belongs to the UI
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chime");
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = File::create(dir.join("chime.log")) else {
        return;
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args);

    let config = Config::load();
    let theme = match options.theme.as_deref() {
        Some(name) => Theme::by_name(name).unwrap_or_else(|| {
            warn!(theme = name, "unknown theme, using default");
            Theme::default()
        }),
        None => Theme::default(),
    };

    let backend: Box<dyn Backend> = if options.silent {
        Box::new(UnavailableBackend)
    } else {
        Box::new(CpalBackend)
    };
    info!(backend = backend.name(), "starting");

    // The audio context is opened lazily on the first key press
    let engine = AudioEngine::with_config(backend, &config);
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1);
    let mut app = App::new(engine, config, theme, seed).with_config_path(Config::config_path());

    // Initialize terminal
    if let Err(e) = enable_raw_mode() {
        error!(error = %e, "no usable terminal");
        return Err(e.into());
    }
    let mut terminal = match setup_terminal() {
        Ok(terminal) => terminal,
        Err(e) => {
            // Leave the shell usable
            let _ = execute!(stdout(), LeaveAlternateScreen);
            let _ = disable_raw_mode();
            error!(error = %e, "terminal setup failed");
            return Err(e.into());
        }
    };

    let result = run_app(&mut terminal, &mut app);

    // Cleanup
    app.shutdown();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> anyhow::Result<()> {
    let frame_duration = Duration::from_millis(1000 / FPS);
    let mut last_frame = Instant::now();

    loop {
        if app.should_quit() {
            break;
        }

        terminal.draw(|frame| app.draw(frame))?;

        // Handle input
        let timeout = frame_duration.saturating_sub(last_frame.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        // Maintain frame rate
        let elapsed = last_frame.elapsed();
        if elapsed < frame_duration {
            thread::sleep(frame_duration - elapsed);
        }
        app.tick(last_frame.elapsed().as_secs_f64());
        last_frame = Instant::now();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("chime")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args_defaults() {
        assert_eq!(parse_args(&args(&[])), Options::default());
    }

    #[test]
    fn test_parse_args_flags() {
        let options = parse_args(&args(&["--silent", "--theme", "contrast"]));
        assert!(options.silent);
        assert_eq!(options.theme.as_deref(), Some("contrast"));

        let options = parse_args(&args(&["--theme=chalk", "--unknown"]));
        assert!(!options.silent);
        assert_eq!(options.theme.as_deref(), Some("chalk"));
    }
}
