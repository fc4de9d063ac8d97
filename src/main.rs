use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::{Duration, Instant},
};
use tracing::{info, warn};

use keypace::{
    app::{App, RedrawRequest},
    app_dirs::AppDirs,
    catalog::{Category, FixedPassage, PassageCatalog, PassageSource, Size},
    config::{Config, ConfigStore, FileConfigStore, SessionConfig},
    history::{FileHistoryStore, ReadOnlyHistory, ResultSink},
    logging,
    passage::Passage,
    runtime::{CrosstermEventSource, FixedTicker, KeypaceEvent, Runner},
    session::SessionState,
    timing::TICK_RATE_MS,
    ui,
};

/// typing speed practice in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type a passage against the clock. Live accuracy and wpm while you type, a summary with your recent results and their trend when you finish."
)]
pub struct Cli {
    /// session length in seconds (15, 30, 60 or 120)
    #[clap(short = 'd', long)]
    duration: Option<u64>,

    /// passage category
    #[clap(short = 'c', long, value_enum)]
    category: Option<Category>,

    /// passage size
    #[clap(short = 's', long, value_enum)]
    size: Option<Size>,

    /// custom text to practice instead of the built-in passages
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// remember the effective settings for the next run
    #[clap(long)]
    save: bool,
}

impl Cli {
    /// Overlay the flags that were given on top of the stored config.
    fn merge(&self, mut cfg: Config) -> Config {
        if let Some(duration) = self.duration {
            cfg.duration_secs = duration;
        }
        if let Some(category) = self.category {
            cfg.category = category;
        }
        if let Some(size) = self.size {
            cfg.size = size;
        }
        cfg
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = FileConfigStore::new();
    let cfg = cli.merge(store.load());
    let config = match SessionConfig::try_from(&cfg) {
        Ok(config) => config,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, err).exit();
        }
    };

    if let Some(text) = &cli.prompt {
        if Passage::new(text).is_empty() {
            let mut cmd = Cli::command();
            cmd.error(
                ErrorKind::ValueValidation,
                "custom text has no typeable characters",
            )
            .exit();
        }
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Err(err) = logging::init(&AppDirs::log_path()) {
        eprintln!("logging disabled: {err}");
    }

    if cli.save {
        match store.save(&Config::from(&config)) {
            Ok(()) => info!(path = %store.path().display(), "settings saved"),
            Err(err) => warn!("unable to save settings: {err}"),
        }
    }

    let history = FileHistoryStore::new();
    // custom texts are scored but kept out of the stored history
    let (source, sink): (Box<dyn PassageSource>, Box<dyn ResultSink>) = match cli.prompt.clone()
    {
        Some(text) => (
            Box::new(FixedPassage(text)),
            Box::new(ReadOnlyHistory(history)),
        ),
        None => (Box::new(PassageCatalog::embedded()), Box::new(history)),
    };
    let mut app = App::new(config, source, sink);
    let redraw = RedrawRequest::new();
    app.add_observer(Box::new(redraw.clone()));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start_tui(&mut terminal, &mut app, &redraw);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    redraw: &RedrawRequest,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| ui::draw(f, app, Instant::now()))?;

    loop {
        let event = runner.step_until(app.next_deadline());
        let mut dirty = false;

        match event {
            KeypaceEvent::Tick => {}
            KeypaceEvent::Resize => dirty = true,
            KeypaceEvent::Key(key) => {
                if handle_key(app, key) == Flow::Quit {
                    break;
                }
                dirty = true;
            }
        }

        let now = Instant::now();
        app.poll(now);

        if redraw.take() || dirty {
            terminal.draw(|f| ui::draw(f, app, now))?;
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) -> Flow {
    if key.kind == KeyEventKind::Release {
        return Flow::Continue;
    }
    if key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
    {
        return Flow::Quit;
    }

    let now = Instant::now();
    // errors from the settings keys are already surfaced through the notice line
    match (app.session().state(), key.code) {
        (_, KeyCode::Tab) => app.new_session(),
        (_, KeyCode::F(2)) => {
            let _ = app.cycle_duration();
        }
        (_, KeyCode::F(3)) => {
            let _ = app.cycle_category();
        }
        (_, KeyCode::F(4)) => {
            let _ = app.cycle_size();
        }
        (SessionState::Finished, KeyCode::Char('n') | KeyCode::Enter) => app.new_session(),
        (SessionState::Finished, _) => {}
        (_, KeyCode::Backspace) => {
            app.backspace(now);
        }
        (_, KeyCode::Char(_)) if key.modifiers.contains(KeyModifiers::CONTROL) => {}
        (_, KeyCode::Char(c)) => {
            app.type_char(c, now);
        }
        _ => {}
    }
    Flow::Continue
}
