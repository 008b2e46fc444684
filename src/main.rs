use clap::{error::ErrorKind, ArgAction, CommandFactory, Parser, ValueEnum};
use crossterm::{
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
    path::PathBuf,
    sync::Arc,
};

use keysprint::{
    app::App,
    app_dirs::AppDirs,
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    engine::{Engine, EngineSettings},
    logging::init_logging,
    profile::{JsonFileBackend, UserProfileStore},
    runtime::{CrosstermEventSource, FixedTicker, Runner, Ticker},
    text::Corpus,
    ui,
};

/// terminal typing sprints with per-user progress
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// length of a timed sprint in seconds
    #[clap(short = 's', long)]
    sprint_secs: Option<u64>,

    /// number of words in a word sprint
    #[clap(short = 'w', long)]
    word_target: Option<usize>,

    /// maximum words shown per line
    #[clap(long)]
    words_per_line: Option<usize>,

    /// JSON file with "phrases" and "paragraphs" to practice on
    #[clap(short = 't', long)]
    texts: Option<PathBuf>,

    /// where user results are stored
    #[clap(short = 'u', long)]
    users: Option<PathBuf>,

    /// colour theme to start with
    #[clap(long, value_enum)]
    theme: Option<ThemeName>,

    /// config file to read instead of the default location
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// write the effective config to the config file and exit
    #[clap(long)]
    write_config: bool,

    /// more log detail (-v info, -vv debug, -vvv trace)
    #[clap(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    /// log file location
    #[clap(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum ThemeName {
    Dark,
    Light,
    Ocean,
    Retro,
}

impl Cli {
    /// Flags given on the command line win over the config file.
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(secs) = self.sprint_secs {
            cfg.sprint_secs = secs;
        }
        if let Some(words) = self.word_target {
            cfg.word_target = words;
        }
        if let Some(n) = self.words_per_line {
            cfg.words_per_line = n;
        }
        if let Some(path) = &self.texts {
            cfg.texts_file = Some(path.clone());
        }
        if let Some(path) = &self.users {
            cfg.users_file = Some(path.clone());
        }
        if let Some(theme) = self.theme {
            cfg.theme = theme.to_string();
        }
        cfg.sanitized()
    }

    fn config_store(&self) -> FileConfigStore {
        self.config
            .as_ref()
            .map(FileConfigStore::with_path)
            .unwrap_or_default()
    }
}

fn build_app(config: &Config) -> App {
    let library = Arc::new(Corpus::load_or_builtin(config.texts_file.as_deref()));
    let users = JsonFileBackend::with_path(config.users_path());
    let engine = Engine::new(
        EngineSettings::from(config),
        library,
        Arc::new(SystemClock),
        UserProfileStore::open(Box::new(users)),
    );
    App::new(engine, &config.theme)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let log_file = cli.log_file.clone().unwrap_or_else(AppDirs::log_path);
    if let Err(e) = init_logging(cli.verbose, &log_file) {
        eprintln!("logging disabled: {e}");
    }

    let store = cli.config_store();
    let config = cli.apply(store.load());

    if cli.write_config {
        store.save(&config)?;
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = build_app(&config);
    tracing::info!(state = %app.engine.state(), "starting");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(
        &mut terminal,
        &mut app,
        FixedTicker::from_millis(config.tick_rate_ms),
    );

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    ticker: T,
) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(CrosstermEventSource::new(), ticker);
    terminal.draw(|f| ui::draw(app, f))?;

    while !app.should_quit() {
        if app.on_event(runner.step()) {
            terminal.draw(|f| ui::draw(app, f))?;
        }
    }

    tracing::info!("exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cli_defaults_leave_config_alone() {
        let cli = Cli::parse_from(["keysprint"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.write_config);
        assert_eq!(cli.apply(Config::default()), Config::default());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "keysprint",
            "-s",
            "60",
            "--word-target",
            "50",
            "--words-per-line",
            "8",
            "--theme",
            "ocean",
            "-u",
            "/tmp/users.json",
            "-vv",
        ]);
        let cfg = cli.apply(Config::default());

        assert_eq!(cfg.sprint_secs, 60);
        assert_eq!(cfg.word_target, 50);
        assert_eq!(cfg.words_per_line, 8);
        assert_eq!(cfg.theme, "Ocean");
        assert_eq!(cfg.users_file, Some(PathBuf::from("/tmp/users.json")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_zero_values_fall_back() {
        let cli = Cli::parse_from(["keysprint", "--sprint-secs", "0"]);
        assert_eq!(cli.apply(Config::default()).sprint_secs, 30);
    }

    #[test]
    fn test_theme_name_display() {
        assert_eq!(ThemeName::Retro.to_string(), "Retro");
    }

    #[test]
    fn test_build_app_uses_config_paths() {
        let dir = tempdir().unwrap();
        let users = dir.path().join("users.json");
        let cfg = Config {
            users_file: Some(users.clone()),
            theme: "Light".into(),
            ..Config::default()
        };

        let app = build_app(&cfg);

        assert_eq!(app.engine.state(), keysprint::engine::EngineState::Setup);
        assert_eq!(app.theme().name, "Light");
        assert!(!users.exists(), "nothing is written until a user exists");
    }
}
