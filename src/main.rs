use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use mathdrill::{
    app::{self, App},
    app_dirs::AppDirs,
    catalog::{HistoryDisplay, QuestionSetId},
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore, StorageBackend},
    error::StoreError,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    selector::{ExhaustionPolicy, FreshSelector, QuestionSelector, StruggleSelector},
    session::SessionController,
    store::{FileKvStore, KvStore, SqliteKvStore, StruggleStore},
    ui::struggles::struggle_rows,
    util::format_secs,
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 100;

/// adaptive math facts drill for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Flash-card drill for arithmetic facts. Questions you miss or answer slowly are remembered and asked again until you answer them quickly."
)]
pub struct Cli {
    /// question set to drill, skipping the menu
    #[clap(long, value_name = "SET")]
    set: Option<QuestionSetId>,

    /// number of questions per session
    #[clap(short = 'n', long)]
    questions: Option<u32>,

    /// where struggle data is stored
    #[clap(long, value_enum)]
    backend: Option<StorageBackend>,

    /// directory holding struggle data, results and the log file
    #[clap(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// what to do when the review walk picks nothing
    #[clap(long, value_enum)]
    exhaustion_policy: Option<ExhaustionPolicy>,

    /// show questions or answers in the session history strip
    #[clap(long, value_enum)]
    history: Option<HistoryDisplay>,

    /// never resurface past struggles
    #[clap(long)]
    no_review: bool,

    /// print the available question sets and exit
    #[clap(long)]
    list_sets: bool,

    /// print tracked struggle questions and exit
    #[clap(long)]
    show_struggles: bool,

    /// clear struggle data for SET (or every set) and exit
    #[clap(long, value_name = "SET", num_args = 0..=1, default_missing_value = "all")]
    clear_struggles: Option<String>,

    /// write the effective settings to the config file and exit
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Layer command-line overrides on top of the stored config
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(n) = self.questions {
            config.max_questions = n;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(policy) = self.exhaustion_policy {
            config.exhaustion_policy = policy;
        }
        if self.history.is_some() {
            config.history_display = self.history;
        }
        if self.no_review {
            config.review = false;
        }
        config
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config_store = FileConfigStore::new();
    let config = cli.apply_to(config_store.load());

    if cli.list_sets {
        for set in QuestionSetId::ALL {
            let def = set.definition();
            println!(
                "{:<20} {:<22} slow after {}",
                set.to_string(),
                def.name,
                format_secs(def.slow_time_limit_ms)
            );
        }
        return Ok(());
    }

    if cli.save_config {
        config_store.save(&config)?;
        println!("saved {}", config_store.path().display());
        return Ok(());
    }

    let Some(state_dir) = cli.state_dir.clone().or_else(AppDirs::state_dir) else {
        let mut cmd = Cli::command();
        cmd.error(
            ErrorKind::Io,
            "could not determine a state directory, pass --state-dir",
        )
        .exit();
    };
    fs::create_dir_all(&state_dir)?;

    if cli.show_struggles || cli.clear_struggles.is_some() {
        let store = StruggleStore::load(open_kv(config.backend, &state_dir)?);
        return match &cli.clear_struggles {
            Some(target) => clear_struggles(store, target),
            None => {
                print_struggles(&store);
                Ok(())
            }
        };
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_tracing(&state_dir)?;
    info!(state_dir = %state_dir.display(), backend = %config.backend, "starting");

    let mut app = build_app(&cli, &config, &state_dir)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = app::run(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    info!("exiting");
    Ok(())
}

fn init_tracing(state_dir: &Path) -> Result<(), Box<dyn Error>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(AppDirs::log_path(state_dir))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mathdrill=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn open_kv(backend: StorageBackend, state_dir: &Path) -> Result<Box<dyn KvStore>, StoreError> {
    Ok(match backend {
        StorageBackend::File => Box::new(FileKvStore::new(state_dir)),
        StorageBackend::Sqlite => Box::new(SqliteKvStore::open(AppDirs::db_path(state_dir))?),
    })
}

fn build_app(cli: &Cli, config: &Config, state_dir: &Path) -> Result<App, Box<dyn Error>> {
    let store = StruggleStore::load(open_kv(config.backend, state_dir)?);
    let selector: Box<dyn QuestionSelector> = if config.review {
        Box::new(StruggleSelector::new(config.exhaustion_policy))
    } else {
        Box::new(FreshSelector)
    };

    let controller = SessionController::new(
        store,
        selector,
        Box::new(StdRng::from_entropy()),
        Box::new(SystemClock),
        config.session_config(),
    );
    let results_log = config
        .results_log
        .then(|| AppDirs::results_path(state_dir));
    let mut app = App::new(controller, results_log);

    if let Some(set) = cli.set {
        app.menu_index = QuestionSetId::ALL
            .iter()
            .position(|&s| s == set)
            .unwrap_or(0);
        app.controller.select_set(set)?;
    }
    Ok(app)
}

fn print_struggles(store: &StruggleStore) {
    let mut any = false;
    for (set, pools) in store.all() {
        if pools.is_empty() {
            continue;
        }
        any = true;
        println!("{} ({} tracked)", set.name(), pools.len());
        for row in struggle_rows(pools) {
            let avg = row
                .avg_time_ms
                .map(|ms| format_secs(ms.round() as u64))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<14} {:<6} count {:<3} avg {}",
                row.question, row.kind, row.count, avg
            );
        }
    }
    if !any {
        println!("no struggle questions tracked");
    }
}

fn clear_struggles(mut store: StruggleStore, target: &str) -> Result<(), Box<dyn Error>> {
    if target.eq_ignore_ascii_case("all") {
        store.clear_all();
        println!("cleared all struggle data");
        return Ok(());
    }

    match target.parse::<QuestionSetId>() {
        Ok(set) => {
            store.clear_set(set);
            println!("cleared struggle data for {}", set.name());
            Ok(())
        }
        Err(msg) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, msg).exit();
        }
    }
}
