mod app_logic;
mod core;

use crate::app_logic::{connect_remote_root, format_json, format_report, run_quick_search, run_search};
use crate::core::options::APP_NAME;
use crate::core::{
    AnimationLevel, CoreOptionsManager, OptionsManagerOperations, PathMode, ResultKind,
    SearchOptions, path_utils,
};
use clap::{ArgAction, Parser, ValueEnum};
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::File;
use std::io;
use std::process::ExitCode;

const EXIT_CLEAN: u8 = 0;
const EXIT_UNKNOWN_ERROR: u8 = 1;
const EXIT_RESULTS: u8 = 2;
const EXIT_RESULTS_BAD: u8 = 3;

const LOG_FILENAME: &str = "fast_search.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PathModeArg {
    Absolute,
    Relative,
    Name,
}

impl From<PathModeArg> for PathMode {
    fn from(arg: PathModeArg) -> Self {
        match arg {
            PathModeArg::Absolute => PathMode::Absolute,
            PathModeArg::Relative => PathMode::Relative,
            PathModeArg::Name => PathMode::NameOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AnimationArg {
    None,
    Pinwheel,
    Full,
}

impl From<AnimationArg> for AnimationLevel {
    fn from(arg: AnimationArg) -> Self {
        match arg {
            AnimationArg::None => AnimationLevel::None,
            AnimationArg::Pinwheel => AnimationLevel::Pinwheel,
            AnimationArg::Full => AnimationLevel::Full,
        }
    }
}

/// Search folder names, file names and file contents below a local or FTP root.
#[derive(Parser, Debug)]
#[command(name = "fast_search", version)]
struct Cli {
    #[arg(required = true, value_name = "QUERY", help = "Text to search for (words are joined by spaces)")]
    query: Vec<String>,
    #[arg(
        short = 'r',
        long,
        value_name = "PATH",
        help = "Directory or ftp:// location to search (default: current directory)"
    )]
    root: Option<String>,
    #[arg(short = 'd', long, help = "Also search file contents")]
    deep: bool,
    #[arg(long, conflicts_with = "folders_only", help = "Report matching files only")]
    files_only: bool,
    #[arg(long, help = "Report matching folders only")]
    folders_only: bool,
    #[arg(long, conflicts_with = "hide_hidden", help = "Include hidden files and folders")]
    show_hidden: bool,
    #[arg(long, help = "Skip hidden files and folders")]
    hide_hidden: bool,
    #[arg(short = 'p', long, value_enum, help = "How result paths are shown")]
    path_mode: Option<PathModeArg>,
    #[arg(long, help = "Stop at the first match")]
    partial: bool,
    #[arg(short = 't', long, value_name = "N", help = "Threads used for local full searches")]
    threads: Option<usize>,
    #[arg(long, value_enum, help = "Progress animation while searching")]
    animation: Option<AnimationArg>,
    #[arg(long, help = "Do not clear the screen around the search")]
    no_clear: bool,
    #[arg(long, help = "Print results as JSON without progress output")]
    json: bool,
    #[arg(long, env = "FAST_SEARCH_FTP_USER", help = "FTP user (default: anonymous)")]
    user: Option<String>,
    #[arg(
        long,
        env = "FAST_SEARCH_FTP_PASSWORD",
        hide_env_values = true,
        help = "FTP password"
    )]
    password: Option<String>,
    #[arg(long, help = "Store the effective options as the new defaults")]
    save_options: bool,
    #[arg(short = 'v', long, action = ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,
}

impl Cli {
    fn normalized_query(&self) -> String {
        self.query.join(" ").to_lowercase()
    }

    // Command-line flags win over the persisted options.
    fn apply_to(&self, options: &mut SearchOptions) {
        if let Some(root) = &self.root {
            options.root = root.clone();
        }
        if self.deep {
            options.deep_search = true;
        }
        if self.files_only {
            options.result_kind = ResultKind::FilesOnly;
        } else if self.folders_only {
            options.result_kind = ResultKind::FoldersOnly;
        }
        if self.show_hidden {
            options.show_hidden = true;
        } else if self.hide_hidden {
            options.show_hidden = false;
        }
        if let Some(path_mode) = self.path_mode {
            options.path_mode = path_mode.into();
        }
        if self.partial {
            options.full_search = false;
        }
        if let Some(threads) = self.threads {
            options.thread_count = i64::try_from(threads).unwrap_or(i64::MAX);
        }
        if let Some(animation) = self.animation {
            options.animation = animation.into();
        }
        if self.no_clear {
            options.clear_screen = false;
        }
    }
}

fn log_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logging(verbosity: u8) {
    let term_level = log_level(verbosity);
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        term_level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    let log_file = path_utils::get_base_app_config_local_dir(APP_NAME)
        .map(|dir| dir.join(LOG_FILENAME))
        .and_then(|path| File::create(path).ok());
    if let Some(file) = log_file {
        loggers.push(WriteLogger::new(
            term_level.max(LevelFilter::Debug),
            Config::default(),
            file,
        ));
    }

    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("fast_search: could not initialise logging: {e}");
    }
}

fn run(cli: &Cli) -> u8 {
    let current_dir = match std::env::current_dir() {
        Ok(dir) => dir.to_string_lossy().into_owned(),
        Err(e) => {
            log::error!("Main: Could not determine the current directory: {e}");
            return EXIT_UNKNOWN_ERROR;
        }
    };

    let options_manager = CoreOptionsManager::new();
    let mut options = options_manager
        .load_options(APP_NAME, &current_dir)
        .unwrap_or_else(|e| {
            log::warn!("Main: Could not load options ({e}); using defaults");
            SearchOptions::defaults(&current_dir)
        });
    cli.apply_to(&mut options);

    if cli.save_options {
        if let Err(e) = options_manager.save_options(APP_NAME, &options) {
            log::error!("Main: Could not save options: {e}");
        }
    }

    let failure_code = if cli.json {
        EXIT_RESULTS_BAD
    } else {
        EXIT_UNKNOWN_ERROR
    };
    let remote = match connect_remote_root(&options.root, cli.user.as_deref(), cli.password.as_deref()) {
        None => None,
        Some(Ok(remote_root)) => {
            options.root = remote_root.display_root;
            Some(remote_root.handle)
        }
        Some(Err(e)) => {
            log::error!("Main: Could not connect to {:?}: {e}", options.root);
            eprintln!("fast_search: {e}");
            return failure_code;
        }
    };

    let query = cli.normalized_query();
    let config = options.to_search_config(remote);

    if cli.json {
        let run = match run_quick_search(config.clone(), &query) {
            Ok(run) => run,
            Err(e) => {
                log::error!("Main: Search could not start: {e}");
                return EXIT_RESULTS_BAD;
            }
        };
        return match format_json(&query, &config, &run.results, run.elapsed) {
            Ok(json) => {
                println!("{json}");
                EXIT_RESULTS
            }
            Err(e) => {
                log::error!("Main: Could not serialize results: {e}");
                EXIT_RESULTS_BAD
            }
        };
    }

    let (run, _) = match run_search(config.clone(), &query, io::stdout()) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Main: Search could not start: {e}");
            return EXIT_UNKNOWN_ERROR;
        }
    };
    if let Some(reason) = &run.results.connection_lost {
        log::warn!("Main: Remote search incomplete: {reason}");
    }
    print!("{}", format_report(&query, &config, &run.results, run.elapsed));
    EXIT_CLEAN
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    ExitCode::from(run(&cli))
}
