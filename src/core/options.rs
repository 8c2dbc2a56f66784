/*
 * Persisted search options. The options live in `Options.ldf` inside the application's local
 * configuration directory: one value per line in a fixed order, each followed by a `#` comment
 * describing it. Loading is forgiving: unknown or out-of-range values fall back to defaults,
 * and the file is rewritten after every load so it always holds a complete, valid set.
 *
 * `OptionsManagerOperations` abstracts the storage so callers and tests can supply their own
 * location. `CoreOptionsManager` is the file-backed implementation.
 */
use crate::core::models::{AnimationLevel, PathMode, RemoteHandle, ResultKind, SearchConfig};
use crate::core::path_utils;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "FastSearch";
pub const OPTIONS_FILENAME: &str = "Options.ldf";

const TRUE_TEXT: &str = "True";
const FALSE_TEXT: &str = "False";
const DEFAULT_THREAD_COUNT: i64 = 2;

const LINE_COMMENTS: [&str; 11] = [
    "Deep Search",
    "Show Files (0), Folders (1), or Both (2)",
    "Show Hidden Files and Folders",
    "Show Full (0), Relative (1), or No Path (2)",
    "Full Search",
    "Root Directory",
    "Clear Screen Before Displaying Search Results",
    "Write Recent Searches to File",
    "Number of Threads Used",
    "To display search animations",
    "Text coloring",
];

#[derive(Debug)]
pub enum OptionsError {
    Io(io::Error),
    NoConfigDirectory,
    Utf8Error(std::string::FromUtf8Error),
}

impl From<io::Error> for OptionsError {
    fn from(err: io::Error) -> Self {
        OptionsError::Io(err)
    }
}

impl From<std::string::FromUtf8Error> for OptionsError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        OptionsError::Utf8Error(err)
    }
}

impl std::fmt::Display for OptionsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionsError::Io(e) => write!(f, "Options I/O error: {e}"),
            OptionsError::NoConfigDirectory => {
                write!(f, "Could not determine configuration directory for options")
            }
            OptionsError::Utf8Error(e) => write!(f, "Options file UTF-8 error: {e}"),
        }
    }
}

impl std::error::Error for OptionsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OptionsError::Io(e) => Some(e),
            OptionsError::Utf8Error(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OptionsError>;

/*
 * The persisted options. `save_history` and `color` are carried so that a round trip through
 * the file preserves them; the search itself does not use them.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub deep_search: bool,
    pub result_kind: ResultKind,
    pub show_hidden: bool,
    pub path_mode: PathMode,
    pub full_search: bool,
    pub root: String,
    pub clear_screen: bool,
    pub save_history: bool,
    pub thread_count: i64,
    pub animation: AnimationLevel,
    pub color: bool,
}

impl SearchOptions {
    pub fn defaults(root: &str) -> Self {
        SearchOptions {
            deep_search: false,
            result_kind: ResultKind::Both,
            show_hidden: true,
            path_mode: PathMode::Absolute,
            full_search: true,
            root: root.to_string(),
            clear_screen: true,
            save_history: true,
            thread_count: DEFAULT_THREAD_COUNT,
            animation: AnimationLevel::Full,
            color: cfg!(unix),
        }
    }

    /*
     * Parses the file contents. Never fails: each line's value is the text before its `#`,
     * booleans are true only for the exact text `True`, and unparsable or out-of-range numbers
     * take their default. The stored root is ignored in favour of `root`.
     */
    pub fn parse(text: &str, root: &str) -> Self {
        let mut values = text.lines().map(|line| line.split('#').next().unwrap_or(""));
        let mut next_value = || values.next().unwrap_or("");

        let deep_search = parse_bool(next_value());
        let result_kind = parse_int(next_value())
            .and_then(ResultKind::from_option_value)
            .unwrap_or(ResultKind::Both);
        let show_hidden = parse_bool(next_value());
        let path_mode = parse_int(next_value())
            .and_then(PathMode::from_option_value)
            .unwrap_or(PathMode::Absolute);
        let full_search = parse_bool(next_value());
        let _stored_root = next_value();
        let clear_screen = parse_bool(next_value());
        let save_history = parse_bool(next_value());
        let thread_count = parse_int(next_value()).unwrap_or(DEFAULT_THREAD_COUNT);
        let animation = parse_int(next_value())
            .and_then(AnimationLevel::from_option_value)
            .unwrap_or(AnimationLevel::Full);
        let color = parse_bool(next_value());

        SearchOptions {
            deep_search,
            result_kind,
            show_hidden,
            path_mode,
            full_search,
            root: root.to_string(),
            clear_screen,
            save_history,
            thread_count,
            animation,
            color,
        }
    }

    pub fn to_file_contents(&self) -> String {
        let values = [
            bool_text(self.deep_search).to_string(),
            self.result_kind.option_value().to_string(),
            bool_text(self.show_hidden).to_string(),
            self.path_mode.option_value().to_string(),
            bool_text(self.full_search).to_string(),
            self.root.clone(),
            bool_text(self.clear_screen).to_string(),
            bool_text(self.save_history).to_string(),
            self.thread_count.to_string(),
            self.animation.option_value().to_string(),
            bool_text(self.color).to_string(),
        ];
        values
            .iter()
            .zip(LINE_COMMENTS)
            .map(|(value, comment)| format!("{value}# {comment}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    // The configuration for one search with these options. Thread counts below 1 mean 1.
    pub fn to_search_config(&self, remote: Option<RemoteHandle>) -> SearchConfig {
        SearchConfig {
            deep_search: self.deep_search,
            result_kind: self.result_kind,
            show_hidden: self.show_hidden,
            path_mode: self.path_mode,
            full_search: self.full_search,
            root: self.root.clone(),
            remote,
            thread_count: usize::try_from(self.thread_count.max(1)).unwrap_or(1),
            animation: self.animation,
            clear_screen: self.clear_screen,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    value == TRUE_TEXT
}

fn parse_int(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

fn bool_text(value: bool) -> &'static str {
    if value { TRUE_TEXT } else { FALSE_TEXT }
}

pub trait OptionsManagerOperations: Send + Sync {
    /*
     * Loads the options for `app_name`, using `root` as the search root. A missing or unreadable
     * options file yields the defaults. Either way the file is rewritten with the result.
     */
    fn load_options(&self, app_name: &str, root: &str) -> Result<SearchOptions>;
    fn save_options(&self, app_name: &str, options: &SearchOptions) -> Result<()>;
}

pub struct CoreOptionsManager {
    config_dir: Option<PathBuf>,
}

impl CoreOptionsManager {
    pub fn new() -> Self {
        CoreOptionsManager { config_dir: None }
    }

    // Stores the options file in `config_dir` instead of the per-user configuration directory.
    #[cfg(test)]
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        CoreOptionsManager {
            config_dir: Some(config_dir),
        }
    }

    fn options_file_path(&self, app_name: &str) -> Result<PathBuf> {
        let config_dir = match &self.config_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                dir.clone()
            }
            None => path_utils::get_base_app_config_local_dir(app_name)
                .ok_or(OptionsError::NoConfigDirectory)?,
        };
        Ok(config_dir.join(OPTIONS_FILENAME))
    }

    fn read_options_text(file_path: &Path) -> Result<String> {
        let bytes = fs::read(file_path)?;
        Ok(String::from_utf8(bytes)?)
    }
}

impl Default for CoreOptionsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsManagerOperations for CoreOptionsManager {
    fn load_options(&self, app_name: &str, root: &str) -> Result<SearchOptions> {
        log::trace!("CoreOptionsManager: Loading options for app '{app_name}'");
        let file_path = self.options_file_path(app_name)?;

        let options = if !file_path.exists() {
            log::debug!("CoreOptionsManager: Options file {file_path:?} does not exist; using defaults.");
            SearchOptions::defaults(root)
        } else {
            match Self::read_options_text(&file_path) {
                Ok(text) => SearchOptions::parse(&text, root),
                Err(e) => {
                    log::warn!(
                        "CoreOptionsManager: Could not read options file {file_path:?}: {e}. Using defaults."
                    );
                    SearchOptions::defaults(root)
                }
            }
        };

        self.save_options(app_name, &options)?;
        Ok(options)
    }

    fn save_options(&self, app_name: &str, options: &SearchOptions) -> Result<()> {
        let file_path = self.options_file_path(app_name)?;
        let mut file = fs::File::create(&file_path)?;
        file.write_all(options.to_file_contents().as_bytes())?;
        log::debug!("CoreOptionsManager: Saved options to {file_path:?}.");
        Ok(())
    }
}
