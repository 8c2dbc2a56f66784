/*
 * Plain data carried through one search: the per-search configuration, the groups the
 * traversal hands to the match engine, and the accumulated results handed back to the caller.
 * Nothing here performs I/O; the behavior lives in the traversal, engine and coordinator modules.
 */
use crate::core::remote::RemoteSession;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

/*
 * Shared handle to an established remote session. The coordinator locks it for the duration of
 * a remote walk; the caller keeps its own clone so a second search can reuse the connection.
 */
pub type RemoteHandle = Arc<Mutex<dyn RemoteSession + Send>>;

// Which kinds of entries are reported. The numeric values are the persisted option values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultKind {
    FilesOnly,
    FoldersOnly,
    #[default]
    Both,
}

impl ResultKind {
    pub fn from_option_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(ResultKind::FilesOnly),
            1 => Some(ResultKind::FoldersOnly),
            2 => Some(ResultKind::Both),
            _ => None,
        }
    }

    pub fn option_value(self) -> u8 {
        match self {
            ResultKind::FilesOnly => 0,
            ResultKind::FoldersOnly => 1,
            ResultKind::Both => 2,
        }
    }

    pub fn includes_folders(self) -> bool {
        matches!(self, ResultKind::FoldersOnly | ResultKind::Both)
    }

    pub fn includes_files(self) -> bool {
        matches!(self, ResultKind::FilesOnly | ResultKind::Both)
    }
}

// How a match location is rendered in the results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathMode {
    #[default]
    Absolute,
    Relative,
    NameOnly,
}

impl PathMode {
    pub fn from_option_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(PathMode::Absolute),
            1 => Some(PathMode::Relative),
            2 => Some(PathMode::NameOnly),
            _ => None,
        }
    }

    pub fn option_value(self) -> u8 {
        match self {
            PathMode::Absolute => 0,
            PathMode::Relative => 1,
            PathMode::NameOnly => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationLevel {
    None,
    Pinwheel,
    #[default]
    Full,
}

impl AnimationLevel {
    pub fn from_option_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(AnimationLevel::None),
            1 => Some(AnimationLevel::Pinwheel),
            2 => Some(AnimationLevel::Full),
            _ => None,
        }
    }

    pub fn option_value(self) -> u8 {
        match self {
            AnimationLevel::None => 0,
            AnimationLevel::Pinwheel => 1,
            AnimationLevel::Full => 2,
        }
    }
}

/*
 * The configuration of a single search. It is built once per invocation (usually from the
 * persisted `SearchOptions`) and never changes while the search runs. The presence of `remote`
 * selects the remote backend; `root` is then the display form of the remote location.
 */
#[derive(Clone)]
pub struct SearchConfig {
    pub deep_search: bool,
    pub result_kind: ResultKind,
    pub show_hidden: bool,
    pub path_mode: PathMode,
    pub full_search: bool,
    pub root: String,
    pub remote: Option<RemoteHandle>,
    pub thread_count: usize,
    pub animation: AnimationLevel,
    pub clear_screen: bool,
}

impl SearchConfig {
    /// A local search rooted at `root` with the default option values.
    #[cfg(test)]
    pub fn new(root: impl Into<String>) -> Self {
        SearchConfig {
            deep_search: false,
            result_kind: ResultKind::default(),
            show_hidden: true,
            path_mode: PathMode::default(),
            full_search: true,
            root: root.into(),
            remote: None,
            thread_count: 1,
            animation: AnimationLevel::default(),
            clear_screen: false,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }
}

impl fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfig")
            .field("deep_search", &self.deep_search)
            .field("result_kind", &self.result_kind)
            .field("show_hidden", &self.show_hidden)
            .field("path_mode", &self.path_mode)
            .field("full_search", &self.full_search)
            .field("root", &self.root)
            .field("remote", &self.remote.as_ref().map(|_| "<remote session>"))
            .field("thread_count", &self.thread_count)
            .field("animation", &self.animation)
            .field("clear_screen", &self.clear_screen)
            .finish()
    }
}

/*
 * One visited directory as produced by the traversal. The consumer may remove names from
 * `subdirectories` before the walk continues, which prevents descent into them.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalGroup {
    pub directory: String,
    pub subdirectories: Vec<String>,
    pub files: Vec<String>,
}

// A file whose contents contain the query, with the 1-based numbers of the matching lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMatch {
    pub path: String,
    pub lines: Vec<usize>,
}

/*
 * The accumulated results of one search. The three sequences only ever grow while the search
 * runs and keep traversal order. `connection_lost` records why a remote walk ended early, so
 * callers can tell an incomplete remote result from a complete one.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub folder_matches: Vec<String>,
    pub file_matches: Vec<String>,
    pub content_matches: Vec<ContentMatch>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub connection_lost: Option<String>,
}

impl SearchResults {
    pub fn total(&self) -> usize {
        self.folder_matches.len() + self.file_matches.len() + self.content_matches.len()
    }

    /// Appends `other` after the entries already present, sequence by sequence.
    pub fn append(&mut self, other: SearchResults) {
        self.folder_matches.extend(other.folder_matches);
        self.file_matches.extend(other.file_matches);
        self.content_matches.extend(other.content_matches);
        if self.connection_lost.is_none() {
            self.connection_lost = other.connection_lost;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_kind_option_values_round_trip() {
        for value in 0..=2 {
            let kind = ResultKind::from_option_value(value).unwrap();
            assert_eq!(kind.option_value() as i64, value);
        }
        assert_eq!(ResultKind::from_option_value(3), None);
        assert_eq!(ResultKind::from_option_value(-1), None);
    }

    #[test]
    fn test_result_kind_selects_categories() {
        assert!(ResultKind::FilesOnly.includes_files());
        assert!(!ResultKind::FilesOnly.includes_folders());
        assert!(ResultKind::FoldersOnly.includes_folders());
        assert!(!ResultKind::FoldersOnly.includes_files());
        assert!(ResultKind::Both.includes_files() && ResultKind::Both.includes_folders());
    }

    #[test]
    fn test_option_enums_default_to_broadest_setting() {
        assert_eq!(ResultKind::default(), ResultKind::Both);
        assert_eq!(PathMode::default(), PathMode::Absolute);
        assert_eq!(AnimationLevel::default(), AnimationLevel::Full);
    }

    #[test]
    fn test_search_results_append_preserves_order() {
        let mut first = SearchResults {
            folder_matches: vec!["/a".into()],
            file_matches: vec!["/a/x.txt".into()],
            ..Default::default()
        };
        let second = SearchResults {
            folder_matches: vec!["/b".into()],
            content_matches: vec![ContentMatch {
                path: "/b/y.txt".into(),
                lines: vec![2, 5],
            }],
            ..Default::default()
        };

        first.append(second);

        assert_eq!(first.folder_matches, vec!["/a", "/b"]);
        assert_eq!(first.file_matches, vec!["/a/x.txt"]);
        assert_eq!(first.content_matches.len(), 1);
        assert_eq!(first.total(), 4);
    }

    #[test]
    fn test_search_config_debug_hides_remote_session() {
        let config = SearchConfig::new("/tmp");
        let rendered = format!("{config:?}");
        assert!(rendered.contains("root: \"/tmp\""));
        assert!(rendered.contains("remote: None"));
    }
}
