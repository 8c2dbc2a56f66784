/*
 * Per-directory filtering and matching. For every `TraversalGroup` the engine prunes hidden
 * folders (when hidden entries are excluded), records folder and file names containing the
 * query, optionally scans file contents, and tells the caller whether a partial search has found
 * its one result and should stop.
 *
 * Order of evaluation within a group is fixed: folders before files, and for each file the name
 * before the contents. A partial search therefore returns the first match in that order.
 */
use crate::core::content_scanner::ContentScanner;
use crate::core::directory_source::DirectorySource;
use crate::core::models::{ContentMatch, PathMode, ResultKind, SearchConfig, TraversalGroup};
use crate::core::path_utils;
use crate::core::search_progress::ResultAccumulator;
use std::path::Path;

// File extensions whose contents are never scanned (archives, binaries, media, design files).
const CONTENT_EXCLUDED_EXTENSIONS: &[&str] = &[
    "zip", "tar", "bz", "bz2", "gz", "tgz", "xz", "7z", "rar", "hqx", // archives
    "exe", "app", "dll", "so", "dylib", "bin", "msi", // executables
    "jpg", "jpeg", "bmp", "png", "gif", "ico", "tif", "tiff", // images
    "mov", "mpeg", "mpg", "wmv", "avi", "dv", "mp3", "mp4", "wav", "flac", // audio/video
    "psd", "ai", // design
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Continue,
    Stop,
}

/// Dotfiles, `~` backups and temp files.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
        || name.starts_with('~')
        || name.ends_with('~')
        || name.ends_with(".tmp")
        || name.ends_with(".temp")
}

pub fn is_content_excluded(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => {
            let extension = extension.to_ascii_lowercase();
            CONTENT_EXCLUDED_EXTENSIONS.contains(&extension.as_str())
        }
        _ => false,
    }
}

/*
 * Renders match locations per `PathMode`. Remote matches are always rendered absolute, since a
 * path relative to a remote root means nothing on the local machine. A relative match directly
 * in the root renders as `./name`.
 */
#[derive(Debug, Clone)]
pub struct PathRenderer {
    mode: PathMode,
    root: String,
}

impl PathRenderer {
    pub fn new(mode: PathMode, root: &str, remote: bool) -> Self {
        PathRenderer {
            mode: if remote { PathMode::Absolute } else { mode },
            root: root.to_string(),
        }
    }

    pub fn render(&self, source: &dyn DirectorySource, directory: &str, name: &str) -> String {
        match self.mode {
            PathMode::Absolute => source.join(directory, name),
            PathMode::NameOnly => name.to_string(),
            PathMode::Relative => {
                match path_utils::relative_to(Path::new(directory), Path::new(&self.root)) {
                    Some(relative) if relative.is_empty() => source.join(".", name),
                    Some(relative) => source.join(&relative, name),
                    None => source.join(directory, name),
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchEngine {
    result_kind: ResultKind,
    show_hidden: bool,
    deep_search: bool,
    full_search: bool,
    needle: String,
    scanner: ContentScanner,
    renderer: PathRenderer,
}

impl MatchEngine {
    /*
     * Builds the engine for one search. `search_root` is the location the walk starts from, in
     * the backend's own path form; relative rendering is computed against it.
     */
    pub fn new(config: &SearchConfig, query: &str, search_root: &str) -> Self {
        MatchEngine {
            result_kind: config.result_kind,
            show_hidden: config.show_hidden,
            deep_search: config.deep_search,
            full_search: config.full_search,
            needle: query.to_lowercase(),
            scanner: ContentScanner::new(query),
            renderer: PathRenderer::new(config.path_mode, search_root, config.is_remote()),
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        name.to_lowercase().contains(&self.needle)
    }

    fn excludes(&self, name: &str) -> bool {
        !self.show_hidden && is_hidden(name)
    }

    fn stop_after_match(&self) -> bool {
        !self.full_search
    }

    /*
     * Evaluates one group. Hidden folders are removed from `group.subdirectories` so the walk
     * never descends into them. Returns `Stop` as soon as a partial search records a match.
     */
    pub fn scan(
        &self,
        group: &mut TraversalGroup,
        source: &mut dyn DirectorySource,
        accumulator: &mut ResultAccumulator,
    ) -> ScanOutcome {
        if self.result_kind.includes_folders() {
            let mut index = 0;
            while index < group.subdirectories.len() {
                let name = &group.subdirectories[index];
                if self.excludes(name) {
                    log::trace!("MatchEngine: Pruning hidden folder {name:?}");
                    group.subdirectories.remove(index);
                    continue;
                }
                if self.matches_name(name) {
                    accumulator.push_folder(self.renderer.render(&*source, &group.directory, name));
                    if self.stop_after_match() {
                        return ScanOutcome::Stop;
                    }
                }
                index += 1;
            }
        }

        if self.result_kind.includes_files() {
            for name in &group.files {
                if self.excludes(name) {
                    continue;
                }

                if self.matches_name(name) {
                    accumulator.push_file(self.renderer.render(&*source, &group.directory, name));
                    if self.stop_after_match() {
                        return ScanOutcome::Stop;
                    }
                }

                if self.deep_search && !is_content_excluded(name) {
                    let lines = self.scan_contents(source, &group.directory, name);
                    if !lines.is_empty() {
                        accumulator.push_content(ContentMatch {
                            path: self.renderer.render(&*source, &group.directory, name),
                            lines,
                        });
                        if self.stop_after_match() {
                            return ScanOutcome::Stop;
                        }
                    }
                }
            }
        }

        ScanOutcome::Continue
    }

    fn scan_contents(
        &self,
        source: &mut dyn DirectorySource,
        directory: &str,
        name: &str,
    ) -> Vec<usize> {
        let path = source.join(directory, name);
        match source.open_file(&path) {
            Ok(reader) => self.scanner.scan_or_empty(reader, &path),
            Err(e) => {
                log::debug!("MatchEngine: Could not open {path:?} for content scan: {e}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::directory_source::LocalDirectorySource;
    use crate::core::models::SearchResults;
    use crate::core::search_progress::SearchProgress;
    use std::fs;
    use std::io;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn run_scan(
        config: &SearchConfig,
        query: &str,
        group: &mut TraversalGroup,
    ) -> (ScanOutcome, SearchResults) {
        let engine = MatchEngine::new(config, query, &config.root);
        let mut source = LocalDirectorySource::new();
        let mut accumulator = ResultAccumulator::new(Arc::new(SearchProgress::new()));
        let outcome = engine.scan(group, &mut source, &mut accumulator);
        (outcome, accumulator.into_results())
    }

    fn group(directory: &str, subdirectories: &[&str], files: &[&str]) -> TraversalGroup {
        TraversalGroup {
            directory: directory.to_string(),
            subdirectories: subdirectories.iter().map(|s| s.to_string()).collect(),
            files: files.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn joined(parts: &[&str]) -> String {
        let mut path = std::path::PathBuf::from(parts[0]);
        for part in &parts[1..] {
            path.push(part);
        }
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_is_hidden_predicate() {
        for hidden in [".git", "~lock", "backup~", "scratch.tmp", "draft.temp"] {
            assert!(is_hidden(hidden), "{hidden} should be hidden");
        }
        for visible in ["src", "notes.txt", "temp", "tmp.rs", "a~b"] {
            assert!(!is_hidden(visible), "{visible} should be visible");
        }
    }

    #[test]
    fn test_is_content_excluded_by_extension() {
        assert!(is_content_excluded("photo.JPG"));
        assert!(is_content_excluded("archive.tar"));
        assert!(is_content_excluded("setup.exe"));
        assert!(!is_content_excluded("notes.txt"));
        assert!(!is_content_excluded("Makefile"));
        assert!(!is_content_excluded(".png"));
    }

    #[test]
    fn test_name_match_is_case_insensitive() {
        let config = SearchConfig::new("/data");
        let mut g = group("/data", &[], &["foobar.txt", "FOOBAR.TXT", "other.txt"]);

        let (_, results) = run_scan(&config, "Foo", &mut g);

        assert_eq!(
            results.file_matches,
            vec![joined(&["/data", "foobar.txt"]), joined(&["/data", "FOOBAR.TXT"])]
        );
    }

    #[test]
    fn test_hidden_folders_are_pruned_and_hidden_files_skipped() {
        let mut config = SearchConfig::new("/data");
        config.show_hidden = false;
        let mut g = group(
            "/data",
            &[".cache", "cache", "cache~"],
            &[".cache.db", "cache.db"],
        );

        let (outcome, results) = run_scan(&config, "cache", &mut g);

        assert_eq!(outcome, ScanOutcome::Continue);
        assert_eq!(g.subdirectories, vec!["cache"]);
        assert_eq!(results.folder_matches, vec![joined(&["/data", "cache"])]);
        assert_eq!(results.file_matches, vec![joined(&["/data", "cache.db"])]);
    }

    #[test]
    fn test_hidden_entries_kept_when_shown() {
        let config = SearchConfig::new("/data");
        let mut g = group("/data", &[".cache"], &[".cache.db"]);

        let (_, results) = run_scan(&config, "cache", &mut g);

        assert_eq!(g.subdirectories, vec![".cache"]);
        assert_eq!(results.total(), 2);
    }

    #[test]
    fn test_result_kind_limits_categories() {
        let mut config = SearchConfig::new("/data");
        config.result_kind = ResultKind::FoldersOnly;
        let mut g = group("/data", &["report"], &["report.txt"]);
        let (_, results) = run_scan(&config, "report", &mut g);
        assert_eq!(results.folder_matches.len(), 1);
        assert!(results.file_matches.is_empty());

        config.result_kind = ResultKind::FilesOnly;
        let mut g = group("/data", &["report"], &["report.txt"]);
        let (_, results) = run_scan(&config, "report", &mut g);
        assert!(results.folder_matches.is_empty());
        assert_eq!(results.file_matches.len(), 1);
    }

    #[test]
    fn test_partial_search_stops_at_first_folder() {
        let mut config = SearchConfig::new("/data");
        config.full_search = false;
        let mut g = group("/data", &["match_a", "match_b"], &["match.txt"]);

        let (outcome, results) = run_scan(&config, "match", &mut g);

        assert_eq!(outcome, ScanOutcome::Stop);
        assert_eq!(results.total(), 1);
        assert_eq!(results.folder_matches, vec![joined(&["/data", "match_a"])]);
    }

    #[test]
    fn test_path_renderer_modes() {
        let source = LocalDirectorySource::new();
        let root = joined(&["/a", "b"]);
        let directory = joined(&["/a", "b", "c"]);

        let absolute = PathRenderer::new(PathMode::Absolute, &root, false);
        let relative = PathRenderer::new(PathMode::Relative, &root, false);
        let name_only = PathRenderer::new(PathMode::NameOnly, &root, false);

        assert_eq!(
            absolute.render(&source, &directory, "d.txt"),
            joined(&["/a", "b", "c", "d.txt"])
        );
        assert_eq!(
            relative.render(&source, &directory, "d.txt"),
            joined(&["c", "d.txt"])
        );
        assert_eq!(
            relative.render(&source, &root, "top.txt"),
            joined(&[".", "top.txt"])
        );
        assert_eq!(name_only.render(&source, &directory, "d.txt"), "d.txt");
    }

    #[test]
    fn test_remote_rendering_is_always_absolute() {
        let renderer = PathRenderer::new(PathMode::NameOnly, "/pub", true);
        let source = LocalDirectorySource::new();
        assert_eq!(
            renderer.render(&source, "/pub/docs", "a.txt"),
            joined(&["/pub/docs", "a.txt"])
        );
    }

    #[test]
    fn test_deep_search_records_content_lines() -> io::Result<()> {
        // Arrange
        let dir = tempdir()?;
        let root = dir.path().to_string_lossy().into_owned();
        fs::write(dir.path().join("notes.txt"), "one\ntwo\nbanana split\n")?;
        fs::write(dir.path().join("image.png"), "banana")?;
        let mut config = SearchConfig::new(root.clone());
        config.deep_search = true;
        let mut g = group(&root, &[], &["image.png", "notes.txt"]);

        // Act
        let (_, results) = run_scan(&config, "banana", &mut g);

        // Assert
        assert!(results.file_matches.is_empty());
        assert_eq!(
            results.content_matches,
            vec![ContentMatch {
                path: dir.path().join("notes.txt").to_string_lossy().into_owned(),
                lines: vec![3],
            }]
        );
        Ok(())
    }

    #[test]
    fn test_partial_search_prefers_name_over_content() -> io::Result<()> {
        let dir = tempdir()?;
        let root = dir.path().to_string_lossy().into_owned();
        fs::write(dir.path().join("banana.txt"), "banana\n")?;
        let mut config = SearchConfig::new(root.clone());
        config.deep_search = true;
        config.full_search = false;
        let mut g = group(&root, &[], &["banana.txt"]);

        let (outcome, results) = run_scan(&config, "banana", &mut g);

        assert_eq!(outcome, ScanOutcome::Stop);
        assert_eq!(results.file_matches.len(), 1);
        assert!(results.content_matches.is_empty());
        Ok(())
    }
}
