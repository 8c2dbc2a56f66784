/*
 * Runs one search on a background thread. The coordinator selects the backend from the
 * configuration, walks it with a `MatchEngine`, and publishes progress through a shared
 * `SearchProgress` that callers (typically the progress observer) read through a `ProgressReader`
 * while the worker runs.
 *
 * Local full searches with more than one thread split the work below the root into contiguous
 * chunks of top-level subdirectories. Concatenating the chunk results in chunk order yields the
 * same order a sequential walk produces.
 */
use crate::core::directory_source::{DirectorySource, LocalDirectorySource};
use crate::core::match_engine::{MatchEngine, ScanOutcome};
use crate::core::models::{RemoteHandle, SearchConfig, SearchResults, TraversalGroup};
use crate::core::path_utils;
use crate::core::remote::RemoteDirectorySource;
use crate::core::search_progress::{
    ProgressReader, ProgressSnapshot, ResultAccumulator, SearchProgress,
};
use crate::core::traversal::{self, WalkEnd};
use std::io;
use std::ops::ControlFlow;
use std::sync::{Arc, PoisonError};
use std::thread::{self, JoinHandle};

const WORKER_THREAD_NAME: &str = "search-coordinator";

pub struct SearchCoordinator {
    reader: ProgressReader,
    worker: Option<JoinHandle<SearchResults>>,
    results: Option<SearchResults>,
}

impl SearchCoordinator {
    /*
     * Spawns the worker and returns immediately. The query is expected in its normalized
     * (lowercase) form; matching is case-insensitive either way.
     */
    pub fn start(config: SearchConfig, query: &str) -> io::Result<Self> {
        log::debug!(
            "SearchCoordinator: Starting search for '{query}' in {:?} (deep: {}, full: {}, threads: {})",
            config.root,
            config.deep_search,
            config.full_search,
            config.thread_count
        );
        let progress = Arc::new(SearchProgress::new());

        let worker_config = config.clone();
        let worker_query = query.to_string();
        let worker_progress = Arc::clone(&progress);
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(&worker_config, &worker_query, worker_progress))?;

        Ok(SearchCoordinator {
            reader: ProgressReader::new(progress, query, config),
            worker: Some(worker),
            results: None,
        })
    }

    pub fn peek(&self) -> ProgressSnapshot {
        self.reader.snapshot()
    }

    // A snapshot source for another thread, such as the progress observer.
    pub fn progress_reader(&self) -> ProgressReader {
        self.reader.clone()
    }

    // Blocks until the worker is done. Calling it again is a no-op.
    pub fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            let results = worker.join().unwrap_or_else(|_| {
                log::error!("SearchCoordinator: Search worker panicked; reporting no results");
                SearchResults::default()
            });
            log::debug!(
                "SearchCoordinator: Search for '{}' finished with {} result(s)",
                self.peek().query,
                results.total()
            );
            self.results = Some(results);
        }
    }

    pub fn finish(mut self) -> SearchResults {
        self.join();
        self.results.take().unwrap_or_default()
    }
}

fn run_worker(config: &SearchConfig, query: &str, progress: Arc<SearchProgress>) -> SearchResults {
    match &config.remote {
        Some(handle) => search_remote(handle, config, query, progress),
        None => search_local(config, query, progress),
    }
}

/*
 * Walks `root` and feeds every group to the engine, keeping the shared cursor on the directory
 * being evaluated.
 */
fn walk_with_engine(
    source: &mut dyn DirectorySource,
    root: &str,
    engine: &MatchEngine,
    progress: &SearchProgress,
    accumulator: &mut ResultAccumulator,
) -> WalkEnd {
    traversal::walk(source, root, |source, group| {
        progress.set_current_directory(&group.directory);
        match engine.scan(group, source, accumulator) {
            ScanOutcome::Continue => ControlFlow::Continue(()),
            ScanOutcome::Stop => ControlFlow::Break(()),
        }
    })
}

fn search_local(config: &SearchConfig, query: &str, progress: Arc<SearchProgress>) -> SearchResults {
    let root = path_utils::absolute_root(&config.root);
    let engine = MatchEngine::new(config, query, &root);

    if config.full_search && config.thread_count > 1 {
        return search_local_sharded(&root, &engine, progress, config.thread_count);
    }

    let mut source = LocalDirectorySource::new();
    let mut accumulator = ResultAccumulator::new(Arc::clone(&progress));
    let end = walk_with_engine(&mut source, &root, &engine, &progress, &mut accumulator);
    log::trace!("SearchCoordinator: Local walk of {root:?} ended: {end:?}");
    accumulator.into_results()
}

fn search_local_sharded(
    root: &str,
    engine: &MatchEngine,
    progress: Arc<SearchProgress>,
    thread_count: usize,
) -> SearchResults {
    let mut source = LocalDirectorySource::new();
    let mut root_accumulator = ResultAccumulator::new(Arc::clone(&progress));

    let listing = match source.list(root) {
        Ok(listing) => listing,
        Err(e) => {
            log::debug!("SearchCoordinator: Skipping {root:?}: {e}");
            return root_accumulator.into_results();
        }
    };
    let mut group = TraversalGroup {
        directory: root.to_string(),
        subdirectories: listing.subdirectories,
        files: listing.files,
    };
    progress.set_current_directory(root);
    // Full search only, so the root group never stops the walk.
    engine.scan(&mut group, &mut source, &mut root_accumulator);

    let children: Vec<String> = group
        .subdirectories
        .iter()
        .filter(|name| source.can_descend(root, name))
        .map(|name| source.join(root, name))
        .collect();
    if children.is_empty() {
        return root_accumulator.into_results();
    }

    let chunk_size = children.len().div_ceil(thread_count);
    log::debug!(
        "SearchCoordinator: Splitting {} subdirectories of {root:?} into chunks of {chunk_size}",
        children.len()
    );

    let chunk_results: Vec<SearchResults> = thread::scope(|scope| {
        let handles: Vec<_> = children
            .chunks(chunk_size)
            .map(|chunk| {
                let progress = Arc::clone(&progress);
                scope.spawn(move || {
                    let mut source = LocalDirectorySource::new();
                    let mut accumulator = ResultAccumulator::new(Arc::clone(&progress));
                    for child in chunk {
                        walk_with_engine(&mut source, child, engine, &progress, &mut accumulator);
                    }
                    accumulator.into_results()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    log::error!("SearchCoordinator: Search shard panicked; its results are lost");
                    SearchResults::default()
                })
            })
            .collect()
    });

    let mut results = root_accumulator.into_results();
    for chunk in chunk_results {
        results.append(chunk);
    }
    results
}

/*
 * Walks the remote session from its current working directory. The session stays locked for
 * the whole walk. Afterwards it is returned to the root's directory so the next search on the
 * same connection starts from the same place, unless the connection was lost.
 */
fn search_remote(
    handle: &RemoteHandle,
    config: &SearchConfig,
    query: &str,
    progress: Arc<SearchProgress>,
) -> SearchResults {
    let mut session = handle.lock().unwrap_or_else(PoisonError::into_inner);
    let mut accumulator = ResultAccumulator::new(Arc::clone(&progress));

    let end = {
        let mut source = RemoteDirectorySource::new(&mut *session);
        match source.current_location() {
            Ok(start) => {
                let engine = MatchEngine::new(config, query, &start);
                walk_with_engine(&mut source, &start, &engine, &progress, &mut accumulator)
            }
            Err(e) if e.is_disconnect() => WalkEnd::Disconnected(e.to_string()),
            Err(e) => {
                log::warn!("SearchCoordinator: Could not determine remote start directory: {e}");
                WalkEnd::Exhausted
            }
        }
    };

    let mut results = accumulator.into_results();
    match end {
        WalkEnd::Disconnected(msg) => {
            log::warn!("SearchCoordinator: Remote search ended early: {msg}");
            results.connection_lost = Some(msg);
        }
        WalkEnd::Exhausted | WalkEnd::Stopped => {
            let reset_path = path_utils::remote_reset_path(&config.root);
            if let Err(e) = session.change_dir(reset_path) {
                log::warn!("SearchCoordinator: Could not return remote session to {reset_path:?}: {e}");
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{ContentMatch, PathMode};
    use crate::core::remote::tests::{MockRemoteSession, dir_line, file_line};
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn path_str(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    /*
     * root/
     *   notes.txt        ("banana split" on line 3)
     *   .secret          ("banana")
     *   bananaville/
     *     bananas.md
     *   plain/
     *     fruit.txt      ("Banana" on line 1)
     *   .hidden_banana/
     *     banana.txt
     */
    fn setup_fruit_tree(base: &Path) -> io::Result<()> {
        fs::write(base.join("notes.txt"), "apples\npears\nbanana split\n")?;
        fs::write(base.join(".secret"), "banana\n")?;
        fs::create_dir(base.join("bananaville"))?;
        fs::write(base.join("bananaville").join("bananas.md"), "yellow\n")?;
        fs::create_dir(base.join("plain"))?;
        fs::write(base.join("plain").join("fruit.txt"), "Banana\nkiwi\n")?;
        fs::create_dir(base.join(".hidden_banana"))?;
        fs::write(base.join(".hidden_banana").join("banana.txt"), "")?;
        Ok(())
    }

    #[test]
    fn test_local_deep_search_end_to_end() -> io::Result<()> {
        // Arrange
        let dir = tempdir()?;
        setup_fruit_tree(dir.path())?;
        let mut config = SearchConfig::new(path_str(dir.path()));
        config.deep_search = true;
        config.show_hidden = false;

        // Act
        let coordinator = SearchCoordinator::start(config, "banana")?;
        let results = coordinator.finish();

        // Assert
        assert_eq!(
            results.folder_matches,
            vec![path_str(&dir.path().join("bananaville"))]
        );
        assert_eq!(
            results.file_matches,
            vec![path_str(&dir.path().join("bananaville").join("bananas.md"))]
        );
        assert_eq!(
            results.content_matches,
            vec![
                ContentMatch {
                    path: path_str(&dir.path().join("notes.txt")),
                    lines: vec![3],
                },
                ContentMatch {
                    path: path_str(&dir.path().join("plain").join("fruit.txt")),
                    lines: vec![1],
                },
            ]
        );
        assert_eq!(results.connection_lost, None);
        Ok(())
    }

    #[test]
    fn test_hidden_entries_reported_when_shown() -> io::Result<()> {
        let dir = tempdir()?;
        setup_fruit_tree(dir.path())?;
        let mut config = SearchConfig::new(path_str(dir.path()));
        config.path_mode = PathMode::NameOnly;

        let results = SearchCoordinator::start(config, "banana")?.finish();

        assert!(results.folder_matches.contains(&".hidden_banana".to_string()));
        assert!(results.file_matches.contains(&"banana.txt".to_string()));
        Ok(())
    }

    #[test]
    fn test_partial_search_returns_exactly_one_result() -> io::Result<()> {
        let dir = tempdir()?;
        setup_fruit_tree(dir.path())?;
        let mut config = SearchConfig::new(path_str(dir.path()));
        config.full_search = false;
        config.deep_search = true;
        config.show_hidden = false;
        config.thread_count = 4;

        let results = SearchCoordinator::start(config, "banana")?.finish();

        assert_eq!(results.total(), 1);
        assert_eq!(
            results.folder_matches,
            vec![path_str(&dir.path().join("bananaville"))]
        );
        Ok(())
    }

    #[test]
    fn test_sharded_search_matches_sequential_order() -> io::Result<()> {
        // Arrange
        let dir = tempdir()?;
        for branch in ["a", "b", "c", "d", "e"] {
            let branch_dir = dir.path().join(branch).join("nested");
            fs::create_dir_all(&branch_dir)?;
            fs::write(dir.path().join(branch).join("match_top.txt"), "match\n")?;
            fs::write(branch_dir.join("match_deep.txt"), "no\nmatch\n")?;
        }
        fs::write(dir.path().join("match_root.txt"), "")?;
        let mut sequential_config = SearchConfig::new(path_str(dir.path()));
        sequential_config.deep_search = true;
        let mut sharded_config = sequential_config.clone();
        sharded_config.thread_count = 3;

        // Act
        let sequential = SearchCoordinator::start(sequential_config, "match")?.finish();
        let sharded = SearchCoordinator::start(sharded_config, "match")?.finish();

        // Assert
        assert_eq!(sequential.file_matches.len(), 11);
        assert_eq!(sequential.content_matches.len(), 10);
        assert_eq!(sharded, sequential);
        Ok(())
    }

    #[test]
    fn test_progress_counts_match_final_results() -> io::Result<()> {
        let dir = tempdir()?;
        setup_fruit_tree(dir.path())?;
        let mut config = SearchConfig::new(path_str(dir.path()));
        config.deep_search = true;

        let mut coordinator = SearchCoordinator::start(config, "banana")?;
        let reader = coordinator.progress_reader();
        let early = reader.snapshot().counts.total();
        coordinator.join();
        let final_snapshot = coordinator.peek();
        let results = coordinator.finish();

        assert!(early <= final_snapshot.counts.total());
        assert_eq!(final_snapshot.counts.folders, results.folder_matches.len());
        assert_eq!(final_snapshot.counts.files, results.file_matches.len());
        assert_eq!(final_snapshot.counts.contents, results.content_matches.len());
        assert_eq!(final_snapshot.query, "banana");
        assert!(final_snapshot.config.deep_search);
        assert_eq!(reader.snapshot().counts, final_snapshot.counts);
        Ok(())
    }

    #[test]
    fn test_missing_root_yields_empty_results() -> io::Result<()> {
        let dir = tempdir()?;
        let config = SearchConfig::new(path_str(&dir.path().join("missing")));

        let results = SearchCoordinator::start(config, "anything")?.finish();

        assert_eq!(results, SearchResults::default());
        Ok(())
    }

    fn remote_fixture() -> MockRemoteSession {
        MockRemoteSession::new("/pub")
            .with_dir(
                "/pub",
                &[&dir_line("banana_docs"), &file_line("readme.txt")],
            )
            .with_dir("/pub/banana_docs", &[&file_line("guide.txt")])
            .with_file("/pub/readme.txt", "intro\nbanana bread\n")
            .with_file("/pub/banana_docs/guide.txt", "nothing here\n")
    }

    #[test]
    fn test_remote_search_reports_absolute_paths_and_resets_directory() -> io::Result<()> {
        // Arrange
        let session = remote_fixture();
        let cwd_calls = Arc::clone(&session.cwd_calls);
        let handle: RemoteHandle = Arc::new(Mutex::new(session));
        let mut config = SearchConfig::new("ftp.example.com/pub");
        config.remote = Some(Arc::clone(&handle));
        config.deep_search = true;
        config.path_mode = PathMode::NameOnly;
        config.thread_count = 4;

        // Act
        let results = SearchCoordinator::start(config, "banana")?.finish();

        // Assert
        assert_eq!(results.folder_matches, vec!["/pub/banana_docs"]);
        assert_eq!(
            results.content_matches,
            vec![ContentMatch {
                path: "/pub/readme.txt".into(),
                lines: vec![2],
            }]
        );
        assert_eq!(results.connection_lost, None);
        let calls = cwd_calls.lock().unwrap();
        assert_eq!(calls.last().map(String::as_str), Some("/pub"));
        Ok(())
    }

    #[test]
    fn test_remote_disconnect_keeps_partial_results() -> io::Result<()> {
        let mut session = remote_fixture();
        session.disconnect_after = Some(1);
        let handle: RemoteHandle = Arc::new(Mutex::new(session));
        let mut config = SearchConfig::new("ftp.example.com/pub");
        config.remote = Some(handle);

        let results = SearchCoordinator::start(config, "banana")?.finish();

        assert_eq!(results.folder_matches, vec!["/pub/banana_docs"]);
        assert!(results.connection_lost.is_some());
        Ok(())
    }
}
