/*
 * Shared state between the search worker and the progress observer. The worker owns the result
 * sequences; what it shares is a set of monotonic match counters and the directory currently
 * being visited. Counters are bumped only after the corresponding result has been stored, so an
 * observer never sees a count larger than what the final results contain.
 */
use crate::core::models::{ContentMatch, SearchConfig, SearchResults};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchCounts {
    pub folders: usize,
    pub files: usize,
    pub contents: usize,
}

impl MatchCounts {
    pub fn total(&self) -> usize {
        self.folders + self.files + self.contents
    }
}

#[derive(Debug, Default)]
pub struct SearchProgress {
    folder_count: AtomicUsize,
    file_count: AtomicUsize,
    content_count: AtomicUsize,
    current_directory: Mutex<Option<String>>,
}

impl SearchProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> MatchCounts {
        MatchCounts {
            folders: self.folder_count.load(Ordering::Acquire),
            files: self.file_count.load(Ordering::Acquire),
            contents: self.content_count.load(Ordering::Acquire),
        }
    }

    pub fn set_current_directory(&self, directory: &str) {
        let mut current = self
            .current_directory
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *current = Some(directory.to_string());
    }

    pub fn current_directory(&self) -> Option<String> {
        self.current_directory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/*
 * A best-effort, point-in-time view of a running search, taken through a `ProgressReader`.
 * The counts may lag behind the worker but never run ahead of it.
 */
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub counts: MatchCounts,
    pub query: String,
    pub config: SearchConfig,
    pub current_directory: Option<String>,
}

/*
 * Takes snapshots of one search from any thread. Pairs the shared progress with the query and
 * configuration the search was started with. Every clone reads the same search.
 */
#[derive(Debug, Clone)]
pub struct ProgressReader {
    progress: Arc<SearchProgress>,
    query: String,
    config: SearchConfig,
}

impl ProgressReader {
    pub fn new(progress: Arc<SearchProgress>, query: &str, config: SearchConfig) -> Self {
        ProgressReader {
            progress,
            query: query.to_string(),
            config,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            counts: self.progress.counts(),
            query: self.query.clone(),
            config: self.config.clone(),
            current_directory: self.progress.current_directory(),
        }
    }
}

/*
 * Append-only result store for one walk. Every push updates the shared counters after the
 * result is in place. Several accumulators may share one `SearchProgress` when a search is split
 * across threads.
 */
#[derive(Debug)]
pub struct ResultAccumulator {
    results: SearchResults,
    progress: Arc<SearchProgress>,
}

impl ResultAccumulator {
    pub fn new(progress: Arc<SearchProgress>) -> Self {
        ResultAccumulator {
            results: SearchResults::default(),
            progress,
        }
    }

    pub fn push_folder(&mut self, path: String) {
        self.results.folder_matches.push(path);
        self.progress.folder_count.fetch_add(1, Ordering::Release);
    }

    pub fn push_file(&mut self, path: String) {
        self.results.file_matches.push(path);
        self.progress.file_count.fetch_add(1, Ordering::Release);
    }

    pub fn push_content(&mut self, content_match: ContentMatch) {
        self.results.content_matches.push(content_match);
        self.progress.content_count.fetch_add(1, Ordering::Release);
    }

    pub fn into_results(self) -> SearchResults {
        self.results
    }
}
