/*
 * Runs one search end to end. `run_search` pairs the coordinator with a progress observer
 * drawing to the given writer; `run_quick_search` runs the coordinator alone, for callers that
 * only want the results back.
 */
use crate::core::{ProgressObserver, SearchConfig, SearchCoordinator, SearchResults};
use std::io::{self, Write};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct SearchRun {
    pub results: SearchResults,
    pub elapsed: Duration,
}

/*
 * Starts the coordinator and an observer reading its progress snapshots, waits for the search,
 * then stops the observer before handing back the results. Returns the observer's writer
 * alongside the run (`None` if the observer thread failed).
 */
pub fn run_search<W: Write + Send + 'static>(
    config: SearchConfig,
    query: &str,
    writer: W,
) -> io::Result<(SearchRun, Option<W>)> {
    let started = Instant::now();
    let mut coordinator = SearchCoordinator::start(config.clone(), query)?;
    let mut observer = ProgressObserver::start(coordinator.progress_reader(), writer)?;

    coordinator.join();
    observer.finish();
    let writer = observer.join();

    let run = SearchRun {
        results: coordinator.finish(),
        elapsed: started.elapsed(),
    };
    log::debug!(
        "SearchRunner: '{query}' in {:?} produced {} result(s) in {:?}",
        config.root,
        run.results.total(),
        run.elapsed
    );
    Ok((run, writer))
}

pub fn run_quick_search(config: SearchConfig, query: &str) -> io::Result<SearchRun> {
    let started = Instant::now();
    let results = SearchCoordinator::start(config, query)?.finish();
    Ok(SearchRun {
        results,
        elapsed: started.elapsed(),
    })
}
