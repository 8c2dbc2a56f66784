/*
 * This module consolidates the search engine itself, independent of the command line. It
 * re-exports the configuration and result types, the backends (`DirectorySource` with its local
 * and remote variants), the coordinator that runs a search on a worker thread, the progress
 * observer that reports on it, and the persisted options layer.
 */
pub mod content_scanner;
pub mod coordinator;
pub mod directory_source;
pub mod match_engine;
pub mod models;
pub mod options;
pub mod path_utils;
pub mod progress_observer;
pub mod remote;
pub mod search_progress;
pub mod traversal;

// Re-export key structures and enums
pub use models::{
    AnimationLevel, ContentMatch, PathMode, RemoteHandle, ResultKind, SearchConfig, SearchResults,
};

// Re-export search execution items
pub use coordinator::SearchCoordinator;
pub use progress_observer::ProgressObserver;

// Re-export remote backend items
pub use remote::{FtpSession, RemoteAddress, RemoteError};

// Re-export options related items
pub use options::{CoreOptionsManager, OptionsManagerOperations, SearchOptions};
