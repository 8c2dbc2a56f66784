/*
 * This module provides the application layer between the command line and the search engine in
 * `core`: running a search with its progress display (`search_runner`), connecting to a remote
 * root (`remote_root`), and rendering the final results (`report`).
 */
pub mod remote_root;
pub mod report;
pub mod search_runner;

pub use remote_root::connect_remote_root;
pub use report::{format_json, format_report};
pub use search_runner::{run_quick_search, run_search};
