/*
 * Renders finished search results for the terminal or as JSON. The text report lists folders,
 * files and content matches in separate sections, numbering entries with one running counter
 * across all sections. Sections for categories the search did not look for are omitted.
 */
use crate::core::{ContentMatch, SearchConfig, SearchResults};
use serde_json::json;
use std::fmt::Write;
use std::time::Duration;

const NONE_FOUND: &str = "-None Found-";

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

fn content_entry(number: usize, content_match: &ContentMatch) -> String {
    format!(
        "[{number}]: {}\n  On Line{}: {:?}",
        content_match.path,
        plural(content_match.lines.len()),
        content_match.lines
    )
}

/*
 * Appends one section. A partial search reports at most one entry per section and uses the
 * singular heading.
 */
fn write_section(
    report: &mut String,
    heading: &str,
    entries: Vec<String>,
    next_number: &mut usize,
) {
    let _ = writeln!(report, "\n::{heading}::");
    if entries.is_empty() {
        let _ = writeln!(report, "{NONE_FOUND}");
        return;
    }
    for entry in entries {
        let _ = writeln!(report, "{entry}");
        *next_number += 1;
    }
}

pub fn format_report(
    query: &str,
    config: &SearchConfig,
    results: &SearchResults,
    elapsed: Duration,
) -> String {
    let total = results.total();
    let mut report = format!(
        "--FastSearch Found '{query}' {total} Time{} in {} in {:.2} Seconds--\n",
        plural(total),
        config.root,
        elapsed.as_secs_f64()
    );

    let full = config.full_search;
    let limit = if full { usize::MAX } else { 1 };
    let mut number = 1;

    if config.result_kind.includes_folders() {
        let heading = if full { "Matching Folder Names" } else { "Matching Folder" };
        let start = number;
        let entries = results
            .folder_matches
            .iter()
            .take(limit)
            .enumerate()
            .map(|(offset, path)| format!("[{}]: {path}", start + offset))
            .collect();
        write_section(&mut report, heading, entries, &mut number);
    }

    if config.result_kind.includes_files() {
        let heading = if full { "Matching File Names" } else { "Matching File" };
        let start = number;
        let entries = results
            .file_matches
            .iter()
            .take(limit)
            .enumerate()
            .map(|(offset, path)| format!("[{}]: {path}", start + offset))
            .collect();
        write_section(&mut report, heading, entries, &mut number);
    }

    if config.deep_search {
        let heading = if full { "Found in Files" } else { "Found in File" };
        let start = number;
        let entries = results
            .content_matches
            .iter()
            .take(limit)
            .enumerate()
            .map(|(offset, content_match)| content_entry(start + offset, content_match))
            .collect();
        write_section(&mut report, heading, entries, &mut number);
    }

    if let Some(reason) = &results.connection_lost {
        let _ = writeln!(
            report,
            "\n--The connection was lost during the search; results may be incomplete ({reason})--"
        );
    }
    report
}

pub fn format_json(
    query: &str,
    config: &SearchConfig,
    results: &SearchResults,
    elapsed: Duration,
) -> serde_json::Result<String> {
    let payload = json!({
        "query": query,
        "root": config.root,
        "deep_search": config.deep_search,
        "full_search": config.full_search,
        "elapsed_seconds": elapsed.as_secs_f64(),
        "total": results.total(),
        "results": results,
    });
    serde_json::to_string_pretty(&payload)
}
