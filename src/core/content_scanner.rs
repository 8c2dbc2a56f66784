/*
 * Line-by-line content search for deep searches. A file that cannot be opened or is not valid
 * UTF-8 text yields no matches; the failure is logged at debug level and never stops the search.
 */
use std::io::{self, BufRead};

#[derive(Debug, Clone)]
pub struct ContentScanner {
    needle: String,
}

impl ContentScanner {
    pub fn new(query: &str) -> Self {
        ContentScanner {
            needle: query.to_lowercase(),
        }
    }

    /*
     * Returns the 1-based numbers of the lines containing the query, compared case-insensitively.
     * Any read or decode error aborts the scan and is returned to the caller.
     */
    pub fn scan<R: BufRead>(&self, reader: R) -> io::Result<Vec<usize>> {
        let mut matching_lines = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.to_lowercase().contains(&self.needle) {
                matching_lines.push(index + 1);
            }
        }
        Ok(matching_lines)
    }

    // Like `scan`, but swallows failures: an unreadable source has no matching lines.
    pub fn scan_or_empty<R: BufRead>(&self, reader: R, label: &str) -> Vec<usize> {
        match self.scan(reader) {
            Ok(lines) => lines,
            Err(e) => {
                log::debug!("ContentScanner: Ignoring unreadable content in {label:?}: {e}");
                Vec::new()
            }
        }
    }
}
