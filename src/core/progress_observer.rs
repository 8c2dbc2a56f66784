/*
 * Terminal progress display for a running search. The observer runs on its own thread, takes
 * snapshots through a `ProgressReader` and redraws a single status line in place: a spinner, the number of
 * results found so far and (with full animation) the directory currently being visited.
 *
 * The done flag is checked every few milliseconds while sleeping, so `finish` takes effect
 * within one sleep increment rather than one spinner cycle.
 */
use crate::core::models::AnimationLevel;
use crate::core::path_utils;
use crate::core::search_progress::{ProgressReader, ProgressSnapshot};
use std::io::{self, Write};
use std::path::{MAIN_SEPARATOR, Path};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const SPINNER_GLYPHS: [char; 4] = ['\\', '|', '/', '-'];
const SLEEP_INCREMENT: Duration = Duration::from_millis(10);
const INCREMENTS_PER_GLYPH: usize = 10;
// Relative directories longer than this are cut at the next separator.
const DIRECTORY_DISPLAY_CHARS: usize = 20;
const CLEAR_SCREEN: &str = "\x1bc";
const ANIMATIONS_DISABLED_TEXT: &str = "Searching with animations disabled ...";

/*
 * What the observer thread needs from the search configuration. `search_root` is the location
 * visited directories are shown relative to: absolute for local searches, like the cursor.
 */
#[derive(Debug, Clone)]
struct DisplaySettings {
    root: String,
    search_root: String,
    query: String,
    deep_search: bool,
    remote: bool,
    animation: AnimationLevel,
    clear_screen: bool,
}

pub struct ProgressObserver<W: Write + Send + 'static> {
    done: Arc<AtomicBool>,
    worker: Option<JoinHandle<W>>,
}

impl<W: Write + Send + 'static> ProgressObserver<W> {
    pub fn start(reader: ProgressReader, writer: W) -> io::Result<Self> {
        let settings = DisplaySettings::from_snapshot(&reader.snapshot());
        let done = Arc::new(AtomicBool::new(false));
        let worker_done = Arc::clone(&done);
        let worker = thread::Builder::new()
            .name("progress-observer".to_string())
            .spawn(move || run_observer(settings, reader, worker_done, writer))?;

        Ok(ProgressObserver {
            done,
            worker: Some(worker),
        })
    }

    // Signals the observer to wipe its line and stop. Safe to call more than once.
    pub fn finish(&self) {
        self.done.store(true, Ordering::Release);
    }

    /*
     * Finishes the observer if that has not happened yet and waits for it. Returns the writer,
     * or `None` if the observer was already joined or its thread panicked.
     */
    pub fn join(&mut self) -> Option<W> {
        self.finish();
        let worker = self.worker.take()?;
        match worker.join() {
            Ok(writer) => Some(writer),
            Err(_) => {
                log::error!("ProgressObserver: Observer thread panicked");
                None
            }
        }
    }
}

impl<W: Write + Send + 'static> Drop for ProgressObserver<W> {
    fn drop(&mut self) {
        self.finish();
    }
}

impl DisplaySettings {
    fn from_snapshot(snapshot: &ProgressSnapshot) -> Self {
        let config = &snapshot.config;
        let remote = config.is_remote();
        DisplaySettings {
            root: config.root.clone(),
            search_root: if remote {
                config.root.clone()
            } else {
                path_utils::absolute_root(&config.root)
            },
            query: snapshot.query.clone(),
            deep_search: config.deep_search,
            remote,
            animation: config.animation,
            clear_screen: config.clear_screen,
        }
    }
}

/*
 * Renders a visited directory for the status line. Local directories are shown relative to
 * `root` as `[root]/rel/`, cut after the first separator past the display limit. Both must be in
 * the same absolute form. Remote directories are shown as they are, with a trailing `/`.
 */
pub fn display_directory(current: &str, root: &str, remote: bool) -> String {
    if remote {
        return if current.ends_with('/') {
            current.to_string()
        } else {
            format!("{current}/")
        };
    }

    let relative = path_utils::relative_to(Path::new(current), Path::new(root))
        .unwrap_or_else(|| current.to_string());
    if relative.is_empty() {
        return format!("[root]{MAIN_SEPARATOR}");
    }
    if relative.chars().count() <= DIRECTORY_DISPLAY_CHARS {
        return format!("[root]{MAIN_SEPARATOR}{relative}{MAIN_SEPARATOR}");
    }

    let cut = relative
        .char_indices()
        .skip(DIRECTORY_DISPLAY_CHARS)
        .find(|(_, c)| *c == MAIN_SEPARATOR)
        .map(|(index, c)| index + c.len_utf8());
    let shown: String = match cut {
        Some(end) => relative[..end].to_string(),
        None => relative.chars().take(DIRECTORY_DISPLAY_CHARS).collect(),
    };
    format!("[root]{MAIN_SEPARATOR}{shown}...")
}

fn results_text(count: usize) -> String {
    if count == 1 {
        "Found 1 Result".to_string()
    } else {
        format!("Found {count} Results")
    }
}

fn header_text(settings: &DisplaySettings) -> String {
    let activity = if settings.deep_search {
        "performing a Deep Search"
    } else {
        "searching"
    };
    format!(
        "In {} and all its subfolders, FastSearch is {activity} for the string '{}'.",
        settings.root, settings.query
    )
}

// Sleeps for one glyph interval. Returns true as soon as the done flag is seen.
fn sleep_unless_done(done: &AtomicBool) -> bool {
    for _ in 0..INCREMENTS_PER_GLYPH {
        if done.load(Ordering::Acquire) {
            return true;
        }
        thread::sleep(SLEEP_INCREMENT);
    }
    done.load(Ordering::Acquire)
}

// A line that is redrawn in place. Remembers how wide the last drawing was so it can be erased.
struct StatusLine<W: Write> {
    writer: W,
    drawn_width: usize,
}

impl<W: Write> StatusLine<W> {
    fn draw(&mut self, text: &str) -> io::Result<()> {
        let width = text.chars().count();
        let padding = self.drawn_width.saturating_sub(width);
        write!(self.writer, "\r{text}{:padding$}", "")?;
        self.drawn_width = width;
        self.writer.flush()
    }

    fn wipe(&mut self) -> io::Result<()> {
        let width = self.drawn_width;
        write!(self.writer, "\r{:width$}\r", "")?;
        self.drawn_width = 0;
        self.writer.flush()
    }
}

fn run_observer<W: Write>(
    settings: DisplaySettings,
    reader: ProgressReader,
    done: Arc<AtomicBool>,
    writer: W,
) -> W {
    let mut line = StatusLine {
        writer,
        drawn_width: 0,
    };
    if let Err(e) = animate(&settings, &reader, &done, &mut line) {
        log::debug!("ProgressObserver: Could not draw progress: {e}");
    }
    line.writer
}

fn animate<W: Write>(
    settings: &DisplaySettings,
    reader: &ProgressReader,
    done: &AtomicBool,
    line: &mut StatusLine<W>,
) -> io::Result<()> {
    if settings.clear_screen {
        write!(line.writer, "{CLEAR_SCREEN}")?;
    }

    if settings.animation == AnimationLevel::None {
        writeln!(line.writer, "\n{ANIMATIONS_DISABLED_TEXT}")?;
        return line.writer.flush();
    }

    writeln!(line.writer, "{}\n", header_text(settings))?;
    line.draw("Searching -")?;

    'spin: loop {
        for glyph in SPINNER_GLYPHS {
            if sleep_unless_done(done) {
                break 'spin;
            }

            let snapshot = reader.snapshot();
            let mut text = format!("Searching {glyph}");
            let found = snapshot.counts.total();
            if found > 0 {
                text.push_str("    ");
                text.push_str(&results_text(found));
            }
            if settings.animation == AnimationLevel::Full {
                if let Some(current) = snapshot.current_directory {
                    let shown =
                        display_directory(&current, &settings.search_root, settings.remote);
                    text.push_str("    Searching in: ");
                    text.push_str(&shown);
                }
            }
            line.draw(&text)?;
        }
    }

    line.wipe()?;
    if settings.clear_screen {
        write!(line.writer, "{CLEAR_SCREEN}")?;
        line.writer.flush()?;
    }
    Ok(())
}
