/*
 * Remote (FTP) traversal backend. `RemoteSession` is the minimal capability set the search needs
 * from a line-listing transport: change the working directory, list it, report it, and fetch a
 * file. `FtpSession` implements it on top of `suppaftp`. `RemoteDirectorySource` adapts any
 * session to the `DirectorySource` contract, parsing `LIST` output into directory and file names.
 */
use crate::core::directory_source::{DirectoryListing, DirectorySource, ListingError};
use crate::core::path_utils;
use std::io::{self, BufRead, Cursor};
use suppaftp::{FtpError, FtpStream};

pub const DEFAULT_FTP_PORT: u16 = 21;

// `LIST` lines are split into at most this many fields; the last one keeps embedded spaces.
const LISTING_FIELD_COUNT: usize = 9;
// Lines with fewer fields than this are not entries (totals, banners, blank lines).
const MIN_LISTING_FIELDS: usize = 6;
const SYMLINK_MARKER: &str = " -> ";

#[derive(Debug)]
pub enum RemoteError {
    // The server answered, but refused the request (permissions, missing path, ...).
    Rejected(String),
    // The transport failed; the session should be considered dead.
    Connection(io::Error),
    InvalidAddress(String),
}

impl From<FtpError> for RemoteError {
    fn from(err: FtpError) -> Self {
        match err {
            FtpError::ConnectionError(e) => RemoteError::Connection(e),
            other => RemoteError::Rejected(other.to_string()),
        }
    }
}

impl From<io::Error> for RemoteError {
    fn from(err: io::Error) -> Self {
        RemoteError::Connection(err)
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::Rejected(msg) => write!(f, "Remote request rejected: {msg}"),
            RemoteError::Connection(e) => write!(f, "Remote connection error: {e}"),
            RemoteError::InvalidAddress(addr) => write!(f, "Invalid remote address: {addr}"),
        }
    }
}

impl std::error::Error for RemoteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RemoteError::Connection(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RemoteError>;

/*
 * Operations a remote search needs from an established, logged-in session. Implemented by
 * `FtpSession` in production and by in-memory mocks in tests.
 */
pub trait RemoteSession {
    fn change_dir(&mut self, path: &str) -> Result<()>;
    // Raw `LIST` lines for the current working directory.
    fn list_current(&mut self) -> Result<Vec<String>>;
    fn working_dir(&mut self) -> Result<String>;
    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>>;
}

/*
 * A remote root as typed by the user: `ftp://host[:port][/dir]` or `ftp.host[/dir]`.
 * `display_root` is what the search reports as its root (`host/dir`).
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddress {
    pub host: String,
    pub port: u16,
    pub directory: Option<String>,
}

impl RemoteAddress {
    // Returns `None` when `input` does not look like a remote location at all.
    pub fn parse(input: &str) -> Option<std::result::Result<Self, RemoteError>> {
        let trimmed = input.trim();
        let without_scheme = if let Some(rest) = trimmed.strip_prefix("ftp://") {
            rest
        } else if trimmed.starts_with("ftp.") {
            trimmed
        } else {
            return None;
        };

        let (authority, directory) = match without_scheme.find('/') {
            Some(index) => (
                &without_scheme[..index],
                Some(without_scheme[index..].to_string()).filter(|d| d != "/"),
            ),
            None => (without_scheme, None),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port_text)) => match port_text.parse::<u16>() {
                Ok(port) => (host, port),
                Err(_) => {
                    return Some(Err(RemoteError::InvalidAddress(input.to_string())));
                }
            },
            None => (authority, DEFAULT_FTP_PORT),
        };

        if host.is_empty() {
            return Some(Err(RemoteError::InvalidAddress(input.to_string())));
        }

        Some(Ok(RemoteAddress {
            host: host.to_string(),
            port,
            directory,
        }))
    }

    pub fn display_root(&self) -> String {
        let mut root = self.host.clone();
        if self.port != DEFAULT_FTP_PORT {
            root.push_str(&format!(":{}", self.port));
        }
        if let Some(directory) = &self.directory {
            root.push_str(directory);
        }
        root
    }
}

// An FTP control connection, logged in and positioned at the requested directory.
pub struct FtpSession {
    stream: FtpStream,
}

impl FtpSession {
    pub fn connect(address: &RemoteAddress, user: &str, password: &str) -> Result<Self> {
        log::debug!(
            "FtpSession: Connecting to {}:{} as '{user}'",
            address.host,
            address.port
        );
        let mut stream = FtpStream::connect((address.host.as_str(), address.port))?;
        stream.login(user, password)?;
        if let Some(directory) = &address.directory {
            stream.cwd(directory)?;
        }
        log::info!("FtpSession: Connected to {}", address.display_root());
        Ok(FtpSession { stream })
    }
}

impl RemoteSession for FtpSession {
    fn change_dir(&mut self, path: &str) -> Result<()> {
        Ok(self.stream.cwd(path)?)
    }

    fn list_current(&mut self) -> Result<Vec<String>> {
        Ok(self.stream.list(None)?)
    }

    fn working_dir(&mut self) -> Result<String> {
        Ok(self.stream.pwd()?)
    }

    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>> {
        Ok(self.stream.retr_as_buffer(path)?.into_inner())
    }
}

// One parsed `LIST` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_dir: bool,
}

fn split_listing_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::with_capacity(LISTING_FIELD_COUNT);
    let mut rest = line.trim_start();
    while !rest.is_empty() {
        if fields.len() == LISTING_FIELD_COUNT - 1 {
            fields.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                fields.push(&rest[..end]);
                rest = rest[end..].trim_start();
            }
            None => {
                fields.push(rest);
                break;
            }
        }
    }
    fields
}

/*
 * Parses a Unix-style `LIST` line. Returns `None` for lines that are not usable entries: too few
 * fields, the `.`/`..` self references, and symbolic links (`name -> target`).
 */
pub fn parse_listing_line(line: &str) -> Option<RemoteEntry> {
    let fields = split_listing_fields(line.trim_end_matches(['\r', '\n']));
    if fields.len() < MIN_LISTING_FIELDS {
        return None;
    }

    let name = *fields.last()?;
    if name == "." || name == ".." {
        return None;
    }
    if matches!(name.find(SYMLINK_MARKER), Some(index) if index > 0) {
        return None;
    }

    Some(RemoteEntry {
        name: name.to_string(),
        is_dir: fields[0].starts_with('d'),
    })
}

/*
 * Walks a remote session. Listing a directory changes the session's working directory to it, so
 * the session is borrowed exclusively for the lifetime of the source.
 */
pub struct RemoteDirectorySource<'a> {
    session: &'a mut dyn RemoteSession,
}

impl<'a> RemoteDirectorySource<'a> {
    pub fn new(session: &'a mut dyn RemoteSession) -> Self {
        RemoteDirectorySource { session }
    }
}

impl DirectorySource for RemoteDirectorySource<'_> {
    fn list(&mut self, directory: &str) -> std::result::Result<DirectoryListing, ListingError> {
        self.session.change_dir(directory)?;
        let lines = self.session.list_current()?;

        let mut listing = DirectoryListing::default();
        for line in &lines {
            match parse_listing_line(line) {
                Some(entry) if entry.is_dir => listing.subdirectories.push(entry.name),
                Some(entry) => listing.files.push(entry.name),
                None => log::trace!("RemoteDirectorySource: Discarding listing line {line:?}"),
            }
        }
        Ok(listing)
    }

    fn current_location(&mut self) -> std::result::Result<String, ListingError> {
        Ok(self.session.working_dir()?)
    }

    fn join(&self, directory: &str, name: &str) -> String {
        path_utils::join_remote(directory, name)
    }

    fn open_file(&mut self, path: &str) -> io::Result<Box<dyn BufRead + '_>> {
        let contents = self
            .session
            .retrieve(path)
            .map_err(|e| io::Error::other(e.to_string()))?;
        Ok(Box::new(Cursor::new(contents)))
    }
}
