/*
 * The backend abstraction the traversal walks over. A `DirectorySource` lists one directory at a
 * time, splitting its entries into subdirectory and file names, and knows how to join names onto
 * directories, whether a subdirectory may be descended into, and how to open a file for content
 * scanning. `LocalDirectorySource` implements it over the local filesystem; the remote variant
 * lives in `remote.rs`.
 */
use crate::core::remote::RemoteError;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use walkdir::WalkDir;

/*
 * Why a directory could not be listed. `Unreadable` and `Rejected` cost only the affected
 * branch; `Disconnected` means the backend itself is gone and the walk cannot continue.
 */
#[derive(Debug)]
pub enum ListingError {
    Unreadable(io::Error),
    Rejected(String),
    Disconnected(String),
}

impl ListingError {
    pub fn is_disconnect(&self) -> bool {
        matches!(self, ListingError::Disconnected(_))
    }
}

impl From<io::Error> for ListingError {
    fn from(err: io::Error) -> Self {
        ListingError::Unreadable(err)
    }
}

impl From<walkdir::Error> for ListingError {
    fn from(err: walkdir::Error) -> Self {
        ListingError::Unreadable(err.into())
    }
}

impl From<RemoteError> for ListingError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Connection(e) => ListingError::Disconnected(e.to_string()),
            other => ListingError::Rejected(other.to_string()),
        }
    }
}

impl std::fmt::Display for ListingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingError::Unreadable(e) => write!(f, "Directory could not be read: {e}"),
            ListingError::Rejected(msg) => write!(f, "Directory listing rejected: {msg}"),
            ListingError::Disconnected(msg) => write!(f, "Connection lost: {msg}"),
        }
    }
}

impl std::error::Error for ListingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListingError::Unreadable(e) => Some(e),
            _ => None,
        }
    }
}

// The entries of one directory, split by kind, in backend listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub subdirectories: Vec<String>,
    pub files: Vec<String>,
}

/*
 * One traversal backend. Directories and files are addressed by backend path strings, which is
 * the only form both the filesystem and a line-listing transport have in common.
 */
pub trait DirectorySource {
    /*
     * Lists the immediate entries of `directory`. Implementations must not fail for individual
     * odd entries; they either classify them or leave them out.
     */
    fn list(&mut self, directory: &str) -> Result<DirectoryListing, ListingError>;

    // Where a walk starts when the caller has no explicit root.
    fn current_location(&mut self) -> Result<String, ListingError>;

    fn join(&self, directory: &str, name: &str) -> String;

    /*
     * Whether the walk may descend into `name` below `directory`. Sources use this to refuse
     * entries that would make the walk cyclic.
     */
    fn can_descend(&self, _directory: &str, _name: &str) -> bool {
        true
    }

    fn open_file(&mut self, path: &str) -> io::Result<Box<dyn BufRead + '_>>;
}

/*
 * Lists the local filesystem one level at a time with walkdir. Entries are sorted by file name so
 * the traversal order (and therefore the result order) is deterministic. Symbolic links to
 * directories are classified as directories but never descended into.
 */
#[derive(Debug, Default)]
pub struct LocalDirectorySource {}

impl LocalDirectorySource {
    pub fn new() -> Self {
        LocalDirectorySource {}
    }
}

impl DirectorySource for LocalDirectorySource {
    fn list(&mut self, directory: &str) -> Result<DirectoryListing, ListingError> {
        let mut listing = DirectoryListing::default();
        let walker = WalkDir::new(directory)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                // An error on the directory itself means the whole listing failed.
                Err(err) if err.depth() == 0 || err.path() == Some(Path::new(directory)) => {
                    return Err(err.into());
                }
                Err(err) => {
                    log::trace!("LocalDirectorySource: Skipping entry in {directory:?}: {err}");
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = if entry.path_is_symlink() {
                entry.path().is_dir()
            } else {
                entry.file_type().is_dir()
            };

            if is_dir {
                listing.subdirectories.push(name);
            } else {
                listing.files.push(name);
            }
        }
        Ok(listing)
    }

    fn current_location(&mut self) -> Result<String, ListingError> {
        let cwd = std::env::current_dir()?;
        Ok(cwd.to_string_lossy().into_owned())
    }

    fn join(&self, directory: &str, name: &str) -> String {
        Path::new(directory)
            .join(name)
            .to_string_lossy()
            .into_owned()
    }

    fn can_descend(&self, directory: &str, name: &str) -> bool {
        let path = Path::new(directory).join(name);
        match fs::symlink_metadata(&path) {
            Ok(metadata) => !metadata.file_type().is_symlink(),
            Err(_) => true,
        }
    }

    fn open_file(&mut self, path: &str) -> io::Result<Box<dyn BufRead + '_>> {
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    fn path_str(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_local_list_splits_and_sorts_entries() -> io::Result<()> {
        // Arrange
        let dir = tempdir()?;
        fs::create_dir(dir.path().join("zeta"))?;
        fs::create_dir(dir.path().join("alpha"))?;
        fs::write(dir.path().join("b.txt"), "b")?;
        fs::write(dir.path().join("a.txt"), "a")?;
        let mut source = LocalDirectorySource::new();

        // Act
        let listing = source
            .list(&path_str(dir.path()))
            .expect("Listing a fresh temp dir should succeed");

        // Assert
        assert_eq!(listing.subdirectories, vec!["alpha", "zeta"]);
        assert_eq!(listing.files, vec!["a.txt", "b.txt"]);
        Ok(())
    }

    #[test]
    fn test_local_list_missing_directory_is_unreadable() {
        let mut source = LocalDirectorySource::new();
        let result = source.list("this_path_does_not_exist_hopefully");
        assert!(matches!(result, Err(ListingError::Unreadable(_))));
    }

    #[test]
    fn test_local_join_and_open_file() -> io::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("notes.txt"), "hello")?;
        let mut source = LocalDirectorySource::new();

        let joined = source.join(&path_str(dir.path()), "notes.txt");
        assert_eq!(joined, path_str(&dir.path().join("notes.txt")));

        let mut contents = String::new();
        source.open_file(&joined)?.read_to_string(&mut contents)?;
        assert_eq!(contents, "hello");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_local_symlinked_directory_is_listed_but_not_descended() -> io::Result<()> {
        // Arrange
        let dir = tempdir()?;
        fs::create_dir(dir.path().join("real"))?;
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link"))?;
        let mut source = LocalDirectorySource::new();
        let root = path_str(dir.path());

        // Act
        let listing = source.list(&root).expect("Listing should succeed");

        // Assert
        assert_eq!(listing.subdirectories, vec!["link", "real"]);
        assert!(!source.can_descend(&root, "link"));
        assert!(source.can_descend(&root, "real"));
        Ok(())
    }

    #[test]
    fn test_remote_connection_error_maps_to_disconnect() {
        let err: ListingError =
            RemoteError::Connection(io::Error::new(io::ErrorKind::BrokenPipe, "gone")).into();
        assert!(err.is_disconnect());

        let err: ListingError = RemoteError::Rejected("550 No such directory".into()).into();
        assert!(!err.is_disconnect());
    }
}
