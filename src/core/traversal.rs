/*
 * Lazy depth-first, top-down traversal over a `DirectorySource`. Each visited directory is
 * listed only when the walk reaches it and handed to the visitor as a `TraversalGroup`; the
 * visitor may prune `subdirectories` before the walk descends, and can end the walk early.
 */
use crate::core::directory_source::{DirectorySource, ListingError};
use crate::core::models::TraversalGroup;
use std::ops::ControlFlow;

// How a walk ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEnd {
    Exhausted,
    Stopped,
    Disconnected(String),
}

/*
 * Walks the hierarchy below `root` (inclusive), parent before children, children in listing
 * order. Directories that cannot be listed contribute nothing and the walk moves on; a lost
 * backend connection ends the walk.
 */
pub fn walk<F>(source: &mut dyn DirectorySource, root: &str, mut visit: F) -> WalkEnd
where
    F: FnMut(&mut dyn DirectorySource, &mut TraversalGroup) -> ControlFlow<()>,
{
    let mut pending = vec![root.to_string()];

    while let Some(directory) = pending.pop() {
        let listing = match source.list(&directory) {
            Ok(listing) => listing,
            Err(ListingError::Disconnected(msg)) => {
                log::warn!("Traversal: Lost connection while listing {directory:?}: {msg}");
                return WalkEnd::Disconnected(msg);
            }
            Err(e) => {
                log::debug!("Traversal: Skipping {directory:?}: {e}");
                continue;
            }
        };

        let mut group = TraversalGroup {
            directory,
            subdirectories: listing.subdirectories,
            files: listing.files,
        };

        if visit(&mut *source, &mut group).is_break() {
            return WalkEnd::Stopped;
        }

        // Reverse push so the first listed child is walked first.
        for name in group.subdirectories.iter().rev() {
            if source.can_descend(&group.directory, name) {
                pending.push(source.join(&group.directory, name));
            } else {
                log::trace!(
                    "Traversal: Not descending into {name:?} below {:?}",
                    group.directory
                );
            }
        }
    }

    WalkEnd::Exhausted
}
