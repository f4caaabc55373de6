use crate::config::{FileSelector, OrderBy, RemoteFile};
use crate::remote::FileMetadata;

/// Applies a selector to a folder listing: filter by mime type, sort by the
/// named metadata field (lexical order), reverse when descending, then
/// truncate to `top`. Truncation always happens last. An empty result is a
/// valid outcome, never an error.
pub fn select_files(listing: &[FileMetadata], selector: &FileSelector) -> Vec<RemoteFile> {
    let mut matched: Vec<&FileMetadata> = listing
        .iter()
        .filter(|file| match selector.extension {
            Some(kind) => file.mime_type == kind.mime_type(),
            None => true,
        })
        .collect();

    matched.sort_by(|lhs, rhs| {
        sort_key(lhs, selector.order_by).cmp(sort_key(rhs, selector.order_by))
    });
    if selector.descending {
        matched.reverse();
    }

    if let Some(top) = selector.top {
        matched.truncate(top);
    }

    matched
        .into_iter()
        .map(|file| RemoteFile {
            id: file.id.clone(),
            name: Some(file.name.clone()),
        })
        .collect()
}

fn sort_key(file: &FileMetadata, order_by: OrderBy) -> &str {
    match order_by {
        OrderBy::Name => &file.name,
        OrderBy::Created => &file.created_time,
        OrderBy::Modified => &file.modified_time,
    }
}
