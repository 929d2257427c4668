//! Group paths, display ordering and the group-pointer dictionary.
//!
//! Entries are shown to the user as `group/name` labels, sorted
//! case-insensitively.  Every label is compared with a `"/:"` sentinel
//! appended, so a bare name sorts ahead of a group sharing its text.
//! The sort also yields `order`, the permutation from display position
//! to storage index; entry numbers typed by the user always go through
//! it.
//!
//! Before every encode the store rebuilds a `GroupMap`: each distinct
//! non-empty group path gets a 2-byte pointer in first-seen order.  The
//! map only exists inside one payload and is never kept between saves.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use super::bytes::{put_num, put_prefixed};
use super::entry::Entry;
use crate::errors::{Result, StrongboxError};

/// Appended to every lower-cased label before comparison.
const SORT_SENTINEL: &str = "/:";

/// Group paths are framed with a 2-byte length.
pub const MAX_GROUP_LEN: usize = 65_535;

/// Largest pointer a 2-byte group slot can hold; 0 means "no group".
pub const MAX_GROUP_POINTER: u16 = u16::MAX;

/// Sorted labels plus the display -> storage permutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameGroups {
    pub labels: Vec<String>,
    pub order: Vec<usize>,
}

/// Build the sorted label list for `entries`.
pub fn name_groups(entries: &[Entry]) -> NameGroups {
    let raw: Vec<String> = entries.iter().map(Entry::label).collect();

    let mut order: Vec<usize> = (0..raw.len()).collect();
    // `sort_by` is stable: equal keys keep storage order.
    order.sort_by(|&a, &b| compare_labels(&raw[a], &raw[b]));

    let labels = order.iter().map(|&i| raw[i].clone()).collect();
    NameGroups { labels, order }
}

/// Case-insensitive comparator used for display ordering.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

fn sort_key(label: &str) -> String {
    let mut key = label.to_lowercase();
    key.push_str(SORT_SENTINEL);
    key
}

/// True if two labels collide once case is ignored.
pub fn has_duplicate_name_groups<S: AsRef<str>>(labels: &[S]) -> bool {
    let mut seen = HashSet::with_capacity(labels.len());
    labels
        .iter()
        .any(|label| !seen.insert(sort_key(label.as_ref())))
}

/// Check a group path: empty, or no leading `/` or space, no trailing
/// `/`, no `//`, no `/ `, and short enough for its 2-byte frame.
pub fn validate_group_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Ok(());
    }
    if path.len() > MAX_GROUP_LEN {
        return Err(StrongboxError::Validation(format!(
            "group path cannot exceed {MAX_GROUP_LEN} bytes"
        )));
    }
    if path.starts_with('/') || path.starts_with(' ') {
        return Err(StrongboxError::Validation(format!(
            "group '{path}' cannot start with '/' or a space"
        )));
    }
    if path.ends_with('/') {
        return Err(StrongboxError::Validation(format!(
            "group '{path}' cannot end with '/'"
        )));
    }
    if path.contains("//") || path.contains("/ ") {
        return Err(StrongboxError::Validation(format!(
            "group '{path}' cannot contain '//' or a space after '/'"
        )));
    }
    Ok(())
}

/// Join segment names into a group path, escaping `/` inside a segment
/// as `\`.
pub fn join_segments<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref().replace('/', "\\"))
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a group path into segment names, turning `\` back into `/`.
pub fn split_segments(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split('/').map(|s| s.replace('\\', "/")).collect()
}

/// The group-path -> pointer dictionary for one payload.
#[derive(Debug, Clone, Default)]
pub struct GroupMap {
    pointers: HashMap<String, u16>,
    /// Paths in pointer order (pointer = index + 1).
    paths: Vec<String>,
}

impl GroupMap {
    /// Assign pointers 1, 2, ... to distinct non-empty groups in the
    /// order they first appear in `entries`.
    pub fn build(entries: &[Entry]) -> Result<Self> {
        let mut map = Self::default();
        for entry in entries {
            if entry.group.is_empty() || map.pointers.contains_key(&entry.group) {
                continue;
            }
            let next = u16::try_from(map.paths.len() + 1).map_err(|_| {
                StrongboxError::Validation(format!(
                    "a vault can hold at most {MAX_GROUP_POINTER} groups"
                ))
            })?;
            map.pointers.insert(entry.group.clone(), next);
            map.paths.push(entry.group.clone());
        }
        Ok(map)
    }

    /// Pointer for `group`; 0 for the empty group or unknown paths.
    pub fn pointer_of(&self, group: &str) -> u16 {
        self.pointers.get(group).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Serialized header: `(u16 len, path, u16 pointer)*`, wrapped in a
    /// 4-byte length.
    pub fn header(&self) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        for (index, path) in self.paths.iter().enumerate() {
            put_prefixed(&mut body, path.as_bytes(), 2).map_err(group_encode_error)?;
            put_num(&mut body, index as u64 + 1, 2).map_err(group_encode_error)?;
        }
        let mut header = Vec::with_capacity(4 + body.len());
        put_prefixed(&mut header, &body, 4).map_err(group_encode_error)?;
        Ok(header)
    }
}

fn group_encode_error(e: super::bytes::CodecError) -> StrongboxError {
    StrongboxError::Validation(format!("group header too large: {e}"))
}
