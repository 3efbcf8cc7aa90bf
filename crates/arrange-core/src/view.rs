//! The derived, sorted flat view over all sections' files.
//!
//! Sorting never touches section order; it only produces an ordering of
//! `(section, file)` positions and writes each file's position back into its
//! `index`.

use std::cmp::Ordering;

use arrange_proto::model::{AudioFileItem, Section, SortUpdate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Path,
    FileName,
    Size,
    BitRate,
    Channels,
    BitDepth,
    Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Descending,
        }
    }
}

/// Case-insensitive first, raw bytes to break ties.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Missing values sort after present ones in either direction.
fn compare_optional<T: Ord>(a: Option<T>, b: Option<T>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match direction {
            SortDirection::Ascending => a.cmp(&b),
            SortDirection::Descending => b.cmp(&a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &AudioFileItem, b: &AudioFileItem, spec: &SortSpec) -> Ordering {
    let text = |ord: Ordering| match spec.direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    };
    match spec.key {
        SortKey::Path => text(compare_text(&a.path, &b.path)),
        SortKey::FileName => text(compare_text(a.file_name(), b.file_name())),
        SortKey::Size => compare_optional(a.size, b.size, spec.direction),
        SortKey::BitRate => compare_optional(a.bit_rate, b.bit_rate, spec.direction),
        SortKey::Channels => compare_optional(a.channels, b.channels, spec.direction),
        SortKey::BitDepth => compare_optional(a.bit_depth, b.bit_depth, spec.direction),
        SortKey::Duration => compare_optional(a.duration_ms, b.duration_ms, spec.direction),
    }
}

/// `(section index, file index)` pairs in view order.  Without a spec the
/// natural order (sections in order, files in order) is returned.  The sort
/// is stable, so equal keys keep their natural order in both directions.
pub fn sorted_positions(sections: &[Section], sort: Option<&SortSpec>) -> Vec<(usize, usize)> {
    let mut positions: Vec<(usize, usize)> = sections
        .iter()
        .enumerate()
        .flat_map(|(si, s)| (0..s.files.len()).map(move |fi| (si, fi)))
        .collect();

    if let Some(spec) = sort {
        positions.sort_by(|&(sa, fa), &(sb, fb)| {
            compare(&sections[sa].files[fa], &sections[sb].files[fb], spec)
        });
    }
    positions
}

/// Flattened, sorted copy of all files with `index` set to view position.
pub fn sorted_files(sections: &[Section], sort: Option<&SortSpec>) -> Vec<AudioFileItem> {
    sorted_positions(sections, sort)
        .into_iter()
        .enumerate()
        .map(|(index, (si, fi))| {
            let mut item = sections[si].files[fi].clone();
            item.index = index;
            item
        })
        .collect()
}

/// Write view positions back into every file's `index`.
pub fn apply_indices(sections: &mut [Section], sort: Option<&SortSpec>) {
    let positions = sorted_positions(sections, sort);
    for (index, (si, fi)) in positions.into_iter().enumerate() {
        sections[si].files[fi].index = index;
    }
}

/// The `(id, index)` list for `update_sorting`.  Files the backend has not
/// assigned an id yet are skipped; the second value counts them.
pub fn sort_updates(view: &[AudioFileItem]) -> (Vec<SortUpdate>, usize) {
    let mut skipped = 0;
    let updates = view
        .iter()
        .filter_map(|item| match &item.id {
            Some(id) => Some(SortUpdate {
                id: id.clone(),
                index: item.index,
            }),
            None => {
                skipped += 1;
                None
            }
        })
        .collect();
    (updates, skipped)
}
