use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::FlexValue;

/// Reserved item naming the group it belongs to. Must hold a string.
pub const CONTENT_GROUP_LABEL: &str = "content_group_label";

/// Reserved item classifying a group. Must hold an account name.
pub const CONTENT_GROUP_TYPE: &str = "content_group_type";

/// Merge control: a delta group carrying this label deletes the matching group.
pub const DELETE_GROUP: &str = "delete_group";

/// Merge control: a delta group carrying this label leaves the matching group alone.
pub const SKIP_FROM_MERGE: &str = "skip_from_merge";

/// A single labeled value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Content {
    pub label: String,
    pub value: FlexValue,
}

/// An ordered list of items. Labels are expected, not enforced, to be unique.
pub type ContentGroup = Vec<Content>;

/// An ordered list of groups. Order is significant for hashing.
pub type ContentGroups = Vec<ContentGroup>;

impl Content {
    pub fn new(label: impl Into<String>, value: impl Into<FlexValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// A `content_group_label` item.
    pub fn group_label(label: impl Into<String>) -> Self {
        Self::new(CONTENT_GROUP_LABEL, FlexValue::String(label.into()))
    }

    /// A tombstone for `label`, for use in merge deltas.
    pub fn tombstone(label: impl Into<String>) -> Self {
        Self::new(label, FlexValue::Empty)
    }

    pub fn is_tombstone(&self) -> bool {
        self.value.is_empty()
    }
}

/// Readable form `{label=[tag,value]}`.
///
/// Fingerprints use the length-prefixed encoding in `docgraph-crypto`, not this.
impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}=[{},{}]}}",
            self.label,
            self.value.type_name(),
            self.value
        )
    }
}

/// Build a labeled group from items, prepending the group label.
pub fn labeled_group(
    label: impl Into<String>,
    items: impl IntoIterator<Item = Content>,
) -> ContentGroup {
    std::iter::once(Content::group_label(label))
        .chain(items)
        .collect()
}

/// Wrap a single group as a full set of groups.
pub fn rollup_group(group: ContentGroup) -> ContentGroups {
    vec![group]
}

/// Wrap a single item as a one-group, one-item set of groups.
pub fn rollup_content(content: Content) -> ContentGroups {
    vec![vec![content]]
}
