//! Label-keyed delta merge over content groups.
//!
//! Groups are matched by their `content_group_label`. Each delta group, in
//! order, is handled by the first rule that applies:
//!
//! 1. No label: appended verbatim.
//! 2. Carries `delete_group`: the matching group is removed.
//! 3. Carries `skip_from_merge`: the matching group is left as is.
//! 4. Label unknown: appended as a new group.
//! 5. Otherwise every item is applied to the matching group. A tombstone
//!    removes the item with its label; anything else is inserted or replaced.
//!
//! Unlabeled groups of the original are never touched.

use std::collections::HashMap;

use tracing::debug;

use docgraph_types::wrapper::{find_item, group_label, insert_or_replace};
use docgraph_types::{
    ContentGroup, ContentGroups, CONTENT_GROUP_LABEL, DELETE_GROUP, SKIP_FROM_MERGE,
};

use crate::error::GraphResult;

/// Merge `delta` into a copy of `original`.
///
/// Fails only when a group label holds a non-string value.
pub fn merge_groups(
    original: &[ContentGroup],
    delta: &[ContentGroup],
) -> GraphResult<ContentGroups> {
    // Deleted groups leave a `None` hole so earlier indices stay valid.
    let mut slots: Vec<Option<ContentGroup>> = original.iter().cloned().map(Some).collect();
    let mut by_label: HashMap<String, usize> = HashMap::new();
    for (index, group) in original.iter().enumerate() {
        if let Some(label) = group_label(group)? {
            by_label.entry(label.to_string()).or_insert(index);
        }
    }

    for group in delta {
        let Some(label) = group_label(group)? else {
            slots.push(Some(group.clone()));
            continue;
        };

        if find_item(group, DELETE_GROUP).is_some() {
            match by_label.remove(label) {
                Some(index) => slots[index] = None,
                None => debug!(group = label, "delete_group matched nothing"),
            }
            continue;
        }

        if find_item(group, SKIP_FROM_MERGE).is_some() {
            continue;
        }

        let index = match by_label.get(label).copied() {
            Some(index) => index,
            None => {
                slots.push(Some(group.clone()));
                by_label.insert(label.to_string(), slots.len() - 1);
                continue;
            }
        };
        let Some(target) = slots[index].as_mut() else {
            continue;
        };

        for item in group {
            if item.label == CONTENT_GROUP_LABEL {
                continue;
            }
            if item.is_tombstone() {
                target.retain(|existing| existing.label != item.label);
            } else {
                insert_or_replace(target, item.clone());
            }
        }
    }

    Ok(slots.into_iter().flatten().collect())
}
