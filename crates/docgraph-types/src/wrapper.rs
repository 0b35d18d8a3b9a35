//! Lookup and editing over borrowed [`ContentGroups`].
//!
//! A [`ContentWrapper`] never takes ownership of the groups it operates on.
//! Wrap `&ContentGroups` for read access or `&mut ContentGroups` to edit in
//! place. Every lookup is a linear scan; groups are expected to be small.

use crate::account::AccountName;
use crate::asset::Asset;
use crate::checksum::Checksum256;
use crate::content::{Content, ContentGroup, ContentGroups, CONTENT_GROUP_LABEL, CONTENT_GROUP_TYPE};
use crate::error::ContentError;
use crate::timestamp::Timestamp;
use crate::value::FlexValue;

/// Label of a single group, if it has one.
///
/// Fails when the `content_group_label` item holds anything but a string.
pub fn group_label(group: &[Content]) -> Result<Option<&str>, ContentError> {
    match find_item(group, CONTENT_GROUP_LABEL) {
        None => Ok(None),
        Some((_, item)) => match &item.value {
            FlexValue::String(s) => Ok(Some(s.as_str())),
            other => Err(ContentError::InvalidReservedItem {
                label: CONTENT_GROUP_LABEL,
                expected: "string",
                actual: other.type_name(),
            }),
        },
    }
}

/// Type of a single group, if it declares one.
pub fn group_type(group: &[Content]) -> Result<Option<&AccountName>, ContentError> {
    match find_item(group, CONTENT_GROUP_TYPE) {
        None => Ok(None),
        Some((_, item)) => match &item.value {
            FlexValue::Name(n) => Ok(Some(n)),
            other => Err(ContentError::InvalidReservedItem {
                label: CONTENT_GROUP_TYPE,
                expected: "name",
                actual: other.type_name(),
            }),
        },
    }
}

/// First item in `group` carrying `label`.
pub fn find_item<'a>(group: &'a [Content], label: &str) -> Option<(usize, &'a Content)> {
    group.iter().enumerate().find(|(_, c)| c.label == label)
}

/// Overwrite the value of the first item labeled like `content`, keeping its
/// position, or append `content` when no such item exists.
pub fn insert_or_replace(group: &mut ContentGroup, content: Content) {
    match group.iter_mut().find(|c| c.label == content.label) {
        Some(existing) => existing.value = content.value,
        None => group.push(content),
    }
}

/// Stateless view over a caller-owned set of groups.
#[derive(Debug)]
pub struct ContentWrapper<G> {
    groups: G,
}

impl<G> ContentWrapper<G> {
    pub fn new(groups: G) -> Self {
        Self { groups }
    }

    pub fn into_inner(self) -> G {
        self.groups
    }
}

impl<G: AsRef<[ContentGroup]>> ContentWrapper<G> {
    pub fn groups(&self) -> &[ContentGroup] {
        self.groups.as_ref()
    }

    /// First group whose label equals `label`, with its index.
    pub fn get_group(&self, label: &str) -> Result<Option<(usize, &ContentGroup)>, ContentError> {
        for (index, group) in self.groups().iter().enumerate() {
            if group_label(group)? == Some(label) {
                return Ok(Some((index, group)));
            }
        }
        Ok(None)
    }

    pub fn get_group_or_fail(&self, label: &str) -> Result<(usize, &ContentGroup), ContentError> {
        self.get_group(label)?
            .ok_or_else(|| ContentError::GroupNotFound {
                group: label.to_string(),
            })
    }

    /// Every group whose `content_group_type` equals `group_type`.
    pub fn get_groups_of_type(
        &self,
        group_type_name: &str,
    ) -> Result<Vec<&ContentGroup>, ContentError> {
        let mut found = Vec::new();
        for group in self.groups() {
            if group_type(group)?.map(AccountName::as_str) == Some(group_type_name) {
                found.push(group);
            }
        }
        Ok(found)
    }

    /// Item `content_label` inside the group labeled `group_label`.
    ///
    /// A missing group and a missing item both yield `None`.
    pub fn get_content(
        &self,
        group_label: &str,
        content_label: &str,
    ) -> Result<Option<(usize, &Content)>, ContentError> {
        Ok(self
            .get_group(group_label)?
            .and_then(|(_, group)| find_item(group, content_label)))
    }

    pub fn get_content_or_fail(
        &self,
        group_label: &str,
        content_label: &str,
    ) -> Result<&Content, ContentError> {
        let (_, group) = self.get_group_or_fail(group_label)?;
        find_item(group, content_label)
            .map(|(_, c)| c)
            .ok_or_else(|| ContentError::ContentNotFound {
                group: group_label.to_string(),
                label: content_label.to_string(),
            })
    }

    /// `true` when the group exists and contains the item.
    pub fn exists(&self, group_label: &str, content_label: &str) -> Result<bool, ContentError> {
        Ok(self.get_content(group_label, content_label)?.is_some())
    }

    pub fn get_asset(
        &self,
        group_label: &str,
        content_label: &str,
    ) -> Result<&Asset, ContentError> {
        let c = self.get_content_or_fail(group_label, content_label)?;
        c.value.as_asset().ok_or_else(|| mismatch(c, "asset"))
    }

    pub fn get_string(&self, group_label: &str, content_label: &str) -> Result<&str, ContentError> {
        let c = self.get_content_or_fail(group_label, content_label)?;
        c.value.as_str().ok_or_else(|| mismatch(c, "string"))
    }

    pub fn get_name(
        &self,
        group_label: &str,
        content_label: &str,
    ) -> Result<&AccountName, ContentError> {
        let c = self.get_content_or_fail(group_label, content_label)?;
        c.value.as_name().ok_or_else(|| mismatch(c, "name"))
    }

    pub fn get_int(&self, group_label: &str, content_label: &str) -> Result<i64, ContentError> {
        let c = self.get_content_or_fail(group_label, content_label)?;
        c.value.as_int().ok_or_else(|| mismatch(c, "int64"))
    }

    pub fn get_checksum(
        &self,
        group_label: &str,
        content_label: &str,
    ) -> Result<&Checksum256, ContentError> {
        let c = self.get_content_or_fail(group_label, content_label)?;
        c.value.as_checksum().ok_or_else(|| mismatch(c, "checksum256"))
    }

    pub fn get_time(
        &self,
        group_label: &str,
        content_label: &str,
    ) -> Result<Timestamp, ContentError> {
        let c = self.get_content_or_fail(group_label, content_label)?;
        c.value.as_time().ok_or_else(|| mismatch(c, "time_point"))
    }
}

impl<G: AsRef<[ContentGroup]> + AsMut<ContentGroups>> ContentWrapper<G> {
    fn groups_mut(&mut self) -> &mut ContentGroups {
        self.groups.as_mut()
    }

    fn check_index(&self, index: usize) -> Result<(), ContentError> {
        let len = self.groups().len();
        if index >= len {
            return Err(ContentError::GroupIndexOutOfRange { index, len });
        }
        Ok(())
    }

    /// Insert `content` into the group at `group_index`, replacing the value
    /// of an existing item with the same label in place.
    pub fn insert_or_replace(
        &mut self,
        group_index: usize,
        content: Content,
    ) -> Result<(), ContentError> {
        self.check_index(group_index)?;
        insert_or_replace(&mut self.groups_mut()[group_index], content);
        Ok(())
    }

    /// Append a group, returning its index.
    pub fn push_group(&mut self, group: ContentGroup) -> usize {
        let groups = self.groups_mut();
        groups.push(group);
        groups.len() - 1
    }

    /// Remove item `content_label` from the group at `group_index`.
    pub fn remove_content(
        &mut self,
        group_index: usize,
        content_label: &str,
    ) -> Result<Content, ContentError> {
        self.check_index(group_index)?;
        let group = &mut self.groups_mut()[group_index];
        let position = find_item(group, content_label).map(|(i, _)| i);
        match position {
            Some(i) => Ok(group.remove(i)),
            None => {
                let group = group_label(group)?.unwrap_or_default().to_string();
                Err(ContentError::ContentNotFound {
                    group,
                    label: content_label.to_string(),
                })
            }
        }
    }

    /// Remove item `content_label` from the group labeled `group_label`.
    pub fn remove_content_from(
        &mut self,
        group_label: &str,
        content_label: &str,
    ) -> Result<Content, ContentError> {
        let (index, _) = self.get_group_or_fail(group_label)?;
        self.remove_content(index, content_label)
    }

    /// Remove the first group labeled `label`.
    pub fn remove_group(&mut self, label: &str) -> Result<ContentGroup, ContentError> {
        let (index, _) = self.get_group_or_fail(label)?;
        Ok(self.groups_mut().remove(index))
    }

    pub fn remove_group_at(&mut self, index: usize) -> Result<ContentGroup, ContentError> {
        self.check_index(index)?;
        Ok(self.groups_mut().remove(index))
    }
}

fn mismatch(content: &Content, expected: &'static str) -> ContentError {
    ContentError::TypeMismatch {
        label: content.label.clone(),
        expected,
        actual: content.value.type_name(),
    }
}
