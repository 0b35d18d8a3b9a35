//! Foundation types for docgraph.
//!
//! A document is a list of content groups; a group is a list of labeled,
//! typed values. This crate defines those building blocks and the
//! [`ContentWrapper`] algorithms that look them up and edit them. Every other
//! docgraph crate depends on `docgraph-types`.
//!
//! # Key Types
//!
//! - [`FlexValue`]: Tagged union of the supported value kinds
//! - [`Content`]: A labeled value; [`ContentGroup`] / [`ContentGroups`] hold them
//! - [`ContentWrapper`]: Lookup, typed extraction, and in-place editing
//! - [`Checksum256`]: 256-bit digest, used as document fingerprint
//! - [`AccountName`]: Ledger account identifier (creator, certifier, scope)
//! - [`Asset`]: Fixed-point token quantity
//! - [`Timestamp`]: Microsecond-resolution point in time

pub mod account;
pub mod asset;
pub mod checksum;
pub mod content;
pub mod error;
pub mod timestamp;
pub mod value;
pub mod wrapper;

pub use account::AccountName;
pub use asset::{Asset, Symbol};
pub use checksum::Checksum256;
pub use content::{
    labeled_group, rollup_content, rollup_group, Content, ContentGroup, ContentGroups,
    CONTENT_GROUP_LABEL, CONTENT_GROUP_TYPE, DELETE_GROUP, SKIP_FROM_MERGE,
};
pub use error::{ContentError, TypeError};
pub use timestamp::Timestamp;
pub use value::FlexValue;
pub use wrapper::ContentWrapper;
