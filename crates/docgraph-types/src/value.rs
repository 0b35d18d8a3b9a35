use std::fmt;

use serde::{Deserialize, Serialize};

use crate::account::AccountName;
use crate::asset::Asset;
use crate::checksum::Checksum256;
use crate::timestamp::Timestamp;

/// A single typed value held by a [`Content`](crate::Content) item.
///
/// `Empty` is the tombstone: inside a merge delta it means "remove the item
/// with this label". It is a regular value everywhere else.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FlexValue {
    #[default]
    Empty,
    Name(AccountName),
    String(String),
    Asset(Asset),
    Time(Timestamp),
    Int(i64),
    Checksum(Checksum256),
}

impl FlexValue {
    /// Stable tag of the active case, as used in canonical serialization.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Empty => "none",
            Self::Name(_) => "name",
            Self::String(_) => "string",
            Self::Asset(_) => "asset",
            Self::Time(_) => "time_point",
            Self::Int(_) => "int64",
            Self::Checksum(_) => "checksum256",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_name(&self) -> Option<&AccountName> {
        match self {
            Self::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_asset(&self) -> Option<&Asset> {
        match self {
            Self::Asset(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<Timestamp> {
        match self {
            Self::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_checksum(&self) -> Option<&Checksum256> {
        match self {
            Self::Checksum(c) => Some(c),
            _ => None,
        }
    }
}

/// Readable rendering of the payload, without the type tag.
///
/// This is the form fingerprinting wraps as `[<tag>,<rendering>]`.
impl fmt::Display for FlexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Name(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::Asset(a) => write!(f, "{a}"),
            Self::Time(t) => write!(f, "{}", t.secs_since_epoch()),
            Self::Int(i) => write!(f, "{i}"),
            Self::Checksum(c) => write!(f, "{}", c.to_hex()),
        }
    }
}

impl From<AccountName> for FlexValue {
    fn from(v: AccountName) -> Self {
        Self::Name(v)
    }
}

impl From<String> for FlexValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FlexValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Asset> for FlexValue {
    fn from(v: Asset) -> Self {
        Self::Asset(v)
    }
}

impl From<Timestamp> for FlexValue {
    fn from(v: Timestamp) -> Self {
        Self::Time(v)
    }
}

impl From<i64> for FlexValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<Checksum256> for FlexValue {
    fn from(v: Checksum256) -> Self {
        Self::Checksum(v)
    }
}
