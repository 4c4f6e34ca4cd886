//! crates/bdg_core/src/ids.rs
//! Item identifiers and artifact IDs.
//! Item ids are opaque (database UUIDs, import row keys); artifact ids have strict shapes.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

const MAX_ID_LEN: usize = 256;
const HEX64_LEN: usize = 64;

/// Lowercase hex (length must be exactly 64).
#[inline]
pub fn is_valid_sha256(s: &str) -> bool {
    s.len() == HEX64_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Identifier of a budget line item.
///
/// Surrounding whitespace is trimmed; the remaining text must be non-empty,
/// at most 256 bytes, and free of control characters.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct ItemId(String);

impl ItemId {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ItemId {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CoreError::EmptyId);
        }
        if s.len() > MAX_ID_LEN {
            return Err(CoreError::IdTooLong);
        }
        if s.chars().any(char::is_control) {
            return Err(CoreError::InvalidIdChar);
        }
        Ok(ItemId(s.to_owned()))
    }
}

impl TryFrom<String> for ItemId {
    type Error = CoreError;
    #[inline]
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<&str> for ItemId {
    type Error = CoreError;
    #[inline]
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemId> for String {
    #[inline]
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl AsRef<str> for ItemId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

macro_rules! prefixed_hex_id {
    ($(#[$m:meta])* $name:ident, $prefix:literal) => {
        $(#[$m])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
        pub struct $name(String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Build from a 64-hex digest.
            pub fn from_digest(hex64: &str) -> Result<Self, CoreError> {
                if is_valid_sha256(hex64) {
                    Ok(Self(format!("{}{}", $prefix, hex64)))
                } else {
                    Err(CoreError::InvalidArtifactId)
                }
            }

            #[inline]
            pub fn as_str(&self) -> &str { &self.0 }

            /// The 64-hex digest part.
            #[inline]
            pub fn digest(&self) -> &str { &self.0[$prefix.len()..] }
        }

        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl FromStr for $name {
            type Err = CoreError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let rest = s.strip_prefix($prefix).ok_or(CoreError::InvalidArtifactId)?;
                Self::from_digest(rest)
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;
            #[inline]
            fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
        }

        impl From<$name> for String {
            #[inline]
            fn from(id: $name) -> Self { id.0 }
        }
    };
}

prefixed_hex_id!(
    /// "CALC:" + 64-hex (lowercase): id of a calculation artifact.
    CalculationId,
    "CALC:"
);

prefixed_hex_id!(
    /// "RUN:" + 64-hex (lowercase): id of a run record.
    RunId,
    "RUN:"
);
