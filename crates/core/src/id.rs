// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes for items, transactions and lock holders.

/// Encode a number in lowercase base36 (0-9a-z).
///
/// Used for the timestamp part of generated ids so they sort roughly by
/// creation time and stay short enough for `SmolStr` inline storage.
pub fn base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::with_capacity(13);
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Alphabet for the random suffix. Restricted to characters that are safe in
/// file names on every platform, since ids double as storage keys.
const SUFFIX_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h',
    'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Random lowercase alphanumeric suffix of length `n`.
pub fn random_suffix(n: usize) -> String {
    nanoid::nanoid!(n, &SUFFIX_ALPHABET)
}

/// Define a newtype ID wrapper around `SmolStr` with a type prefix.
///
/// Generated ids have the form `{prefix}{base36 epoch ms}-{random}`: the
/// timestamp keeps them roughly time-ordered, the suffix makes collisions
/// between processes vanishingly unlikely (callers still treat a collision
/// as a hard error).
///
/// ```ignore
/// define_id! {
///     /// Doc comment for the ID type.
///     pub struct ItemId("itm-");
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub smol_str::SmolStr);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generate a new id stamped with `epoch_ms`
            pub fn generate(epoch_ms: u64) -> Self {
                Self(smol_str::SmolStr::new(format!(
                    "{}{}-{}",
                    Self::PREFIX,
                    $crate::id::base36(epoch_ms),
                    $crate::id::random_suffix(10)
                )))
            }

            /// Create ID from existing string (for parsing/deserialization)
            pub fn from_string(id: impl Into<smol_str::SmolStr>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from_string(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from_string(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// Unique, immutable identifier of a queue item.
    pub struct ItemId("itm-");
}

define_id! {
    /// Identifier of one write-ahead transaction record.
    pub struct TransactionId("txn-");
}

define_id! {
    /// Identifies whoever holds an item lock (one per acquiring call).
    pub struct HolderId("hld-");
}

impl ItemId {
    /// Whether the id can be used as a file name without escaping.
    ///
    /// Ids arrive from the command line and from index files, so they are
    /// checked before being joined onto a partition path.
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self.0.len() <= 128
            && self.0.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
