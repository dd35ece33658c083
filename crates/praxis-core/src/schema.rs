//! Validated Tenant Schema Identifiers
//!
//! This module provides [`SchemaName`], the value object for a tenant's
//! PostgreSQL schema name. Every later stage of the platform interpolates
//! this value directly into DDL/DML as a quoted identifier, so validation
//! here is the sole injection barrier: a `SchemaName` can only be obtained
//! through [`SchemaName::parse`], never from unvalidated input.
//!
//! # Example
//!
//! ```
//! use praxis_core::{SchemaName, SchemaNameError};
//!
//! let schema = SchemaName::parse("acme_clinic").unwrap();
//! assert_eq!(schema.as_str(), "acme_clinic");
//! assert_eq!(schema.quoted(), "\"acme_clinic\"");
//!
//! // Hyphens and other punctuation are rejected, not repaired
//! assert_eq!(
//!     SchemaName::parse("Acme-Clinic"),
//!     Err(SchemaNameError::InvalidFormat)
//! );
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Maximum byte length of a schema name.
///
/// PostgreSQL truncates identifiers longer than 63 bytes; truncation would
/// silently map two distinct tenant names onto one schema, so over-length
/// names are rejected outright.
pub const MAX_SCHEMA_NAME_LEN: usize = 63;

/// System namespaces that can never be claimed as tenant schemas.
pub const RESERVED_SCHEMA_NAMES: &[&str] =
    &["public", "information_schema", "pg_catalog", "pg_toast"];

/// Reasons a raw string was refused as a tenant schema name.
///
/// These are client-caused, definitive rejections (HTTP 400 equivalent);
/// they are never retried or recovered from. [`SchemaNameError::reason`]
/// yields the short transport-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchemaNameError {
    /// Normalization (trim + lowercase) left nothing.
    #[error("tenant schema name is empty")]
    Empty,

    /// The normalized name exceeds [`MAX_SCHEMA_NAME_LEN`] bytes.
    #[error("tenant schema name is too long ({len} bytes, limit {MAX_SCHEMA_NAME_LEN})")]
    TooLong {
        /// Byte length of the normalized input.
        len: usize,
    },

    /// The name contains characters outside `[a-z0-9_]` or does not start
    /// with a letter or underscore.
    #[error("tenant schema name has an invalid format")]
    InvalidFormat,

    /// The name collides with a system namespace.
    #[error("tenant schema name is reserved")]
    Reserved,
}

impl SchemaNameError {
    /// Short textual reason suitable for an HTTP 400 response body.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            SchemaNameError::Empty => "empty",
            SchemaNameError::TooLong { .. } => "too long",
            SchemaNameError::InvalidFormat => "invalid format",
            SchemaNameError::Reserved => "reserved",
        }
    }
}

/// A validated tenant schema name.
///
/// Invariants (enforced by [`SchemaName::parse`], the only constructor):
///
/// - lowercase, matching `^[a-z_][a-z0-9_]*$`
/// - at most [`MAX_SCHEMA_NAME_LEN`] bytes
/// - not one of [`RESERVED_SCHEMA_NAMES`]
///
/// Because the character set excludes quotes and whitespace, the value is
/// safe to splice into SQL as a double-quoted identifier via
/// [`SchemaName::quoted`] - the one sanctioned interpolation point for
/// dynamic schema-qualified DDL.
///
/// # Example
///
/// ```
/// use praxis_core::SchemaName;
/// use std::collections::HashMap;
///
/// let schema: SchemaName = "acme_clinic".parse().unwrap();
///
/// // Usable as a map key
/// let mut pools: HashMap<SchemaName, u32> = HashMap::new();
/// pools.insert(schema.clone(), 1);
/// assert_eq!(pools.get(&schema), Some(&1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SchemaName(String);

impl SchemaName {
    /// Validate a raw string into a `SchemaName`.
    ///
    /// The input is trimmed and lowercased before the checks run, so
    /// `" Acme_Clinic "` validates to `acme_clinic`. Pure and
    /// deterministic; safe to call redundantly.
    ///
    /// # Errors
    ///
    /// Returns the matching [`SchemaNameError`] when the normalized input
    /// is empty, over-length, malformed, or a reserved namespace.
    pub fn parse(raw: &str) -> Result<Self, SchemaNameError> {
        let normalized = raw.trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(SchemaNameError::Empty);
        }
        if normalized.len() > MAX_SCHEMA_NAME_LEN {
            return Err(SchemaNameError::TooLong {
                len: normalized.len(),
            });
        }

        let mut chars = normalized.chars();
        // First char: letter or underscore. Rest: letter, digit, underscore.
        let leading_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
        if !leading_ok || !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(SchemaNameError::InvalidFormat);
        }

        if RESERVED_SCHEMA_NAMES.contains(&normalized.as_str()) {
            return Err(SchemaNameError::Reserved);
        }

        Ok(Self(normalized))
    }

    /// The schema name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The double-quoted identifier form for interpolation into DDL.
    ///
    /// All schema-qualified SQL built anywhere in the platform must obtain
    /// the schema portion through this method.
    #[must_use]
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }

    /// Consume the value, returning the owned string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for SchemaName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SchemaName {
    type Err = SchemaNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for SchemaName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Deserialization routes through `parse` so a `SchemaName` arriving in a
// config file or JWT claim is held to the same invariants as header input.
impl<'de> Deserialize<'de> for SchemaName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        SchemaName::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod accepts {
        use super::*;

        #[test]
        fn test_simple_name() {
            let schema = SchemaName::parse("acme_clinic").unwrap();
            assert_eq!(schema.as_str(), "acme_clinic");
        }

        #[test]
        fn test_trims_and_lowercases() {
            let schema = SchemaName::parse("  Acme_Clinic  ").unwrap();
            assert_eq!(schema.as_str(), "acme_clinic");
        }

        #[test]
        fn test_leading_underscore() {
            assert!(SchemaName::parse("_staging").is_ok());
        }

        #[test]
        fn test_digits_after_first_char() {
            assert!(SchemaName::parse("clinic42").is_ok());
        }

        #[test]
        fn test_exactly_max_length() {
            let name = "a".repeat(MAX_SCHEMA_NAME_LEN);
            assert!(SchemaName::parse(&name).is_ok());
        }

        #[test]
        fn test_reserved_prefix_is_not_reserved() {
            // Only exact matches are reserved
            assert!(SchemaName::parse("public_clinic").is_ok());
        }
    }

    mod rejects {
        use super::*;

        #[test]
        fn test_empty_string() {
            assert_eq!(SchemaName::parse(""), Err(SchemaNameError::Empty));
        }

        #[test]
        fn test_whitespace_only() {
            assert_eq!(SchemaName::parse("   "), Err(SchemaNameError::Empty));
        }

        #[test]
        fn test_hyphen() {
            assert_eq!(
                SchemaName::parse("Acme-Clinic"),
                Err(SchemaNameError::InvalidFormat)
            );
        }

        #[test]
        fn test_leading_digit() {
            assert_eq!(
                SchemaName::parse("1clinic"),
                Err(SchemaNameError::InvalidFormat)
            );
        }

        #[test]
        fn test_interior_whitespace() {
            assert_eq!(
                SchemaName::parse("acme clinic"),
                Err(SchemaNameError::InvalidFormat)
            );
        }

        #[test]
        fn test_sql_injection_attempt() {
            assert_eq!(
                SchemaName::parse("x\"; drop table tenants;--"),
                Err(SchemaNameError::InvalidFormat)
            );
        }

        #[test]
        fn test_non_ascii() {
            assert_eq!(
                SchemaName::parse("clinique_é"),
                Err(SchemaNameError::InvalidFormat)
            );
        }

        #[test]
        fn test_too_long() {
            let name = "a".repeat(MAX_SCHEMA_NAME_LEN + 1);
            assert_eq!(
                SchemaName::parse(&name),
                Err(SchemaNameError::TooLong {
                    len: MAX_SCHEMA_NAME_LEN + 1
                })
            );
        }

        #[test]
        fn test_all_reserved_names() {
            for name in RESERVED_SCHEMA_NAMES {
                assert_eq!(
                    SchemaName::parse(name),
                    Err(SchemaNameError::Reserved),
                    "{name} should be reserved"
                );
            }
        }

        #[test]
        fn test_reserved_check_applies_after_normalization() {
            assert_eq!(
                SchemaName::parse("  PUBLIC  "),
                Err(SchemaNameError::Reserved)
            );
        }
    }

    mod quoting {
        use super::*;

        #[test]
        fn test_quoted_wraps_in_double_quotes() {
            let schema = SchemaName::parse("acme_clinic").unwrap();
            assert_eq!(schema.quoted(), "\"acme_clinic\"");
        }

        #[test]
        fn test_charset_excludes_quote_characters() {
            // The invariant `quoted` relies on: no input containing a quote
            // survives validation.
            assert!(SchemaName::parse("ac\"me").is_err());
            assert!(SchemaName::parse("ac'me").is_err());
        }
    }

    mod reasons {
        use super::*;

        #[test]
        fn test_transport_facing_reasons() {
            assert_eq!(SchemaNameError::Empty.reason(), "empty");
            assert_eq!(SchemaNameError::TooLong { len: 64 }.reason(), "too long");
            assert_eq!(SchemaNameError::InvalidFormat.reason(), "invalid format");
            assert_eq!(SchemaNameError::Reserved.reason(), "reserved");
        }

        #[test]
        fn test_display_mentions_limit() {
            let err = SchemaNameError::TooLong { len: 80 };
            let display = err.to_string();
            assert!(display.contains("80"));
            assert!(display.contains("63"));
        }
    }

    mod serde_tests {
        use super::*;

        #[test]
        fn test_serializes_as_plain_string() {
            let schema = SchemaName::parse("acme_clinic").unwrap();
            let json = serde_json::to_string(&schema).unwrap();
            assert_eq!(json, "\"acme_clinic\"");
        }

        #[test]
        fn test_roundtrip() {
            let original = SchemaName::parse("acme_clinic").unwrap();
            let json = serde_json::to_string(&original).unwrap();
            let deserialized: SchemaName = serde_json::from_str(&json).unwrap();
            assert_eq!(original, deserialized);
        }

        #[test]
        fn test_deserialize_validates() {
            let result: Result<SchemaName, _> = serde_json::from_str("\"Acme-Clinic\"");
            assert!(result.is_err());
        }

        #[test]
        fn test_deserialize_normalizes() {
            let schema: SchemaName = serde_json::from_str("\" ACME \"").unwrap();
            assert_eq!(schema.as_str(), "acme");
        }
    }

    mod from_str_tests {
        use super::*;

        #[test]
        fn test_parse_via_from_str() {
            let schema: SchemaName = "acme_clinic".parse().unwrap();
            assert_eq!(schema.to_string(), "acme_clinic");
        }

        #[test]
        fn test_from_str_propagates_error() {
            let result: Result<SchemaName, _> = "pg_catalog".parse();
            assert_eq!(result, Err(SchemaNameError::Reserved));
        }
    }
}
