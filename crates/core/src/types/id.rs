//! Newtype IDs for type-safe entity references.
//!
//! The catalog API identifies products and orders with opaque string ids.
//! Use the `define_id!` macro to create wrappers that prevent accidentally
//! mixing ids from different entity types.

/// Errors that can occur when parsing an entity id.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input is empty or whitespace only.
    #[error("id cannot be empty")]
    Empty,
    /// The input contains the `|` separator used by progress keys.
    #[error("id cannot contain '|'")]
    ReservedSeparator,
}

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` that validate through [`IdError`]
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - `parse()`, `as_str()` and `Display`
///
/// # Example
///
/// ```rust
/// # use atelier_core::define_id;
/// define_id!(SkuId);
///
/// let sku = SkuId::parse("abc123").unwrap();
/// assert_eq!(sku.as_str(), "abc123");
/// assert!(SkuId::parse("  ").is_err());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an id, trimming surrounding whitespace.
            ///
            /// # Errors
            ///
            /// Returns an error if the id is empty or contains `|`.
            pub fn parse(id: impl AsRef<str>) -> ::core::result::Result<Self, $crate::IdError> {
                let id = id.as_ref().trim();
                if id.is_empty() {
                    return Err($crate::IdError::Empty);
                }
                if id.contains('|') {
                    return Err($crate::IdError::ReservedSeparator);
                }
                Ok(Self(id.to_owned()))
            }

            /// Returns the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::convert::TryFrom<String> for $name {
            type Error = $crate::IdError;

            fn try_from(id: String) -> ::core::result::Result<Self, Self::Error> {
                Self::parse(id)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

define_id!(ProductId);
define_id!(OrderId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let id = ProductId::parse("  64f1c2 ").unwrap();
        assert_eq!(id.as_str(), "64f1c2");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(ProductId::parse(""), Err(IdError::Empty));
        assert_eq!(OrderId::parse("   "), Err(IdError::Empty));
    }

    #[test]
    fn test_parse_rejects_separator() {
        assert_eq!(
            ProductId::parse("a|b"),
            Err(IdError::ReservedSeparator)
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let id: ProductId = serde_json::from_str("\"p1\"").unwrap();
        assert_eq!(id.to_string(), "p1");
        assert!(serde_json::from_str::<ProductId>("\"\"").is_err());
    }
}
