//! Macro for implementing Display and FromStr for wire-code enums
//!
//! Grouper reports outcomes as upper-case codes (`SUCCESS`, `NOT_FOUND`).
//! This macro gives such enums a single canonical string form and
//! case-insensitive parsing.
//!
//! # Example
//!
//! ```rust
//! use grouper_domain::impl_wire_code_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Scope {
//!     OneLevel,
//!     AllInSubtree,
//! }
//!
//! impl_wire_code_conversions!(Scope {
//!     OneLevel => "ONE_LEVEL",
//!     AllInSubtree => "ALL_IN_SUBTREE",
//! });
//!
//! assert_eq!(Scope::AllInSubtree.to_string(), "ALL_IN_SUBTREE");
//! assert_eq!("one_level".parse::<Scope>().unwrap(), Scope::OneLevel);
//! ```

/// Implements Display and FromStr traits for wire-code enums
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their canonical code
#[macro_export]
macro_rules! impl_wire_code_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($str) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}
