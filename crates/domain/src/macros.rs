//! Macro for implementing Display and FromStr for label enums
//!
//! Persisted and logged enums (failure kinds, health states) share one
//! lowercase string form. The macro keeps `Display` and `FromStr` in sync.
//!
//! # Example
//!
//! ```rust
//! use jobscout_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum GateVerdict {
//!     Proceed,
//!     Skip,
//! }
//!
//! impl_domain_status_conversions!(GateVerdict {
//!     Proceed => "proceed",
//!     Skip => "skip",
//! });
//! ```

/// Implements Display and FromStr traits for label enums
///
/// - Display: converts enum variants to their lowercase label
/// - FromStr: parses labels case-insensitively
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
