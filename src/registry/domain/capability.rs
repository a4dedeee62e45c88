//! Store capability values resolved at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the backing store answers native full-text queries.
///
/// The value starts as `Unknown` and is resolved at most once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSearchSupport {
    /// No probe has completed yet.
    Unknown,
    /// The probe query succeeded.
    Supported,
    /// The probe query failed; substring matching is used instead.
    Unsupported,
}

impl TextSearchSupport {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Supported => "supported",
            Self::Unsupported => "unsupported",
        }
    }

    /// Returns whether native text search may be used.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        matches!(self, Self::Supported)
    }
}

impl From<bool> for TextSearchSupport {
    fn from(supported: bool) -> Self {
        if supported {
            Self::Supported
        } else {
            Self::Unsupported
        }
    }
}

impl fmt::Display for TextSearchSupport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
