//! Core type definitions for catalog queries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordering applied to a catalog listing.
///
/// Every order is total: ties on the sort key fall back to insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Newest recording date first.
    #[default]
    DateDesc,
    /// Oldest recording date first.
    DateAsc,
    /// Title, A to Z.
    TitleAsc,
    /// Title, Z to A.
    TitleDesc,
}

impl SortOrder {
    /// All sort orders, in declaration order.
    pub const ALL: [SortOrder; 4] = [
        SortOrder::DateDesc,
        SortOrder::DateAsc,
        SortOrder::TitleAsc,
        SortOrder::TitleDesc,
    ];
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DateDesc => write!(f, "date_desc"),
            Self::DateAsc => write!(f, "date_asc"),
            Self::TitleAsc => write!(f, "title_asc"),
            Self::TitleDesc => write!(f, "title_desc"),
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date_desc" => Ok(Self::DateDesc),
            "date_asc" => Ok(Self::DateAsc),
            "title_asc" => Ok(Self::TitleAsc),
            "title_desc" => Ok(Self::TitleDesc),
            _ => Err(format!("Invalid sort order: {}", s)),
        }
    }
}
