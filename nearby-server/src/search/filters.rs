//! User-selected category filters.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::{SchoolLevel, SchoolSector};
use crate::ranking::CategoryFilter;

/// The user's persisted filter toggles.
///
/// Only schools are filterable; stations and supermarkets always rank
/// every candidate. Empty sets mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterPreferences {
    #[serde(default)]
    pub school_sectors: HashSet<SchoolSector>,
    #[serde(default)]
    pub school_levels: HashSet<SchoolLevel>,
}

impl FilterPreferences {
    /// The ranking filter for the schools category.
    pub fn school_filter(&self) -> CategoryFilter {
        CategoryFilter::School {
            sectors: self.school_sectors.clone(),
            levels: self.school_levels.clone(),
        }
    }
}
