//! Search configuration for the trip search engine.

use crate::location::Accuracy;

use super::types::{SearchFilters, SortBy, SortOrder};

/// Configuration parameters for trip search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Accuracy requested for the fix that anchors each search.
    pub accuracy: Accuracy,

    /// Filters a new session starts with.
    pub filters: SearchFilters,

    /// Initial sort key.
    pub sort_by: SortBy,

    /// Initial sort direction.
    pub sort_order: SortOrder,
}

impl SearchConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(accuracy: Accuracy, filters: SearchFilters, sort_by: SortBy, sort_order: SortOrder) -> Self {
        Self {
            accuracy,
            filters,
            sort_by,
            sort_order,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::Balanced,
            filters: SearchFilters::default(),
            sort_by: SortBy::Price,
            sort_order: SortOrder::Asc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.accuracy, Accuracy::Balanced);
        assert_eq!(config.filters.seats, 1);
        assert_eq!(config.filters.max_distance_km, 50.0);
        assert_eq!(config.sort_by, SortBy::Price);
        assert_eq!(config.sort_order, SortOrder::Asc);
    }
}
