//! List query filters.
//!
//! Every entity list can be narrowed by a case-insensitive substring match
//! on one field. An absent or empty query leaves the list unfiltered.

use crate::entity::{Car, Entity};

/// Case-insensitive substring filter on an entity's search field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    needle: Option<String>,
}

impl SearchFilter {
    /// Build a filter from a raw query parameter.
    pub fn new(query: Option<&str>) -> Self {
        Self {
            needle: query
                .filter(|q| !q.is_empty())
                .map(|q| q.to_lowercase()),
        }
    }

    /// A filter that keeps everything.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_none()
    }

    pub fn matches_str(&self, value: &str) -> bool {
        match &self.needle {
            Some(needle) => value.to_lowercase().contains(needle.as_str()),
            None => true,
        }
    }

    pub fn matches<E: Entity>(&self, entity: &E) -> bool {
        self.matches_str(entity.search_value())
    }
}

/// Car list filter: model search plus an optional exact manufacturer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarFilter {
    pub model: SearchFilter,
    pub manufacturer_id: Option<u64>,
}

impl CarFilter {
    pub fn new(model: Option<&str>, manufacturer_id: Option<u64>) -> Self {
        Self {
            model: SearchFilter::new(model),
            manufacturer_id,
        }
    }

    pub fn matches(&self, car: &Car) -> bool {
        self.model.matches(car)
            && self
                .manufacturer_id
                .map_or(true, |id| car.manufacturer_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive() {
        let filter = SearchFilter::new(Some("TeSt"));
        assert!(filter.matches_str("Test Car"));
        assert!(filter.matches_str("my test"));
        assert!(filter.matches_str("TEST"));
        assert!(!filter.matches_str("abc"));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(SearchFilter::new(None).matches_str("anything"));
        assert!(SearchFilter::new(Some("")).matches_str("anything"));
        assert!(SearchFilter::new(Some("")).is_empty());
        assert!(SearchFilter::all().matches_str(""));
    }

    #[test]
    fn test_whitespace_is_part_of_the_needle() {
        let filter = SearchFilter::new(Some(" "));
        assert!(filter.matches_str("Test Car"));
        assert!(!filter.matches_str("Corolla"));
    }

    #[test]
    fn test_car_filter() {
        let car = Car {
            id: 1,
            model: "Corolla".to_string(),
            manufacturer_id: 4,
        };
        assert!(CarFilter::new(Some("cor"), None).matches(&car));
        assert!(CarFilter::new(None, Some(4)).matches(&car));
        assert!(CarFilter::new(Some("roll"), Some(4)).matches(&car));
        assert!(!CarFilter::new(Some("roll"), Some(5)).matches(&car));
        assert!(!CarFilter::new(Some("camry"), None).matches(&car));
    }
}
