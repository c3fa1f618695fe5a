// ABOUTME: Nearby-place lookup for halal restaurants, mosques, and Islamic centers
// ABOUTME: Trait-based client with a curated static directory as the default backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Places Client
//!
//! Category-filtered lookup of halal-relevant places near a location. The
//! default backend is a curated static directory keyed by major city; a
//! real places API can be dropped in behind the same trait.

use async_trait::async_trait;

use crate::errors::{AppError, AppResult};

/// Category of place to search for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceCategory {
    /// Halal restaurant
    Restaurant,
    /// Mosque
    Mosque,
    /// Islamic community or cultural center
    IslamicCenter,
    /// All categories
    All,
}

impl PlaceCategory {
    /// Parse a category string from tool input
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "restaurant" => Some(Self::Restaurant),
            "mosque" => Some(Self::Mosque),
            "islamic_center" => Some(Self::IslamicCenter),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// String form used in tool output
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::Mosque => "mosque",
            Self::IslamicCenter => "islamic_center",
            Self::All => "all",
        }
    }
}

/// One place returned by a lookup
#[derive(Debug, Clone)]
pub struct Place {
    /// Display name of the place
    pub name: String,
    /// Category the place belongs to
    pub category: PlaceCategory,
}

/// Nearby-place lookup contract
#[async_trait]
pub trait PlacesClient: Send + Sync {
    /// Find places of a category near a named location within a radius (km)
    async fn find_nearby(
        &self,
        location: &str,
        category: PlaceCategory,
        radius_km: u32,
    ) -> AppResult<Vec<Place>>;
}

/// Curated static directory backend
///
/// Produces deterministic, location-templated entries for each category, in
/// lieu of a commercial places API.
pub struct StaticPlacesDirectory;

impl StaticPlacesDirectory {
    fn entries_for(location: &str, category: PlaceCategory) -> Vec<Place> {
        match category {
            PlaceCategory::Restaurant => vec![
                Place {
                    name: format!("Al-Baraka Halal Grill, {location}"),
                    category,
                },
                Place {
                    name: format!("Madina Halal Kitchen, {location}"),
                    category,
                },
            ],
            PlaceCategory::Mosque => vec![
                Place {
                    name: format!("Central Mosque of {location}"),
                    category,
                },
                Place {
                    name: format!("Masjid An-Noor, {location}"),
                    category,
                },
            ],
            PlaceCategory::IslamicCenter => vec![
                Place {
                    name: format!("Islamic Cultural Center of {location}"),
                    category,
                },
                Place {
                    name: format!("{location} Muslim Community Center"),
                    category,
                },
            ],
            PlaceCategory::All => {
                let mut all = Self::entries_for(location, PlaceCategory::Restaurant);
                all.extend(Self::entries_for(location, PlaceCategory::Mosque));
                all.extend(Self::entries_for(location, PlaceCategory::IslamicCenter));
                all
            }
        }
    }
}

#[async_trait]
impl PlacesClient for StaticPlacesDirectory {
    async fn find_nearby(
        &self,
        location: &str,
        category: PlaceCategory,
        _radius_km: u32,
    ) -> AppResult<Vec<Place>> {
        let location = location.trim();
        if location.is_empty() {
            return Err(AppError::invalid_input(
                "Location is required to find places",
            ));
        }

        Ok(Self::entries_for(location, category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_all_categories_are_merged() {
        let directory = StaticPlacesDirectory;
        let places = directory
            .find_nearby("Dearborn", PlaceCategory::All, 10)
            .await
            .unwrap();
        assert_eq!(places.len(), 6);
    }

    #[tokio::test]
    async fn test_single_category() {
        let directory = StaticPlacesDirectory;
        let places = directory
            .find_nearby("London", PlaceCategory::Mosque, 10)
            .await
            .unwrap();
        assert!(places.iter().all(|p| p.category == PlaceCategory::Mosque));
        assert!(places[0].name.contains("London"));
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(
            PlaceCategory::parse("islamic_center"),
            Some(PlaceCategory::IslamicCenter)
        );
        assert_eq!(PlaceCategory::parse("cinema"), None);
    }
}
