//! Catalog configuration loading from catalog.toml
//!
//! The catalog file lists the reference data (destinations, agencies and their
//! packages) that [`crate::core::seed::seed_catalog`] writes into the database
//! on startup. Monetary values are given in cents.

use crate::core::catalog::{ItineraryDay, ScheduledExpense};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire catalog.toml file
#[derive(Debug, Default, Deserialize)]
pub struct CatalogConfig {
    /// Destinations to seed
    #[serde(default)]
    pub destinations: Vec<DestinationConfig>,
    /// Agencies to seed, each with its packages
    #[serde(default)]
    pub agencies: Vec<AgencyConfig>,
}

/// Configuration for a single destination
#[derive(Debug, Deserialize, Clone)]
pub struct DestinationConfig {
    /// Name of the destination
    pub name: String,
    /// Country
    pub country: String,
    /// Category (e.g., "playa")
    pub category: String,
    /// Rating 0-5
    #[serde(default)]
    pub rating: f64,
    /// Card text
    #[serde(default)]
    pub description: String,
    /// Budget hint
    #[serde(default)]
    pub budget: String,
    /// Recommended stay
    #[serde(default)]
    pub duration: String,
    /// Best season to visit
    #[serde(default)]
    pub best_season: String,
}

/// Configuration for a single agency
#[derive(Debug, Deserialize, Clone)]
pub struct AgencyConfig {
    /// Commercial name
    pub name: String,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Rating 0-5
    #[serde(default)]
    pub rating: f64,
    /// Packages offered by this agency
    #[serde(default)]
    pub packages: Vec<PackageConfig>,
}

/// Configuration for a single package; destinations are referenced by name
#[derive(Debug, Deserialize, Clone)]
pub struct PackageConfig {
    /// Commercial name
    pub name: String,
    /// Per-person price in cents
    pub price_cents: i64,
    /// Duration text, leading number is the day count
    pub duration: String,
    /// Destination names, in visiting order
    #[serde(default)]
    pub destinations: Vec<String>,
    /// Included items
    #[serde(default)]
    pub included: Vec<String>,
    /// Day-by-day plan
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
    /// Scheduled per-person expenses
    #[serde(default)]
    pub expenses: Vec<ScheduledExpense>,
}

/// Loads the catalog from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read catalog file {}: {e}", path.as_ref().display()),
    })?;
    parse_catalog(&contents)
}

/// Parses catalog TOML that is already in memory.
pub fn parse_catalog(contents: &str) -> Result<CatalogConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse catalog: {e}"),
    })
}

/// Path of the catalog file, from `CATALOG_PATH` or `./catalog.toml`.
#[must_use]
pub fn catalog_path() -> String {
    std::env::var("CATALOG_PATH").unwrap_or_else(|_| "catalog.toml".to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::expense::ExpenseCategory;

    #[test]
    fn test_parse_catalog_config() {
        let toml_str = r#"
            [[destinations]]
            name = "Kyoto"
            country = "Japón"
            category = "cultura"
            rating = 4.8

            [[destinations]]
            name = "Osaka"
            country = "Japón"
            category = "ciudad"

            [[agencies]]
            name = "Viajes Sakura"
            email = "hola@sakura.example"

            [[agencies.packages]]
            name = "Japón Esencial"
            price_cents = 189900
            duration = "5 días / 4 noches"
            destinations = ["Kyoto", "Osaka"]
            included = ["Vuelos", "Hotel"]

            [[agencies.packages.itinerary]]
            day = 1
            title = "Llegada a Kyoto"

            [[agencies.packages.expenses]]
            description = "Vuelo"
            amount_cents = 90000
            category = "transporte"
        "#;

        let config = parse_catalog(toml_str).unwrap();
        assert_eq!(config.destinations.len(), 2);
        assert_eq!(config.destinations[0].rating, 4.8);
        assert_eq!(config.destinations[1].rating, 0.0);

        let package = &config.agencies[0].packages[0];
        assert_eq!(package.destinations, vec!["Kyoto", "Osaka"]);
        assert_eq!(package.itinerary[0].title, "Llegada a Kyoto");
        assert_eq!(package.expenses[0].category, ExpenseCategory::Transport);
    }

    #[test]
    fn test_parse_catalog_rejects_unknown_category() {
        let toml_str = r#"
            [[agencies]]
            name = "X"
            [[agencies.packages]]
            name = "Y"
            price_cents = 100
            duration = "2 días"
            [[agencies.packages.expenses]]
            description = "Z"
            amount_cents = 10
            category = "gadgets"
        "#;

        assert!(matches!(
            parse_catalog(toml_str),
            Err(Error::Config { message: _ })
        ));
    }

    #[test]
    fn test_load_catalog_missing_file() {
        let result = load_catalog("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { message: _ })));
    }
}
