//! Tariff constants and categorical rate tables.
//!
//! Lookups are fail-open: a key missing from a table resolves to the neutral
//! multiplier [`NEUTRAL_MULTIPLIER`] and is flagged as unrecognised so callers
//! can surface a warning without changing the price.

/// Currency units charged per kilometre of distance.
pub const RATE_PER_KM: f64 = 5.0;

/// Weight carried without surcharge, in kilograms.
pub const FREE_WEIGHT_ALLOWANCE: f64 = 5.0;

/// Currency units charged per kilogram above the free allowance.
pub const SURCHARGE_PER_KG: f64 = 10.0;

/// Multiplier applied when a categorical input is not in its table.
pub const NEUTRAL_MULTIPLIER: f64 = 1.0;

/// Material multipliers.
pub const MATERIAL_RATES: RateTable = RateTable::new(
    "material type",
    &[
        ("standard", 1.0),
        ("fragile", 1.5),
        ("perishable", 1.4),
        ("heavy", 1.3),
    ],
);

/// Urgency multipliers.
pub const URGENCY_RATES: RateTable = RateTable::new(
    "urgency",
    &[("standard", 1.0), ("express", 1.5), ("same-day", 2.0)],
);

/// Location multipliers.
pub const LOCATION_RATES: RateTable =
    RateTable::new("location type", &[("urban", 1.0), ("rural", 1.2)]);

/// Outcome of a rate table lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLookup {
    /// Resolved multiplier
    pub multiplier: f64,
    /// Whether the key was present in the table
    pub recognised: bool,
}

/// Fixed mapping from a categorical input to a multiplier.
#[derive(Debug, Clone, Copy)]
pub struct RateTable {
    label: &'static str,
    entries: &'static [(&'static str, f64)],
}

impl RateTable {
    /// Build a table from static entries.
    pub const fn new(label: &'static str, entries: &'static [(&'static str, f64)]) -> Self {
        Self { label, entries }
    }

    /// Human-readable name of the input this table prices.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Resolve `key`, defaulting to the neutral multiplier on a miss.
    ///
    /// Matching is exact; `"Fragile"` is not `"fragile"`.
    ///
    /// # Examples
    /// ```
    /// use delivery_core::rates::URGENCY_RATES;
    ///
    /// assert_eq!(URGENCY_RATES.lookup("same-day").multiplier, 2.0);
    ///
    /// let miss = URGENCY_RATES.lookup("overnight");
    /// assert_eq!(miss.multiplier, 1.0);
    /// assert!(!miss.recognised);
    /// ```
    pub fn lookup(&self, key: &str) -> RateLookup {
        match self.entries.iter().find(|(name, _)| *name == key) {
            Some(&(_, multiplier)) => RateLookup {
                multiplier,
                recognised: true,
            },
            None => RateLookup {
                multiplier: NEUTRAL_MULTIPLIER,
                recognised: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_table() {
        assert_eq!(MATERIAL_RATES.lookup("standard").multiplier, 1.0);
        assert_eq!(MATERIAL_RATES.lookup("fragile").multiplier, 1.5);
        assert_eq!(MATERIAL_RATES.lookup("perishable").multiplier, 1.4);
        assert_eq!(MATERIAL_RATES.lookup("heavy").multiplier, 1.3);
    }

    #[test]
    fn test_urgency_table() {
        assert_eq!(URGENCY_RATES.lookup("standard").multiplier, 1.0);
        assert_eq!(URGENCY_RATES.lookup("express").multiplier, 1.5);
        assert_eq!(URGENCY_RATES.lookup("same-day").multiplier, 2.0);
    }

    #[test]
    fn test_location_table() {
        assert_eq!(LOCATION_RATES.lookup("urban").multiplier, 1.0);
        assert_eq!(LOCATION_RATES.lookup("rural").multiplier, 1.2);
    }

    #[test]
    fn test_miss_is_neutral_and_flagged() {
        for table in [MATERIAL_RATES, URGENCY_RATES, LOCATION_RATES] {
            let miss = table.lookup("unobtainium");
            assert_eq!(miss.multiplier, NEUTRAL_MULTIPLIER);
            assert!(!miss.recognised);
        }
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert!(!MATERIAL_RATES.lookup("Fragile").recognised);
    }

    #[test]
    fn test_labels() {
        assert_eq!(MATERIAL_RATES.label(), "material type");
        assert_eq!(URGENCY_RATES.label(), "urgency");
        assert_eq!(LOCATION_RATES.label(), "location type");
    }
}
