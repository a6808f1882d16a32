//! Record shapes produced by the assessment stages
//!
//! Every record is a flat attribute bag built once and never mutated. The only
//! invariant beyond the field types is the 1-10 range of the scores, which the
//! [`Score`] newtype enforces at construction and at deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FacilityError, Result};

/// A quality score bounded to `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    /// Lowest allowed score
    pub const MIN: u8 = 1;
    /// Highest allowed score
    pub const MAX: u8 = 10;

    /// Create a score, rejecting values outside `1..=10`.
    pub fn new(value: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(FacilityError::Validation(format!(
                "score {} outside {}..={}",
                value,
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// Create a score, clamping `value` into `1..=10`.
    pub const fn saturating(value: u8) -> Self {
        if value < Self::MIN {
            Self(Self::MIN)
        } else if value > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(value)
        }
    }

    /// Get the raw value
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Score {
    type Error = FacilityError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/10", self.0)
    }
}

/// A candidate property for the facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub address: String,
    pub total_bedrooms: u32,
    pub total_bathrooms: u32,
    pub common_areas: u32,
    /// Total asking price in dollars
    pub price: f64,
    pub square_footage: f64,
    /// Current zoning classification
    pub zoning_type: String,
    /// Distance to the nearest medical facility, in miles
    pub proximity_to_medical: f64,
    pub neighborhood_score: Score,
}

/// Zoning findings for a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoningRecord {
    /// Whether a rehab facility is an allowed use
    pub allowed_use: bool,
    pub max_occupancy: u32,
    pub parking_requirements: String,
    #[serde(default)]
    pub special_permits_needed: Vec<String>,
}

/// Community fit of a property's neighborhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityRecord {
    pub crime_rate: f64,
    /// Distance to essential services, in miles
    pub proximity_to_services: f64,
    pub public_transport_score: Score,
    pub recovery_friendly_score: Score,
}

/// Facility layout and renovation plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningRecord {
    pub optimal_capacity: u32,
    pub estimated_renovation_cost: f64,
    pub renovation_timeline_months: u32,
    #[serde(default)]
    pub key_features: Vec<String>,
}

/// What the caller is looking for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub location: String,
    /// Maximum total price in dollars
    pub budget: f64,
    #[serde(default = "default_min_bedrooms")]
    pub min_bedrooms: u32,
}

fn default_min_bedrooms() -> u32 {
    10
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            location: "South Florida".to_string(),
            budget: 2_000_000.0,
            min_bedrooms: default_min_bedrooms(),
        }
    }
}

impl SearchCriteria {
    pub fn new(location: impl Into<String>, budget: f64) -> Self {
        Self {
            location: location.into(),
            budget,
            min_bedrooms: default_min_bedrooms(),
        }
    }

    pub fn with_min_bedrooms(mut self, min_bedrooms: u32) -> Self {
        self.min_bedrooms = min_bedrooms;
        self
    }

    /// The natural-language instruction that seeds the pipeline.
    pub fn instruction(&self) -> String {
        format!(
            "Find and analyze properties in {} for a rehab facility with a budget of ${} and at least {} bedrooms",
            self.location, self.budget, self.min_bedrooms
        )
    }

    /// Tool arguments understood by the property search tool.
    pub fn to_tool_args(&self) -> serde_json::Value {
        serde_json::json!({
            "location": self.location,
            "min_bedrooms": self.min_bedrooms,
            "max_price": self.budget,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bounds() {
        assert!(Score::new(0).is_err());
        assert!(Score::new(11).is_err());
        assert_eq!(Score::new(1).unwrap().get(), 1);
        assert_eq!(Score::new(10).unwrap().get(), 10);
        assert_eq!(Score::saturating(0).get(), 1);
        assert_eq!(Score::saturating(42).get(), 10);
    }

    #[test]
    fn test_score_deserialize_rejects_out_of_range() {
        let err = serde_json::from_str::<Score>("11");
        assert!(err.is_err());

        let ok: Score = serde_json::from_str("7").unwrap();
        assert_eq!(ok.get(), 7);
        assert_eq!(serde_json::to_string(&ok).unwrap(), "7");
    }

    #[test]
    fn test_community_record_rejects_bad_score() {
        let json = serde_json::json!({
            "crime_rate": 0.1,
            "proximity_to_services": 2.0,
            "public_transport_score": 0,
            "recovery_friendly_score": 5
        });
        assert!(serde_json::from_value::<CommunityRecord>(json).is_err());
    }

    #[test]
    fn test_zoning_permits_default_empty() {
        let json = serde_json::json!({
            "allowed_use": false,
            "max_occupancy": 6,
            "parking_requirements": "none"
        });
        let zoning: ZoningRecord = serde_json::from_value(json).unwrap();
        assert!(zoning.special_permits_needed.is_empty());
    }

    #[test]
    fn test_instruction_formats_whole_budget() {
        let criteria = SearchCriteria::new("South Florida", 2_000_000.0);
        assert_eq!(
            criteria.instruction(),
            "Find and analyze properties in South Florida for a rehab facility with a budget of $2000000 and at least 10 bedrooms"
        );
    }

    #[test]
    fn test_criteria_tool_args() {
        let args = SearchCriteria::new("Miami", 1_500_000.5)
            .with_min_bedrooms(12)
            .to_tool_args();
        assert_eq!(args["location"], "Miami");
        assert_eq!(args["min_bedrooms"], 12);
        assert_eq!(args["max_price"], 1_500_000.5);
    }
}
