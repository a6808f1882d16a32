//! The four assessment tools behind the pipeline stages
//!
//! Each tool exposes a typed operation and a [`Tool`] impl. The data they
//! return is fixed sample data: none of them validates its input or fails.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use super::result::{ToolError, ToolResultEnvelope};
use super::tool::{Tool, ToolExecutionContext, ToolMetadata, ToolSchema};
use crate::records::{
    CommunityRecord, PlanningRecord, PropertyRecord, Score, SearchCriteria, ZoningRecord,
};

/// Pull an optional property record out of tool arguments.
fn property_from_args(args: &Value) -> Option<PropertyRecord> {
    args.get("property")
        .and_then(|p| serde_json::from_value(p.clone()).ok())
}

/// Serialize `output` into a success envelope for `tool`.
fn respond<T: Serialize>(
    tool: &dyn Tool,
    output: &T,
    args: &Value,
    ctx: &ToolExecutionContext,
    started_at: chrono::DateTime<Utc>,
) -> Result<ToolResultEnvelope, ToolError> {
    let value = serde_json::to_value(output).map_err(ToolError::serialization)?;
    let provenance = ctx.provenance(tool.name(), args, started_at);
    tracing::debug!(
        tool = tool.name(),
        args_hash = %provenance.args_hash,
        "assessment tool returned sample data"
    );
    Ok(ToolResultEnvelope::success(value, provenance))
}

/// Searches for candidate properties.
pub struct PropertySearchTool {
    metadata: ToolMetadata,
}

impl PropertySearchTool {
    pub const NAME: &'static str = "Property Search";

    pub fn new() -> Self {
        Self {
            metadata: ToolMetadata::new(
                Self::NAME,
                "Search for properties in South Florida suitable for rehab facilities",
            )
            .with_returns("A list of property records")
            .with_tag("search"),
        }
    }

    /// Find properties matching the criteria.
    pub fn search(&self, _criteria: &SearchCriteria) -> Vec<PropertyRecord> {
        vec![PropertyRecord {
            address: "123 Palm Ave, Miami, FL".to_string(),
            total_bedrooms: 15,
            total_bathrooms: 10,
            common_areas: 3,
            price: 1_800_000.0,
            square_footage: 5000.0,
            zoning_type: "Residential".to_string(),
            proximity_to_medical: 1.2,
            neighborhood_score: Score::saturating(8),
        }]
    }

    fn criteria_from_args(args: &Value) -> SearchCriteria {
        let defaults = SearchCriteria::default();
        SearchCriteria {
            location: args
                .get("location")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(defaults.location),
            budget: args
                .get("max_price")
                .and_then(Value::as_f64)
                .unwrap_or(defaults.budget),
            min_bedrooms: args
                .get("min_bedrooms")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.min_bedrooms),
        }
    }
}

impl Default for PropertySearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for PropertySearchTool {
    fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(serde_json::json!({
            "type": "object",
            "properties": {
                "location": { "type": "string" },
                "min_bedrooms": { "type": "integer" },
                "max_price": { "type": "number" }
            }
        }))
    }

    async fn execute(
        &self,
        args: Value,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolResultEnvelope, ToolError> {
        let started_at = Utc::now();
        let criteria = Self::criteria_from_args(&args);
        let properties = self.search(&criteria);
        respond(self, &properties, &args, ctx, started_at)
    }
}

/// Checks zoning rules for a property.
pub struct ZoningAnalysisTool {
    metadata: ToolMetadata,
}

impl ZoningAnalysisTool {
    pub const NAME: &'static str = "Zoning Analysis";

    pub fn new() -> Self {
        Self {
            metadata: ToolMetadata::new(
                Self::NAME,
                "Analyze zoning regulations for potential rehab facility properties",
            )
            .with_returns("A zoning record")
            .with_tag("zoning"),
        }
    }

    pub fn analyze(&self, _property: &PropertyRecord) -> ZoningRecord {
        ZoningRecord {
            allowed_use: true,
            max_occupancy: 20,
            parking_requirements: "1 space per 4 beds".to_string(),
            special_permits_needed: vec!["Group Home Permit".to_string()],
        }
    }
}

impl Default for ZoningAnalysisTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ZoningAnalysisTool {
    fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::property_input()
    }

    async fn execute(
        &self,
        args: Value,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolResultEnvelope, ToolError> {
        let started_at = Utc::now();
        let zoning = match property_from_args(&args) {
            Some(property) => self.analyze(&property),
            None => self.analyze(&sample_property()),
        };
        respond(self, &zoning, &args, ctx, started_at)
    }
}

/// Scores how well a neighborhood supports recovery.
pub struct CommunityAssessmentTool {
    metadata: ToolMetadata,
}

impl CommunityAssessmentTool {
    pub const NAME: &'static str = "Community Assessment";

    pub fn new() -> Self {
        Self {
            metadata: ToolMetadata::new(
                Self::NAME,
                "Assess community compatibility for rehab facilities",
            )
            .with_returns("A community record")
            .with_tag("community"),
        }
    }

    pub fn assess(&self, _property: &PropertyRecord) -> CommunityRecord {
        CommunityRecord {
            crime_rate: 0.02,
            proximity_to_services: 1.5,
            public_transport_score: Score::saturating(7),
            recovery_friendly_score: Score::saturating(8),
        }
    }
}

impl Default for CommunityAssessmentTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CommunityAssessmentTool {
    fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::property_input()
    }

    async fn execute(
        &self,
        args: Value,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolResultEnvelope, ToolError> {
        let started_at = Utc::now();
        let community = match property_from_args(&args) {
            Some(property) => self.assess(&property),
            None => self.assess(&sample_property()),
        };
        respond(self, &community, &args, ctx, started_at)
    }
}

/// Plans the facility layout and renovation.
pub struct FacilityPlanningTool {
    metadata: ToolMetadata,
}

impl FacilityPlanningTool {
    pub const NAME: &'static str = "Facility Planning";

    pub fn new() -> Self {
        Self {
            metadata: ToolMetadata::new(
                Self::NAME,
                "Plan and design rehab facility layout and modifications",
            )
            .with_returns("A planning record")
            .with_tag("planning"),
        }
    }

    pub fn plan(&self, _property: &PropertyRecord) -> PlanningRecord {
        PlanningRecord {
            optimal_capacity: 20,
            estimated_renovation_cost: 250_000.0,
            renovation_timeline_months: 6,
            key_features: vec![
                "Group therapy room".to_string(),
                "Individual counseling offices".to_string(),
                "Meditation garden".to_string(),
            ],
        }
    }
}

impl Default for FacilityPlanningTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FacilityPlanningTool {
    fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::property_input()
    }

    async fn execute(
        &self,
        args: Value,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolResultEnvelope, ToolError> {
        let started_at = Utc::now();
        let plan = match property_from_args(&args) {
            Some(property) => self.plan(&property),
            None => self.plan(&sample_property()),
        };
        respond(self, &plan, &args, ctx, started_at)
    }
}

/// The property the search tool always finds.
pub fn sample_property() -> PropertyRecord {
    PropertySearchTool::new()
        .search(&SearchCriteria::default())
        .remove(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn odd_property() -> PropertyRecord {
        PropertyRecord {
            address: "1 Nowhere Rd".to_string(),
            total_bedrooms: 0,
            total_bathrooms: 0,
            common_areas: 0,
            price: -1.0,
            square_footage: 0.0,
            zoning_type: String::new(),
            proximity_to_medical: 999.0,
            neighborhood_score: Score::new(1).unwrap(),
        }
    }

    #[test]
    fn test_search_returns_bounded_record() {
        let criteria = SearchCriteria::new("anywhere", 0.0).with_min_bedrooms(500);
        let properties = PropertySearchTool::new().search(&criteria);

        assert_eq!(properties.len(), 1);
        let property = &properties[0];
        assert_eq!(property.address, "123 Palm Ave, Miami, FL");
        let score = property.neighborhood_score.get();
        assert!((Score::MIN..=Score::MAX).contains(&score));
    }

    #[test]
    fn test_oversized_bedroom_count_falls_back_to_default() {
        let args = serde_json::json!({
            "location": "Tampa",
            "min_bedrooms": u64::MAX,
        });
        let criteria = PropertySearchTool::criteria_from_args(&args);

        assert_eq!(criteria.location, "Tampa");
        assert_eq!(criteria.min_bedrooms, SearchCriteria::default().min_bedrooms);

        let args = serde_json::json!({ "min_bedrooms": u64::from(u32::MAX) });
        assert_eq!(
            PropertySearchTool::criteria_from_args(&args).min_bedrooms,
            u32::MAX
        );
    }

    #[test]
    fn test_stubs_ignore_input() {
        let property = odd_property();

        let zoning = ZoningAnalysisTool::new().analyze(&property);
        assert!(zoning.allowed_use);
        assert_eq!(zoning.special_permits_needed, vec!["Group Home Permit"]);

        let community = CommunityAssessmentTool::new().assess(&property);
        assert_eq!(community.public_transport_score.get(), 7);
        assert_eq!(community.recovery_friendly_score.get(), 8);

        let plan = FacilityPlanningTool::new().plan(&property);
        assert_eq!(plan.renovation_timeline_months, 6);
        assert_eq!(plan.key_features.len(), 3);
    }

    #[tokio::test]
    async fn test_execute_accepts_any_arguments() {
        let ctx = ToolExecutionContext::new().with_agent_id("tester");
        let tools: Vec<Box<dyn Tool>> = vec![
            Box::new(PropertySearchTool::new()),
            Box::new(ZoningAnalysisTool::new()),
            Box::new(CommunityAssessmentTool::new()),
            Box::new(FacilityPlanningTool::new()),
        ];

        for args in [
            Value::Null,
            serde_json::json!("free text"),
            serde_json::json!({"property": {"bogus": true}}),
        ] {
            for tool in &tools {
                let envelope = tool.execute(args.clone(), &ctx).await.unwrap();
                assert!(envelope.is_success(), "{} failed", tool.name());
            }
        }
    }

    #[tokio::test]
    async fn test_execute_output_parses_back() {
        let ctx = ToolExecutionContext::new();
        let args = serde_json::json!({ "property": sample_property() });

        let envelope = PropertySearchTool::new()
            .execute(SearchCriteria::default().to_tool_args(), &ctx)
            .await
            .unwrap();
        let properties: Vec<PropertyRecord> =
            serde_json::from_value(envelope.value().unwrap().clone()).unwrap();
        assert_eq!(properties[0].total_bedrooms, 15);

        let envelope = CommunityAssessmentTool::new()
            .execute(args, &ctx)
            .await
            .unwrap();
        let community: CommunityRecord =
            serde_json::from_value(envelope.value().unwrap().clone()).unwrap();
        assert_eq!(community.crime_rate, 0.02);
    }
}
