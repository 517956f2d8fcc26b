//! View configuration.
//!
//! All fields have defaults so a partial JSON document is enough:
//!
//! ```
//! use u_gantt::config::GanttConfig;
//!
//! let config = GanttConfig::from_json(r#"{
//!     "scale": "week",
//!     "focus_date": "2018-12-20",
//!     "group_by": ["user_id", "project_id"],
//!     "consolidation": {
//!         "measure_field": "allocated_hours",
//!         "max_by_dimension": { "user_id": 8.0 }
//!     }
//! }"#).unwrap();
//! assert_eq!(config.group_by.len(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::consolidation::ConsolidationConfig;
use crate::error::{GanttError, GanttResult};
use crate::models::DateFields;
use crate::packing::DEFAULT_LEVEL_HEIGHT_PX;
use crate::scale::{Scale, TimeScaleConfig};

/// Complete view configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GanttConfig {
    /// Scale, precision, focus and timezone.
    #[serde(flatten)]
    pub time: TimeScaleConfig,
    /// Record field holding the start instant.
    pub date_start_field: String,
    /// Record field holding the stop instant.
    pub date_stop_field: String,
    /// Grouping dimensions, outermost first.
    pub group_by: Vec<String>,
    /// Render first-level groups closed by default.
    pub collapse_first_level: bool,
    /// Measure aggregation on group rows.
    pub consolidation: Option<ConsolidationConfig>,
    /// Adds a total row aggregating every interval.
    pub total_row: bool,
    /// Fetch unavailable columns.
    pub display_unavailability: bool,
    /// Fetch unavailability per leaf row instead of globally.
    pub per_row_unavailability: bool,
    /// Allows drag and resize.
    pub editable: bool,
    /// Height of one packing level (px).
    pub level_height_px: f64,
    /// Pointer travel before a press turns into a drag (px).
    pub drag_threshold_px: f64,
    /// Vertical travel before a drag switches rows (px).
    pub row_switch_threshold_px: f64,
}

impl Default for GanttConfig {
    fn default() -> Self {
        Self {
            time: TimeScaleConfig::default(),
            date_start_field: "date_start".to_string(),
            date_stop_field: "date_stop".to_string(),
            group_by: Vec::new(),
            collapse_first_level: false,
            consolidation: None,
            total_row: false,
            display_unavailability: false,
            per_row_unavailability: false,
            editable: true,
            level_height_px: DEFAULT_LEVEL_HEIGHT_PX,
            drag_threshold_px: 3.0,
            row_switch_threshold_px: 12.0,
        }
    }
}

impl GanttConfig {
    pub fn new(time: TimeScaleConfig) -> Self {
        Self {
            time,
            ..Default::default()
        }
    }

    /// Parses and validates a JSON document.
    pub fn from_json(json: &str) -> GanttResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.time.scale = scale;
        self
    }

    pub fn with_group_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_collapse_first_level(mut self, collapse: bool) -> Self {
        self.collapse_first_level = collapse;
        self
    }

    pub fn with_consolidation(mut self, consolidation: ConsolidationConfig) -> Self {
        self.consolidation = Some(consolidation);
        self
    }

    pub fn with_total_row(mut self) -> Self {
        self.total_row = true;
        self
    }

    /// Enables unavailability marks, per row or global.
    pub fn with_unavailability(mut self, per_row: bool) -> Self {
        self.display_unavailability = true;
        self.per_row_unavailability = per_row;
        self
    }

    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn with_level_height(mut self, px: f64) -> Self {
        self.level_height_px = px;
        self
    }

    /// Whether first-level groups start closed.
    ///
    /// Consolidation makes group rows the unit of display, which implies it.
    pub fn effective_collapse_first_level(&self) -> bool {
        self.collapse_first_level || (self.consolidation.is_some() && !self.group_by.is_empty())
    }

    pub fn date_fields(&self) -> DateFields<'_> {
        DateFields {
            start: &self.date_start_field,
            stop: &self.date_stop_field,
        }
    }

    /// Checks precisions, timezone and pixel settings.
    pub fn validate(&self) -> GanttResult<()> {
        self.time.precision.validate()?;
        self.time.tz()?;
        if self.level_height_px.is_nan() || self.level_height_px <= 0.0 {
            return Err(GanttError::Config(format!(
                "level height must be positive, got {}",
                self.level_height_px
            )));
        }
        if self.drag_threshold_px < 0.0 || self.row_switch_threshold_px < 0.0 {
            return Err(GanttError::Config("thresholds must not be negative".to_string()));
        }
        if let Some(consolidation) = &self.consolidation {
            if consolidation.measure_field.is_empty() {
                return Err(GanttError::Config("consolidation measure field is empty".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::{Fraction, Precision, TimeUnit};
    use chrono::{NaiveDate, Weekday};

    #[test]
    fn test_defaults() {
        let config = GanttConfig::from_json("{}").unwrap();
        assert_eq!(config.time.scale, Scale::Month);
        assert_eq!(config.time.week_start, Weekday::Mon);
        assert_eq!(config.date_start_field, "date_start");
        assert!(config.editable);
        assert!(config.group_by.is_empty());
        assert_eq!(config.level_height_px, DEFAULT_LEVEL_HEIGHT_PX);
    }

    #[test]
    fn test_parse_full() {
        let json = r#"{
            "scale": "day",
            "precision": { "day": "hour:quarter" },
            "focus_date": "2018-12-20",
            "timezone_offset_minutes": 60,
            "group_by": ["user_id"],
            "consolidation": {
                "measure_field": "allocated_hours",
                "max_by_dimension": { "user_id": 8.0 },
                "exclude_field": "exclude"
            },
            "editable": false
        }"#;
        let config = GanttConfig::from_json(json).unwrap();
        assert_eq!(config.time.scale, Scale::Day);
        assert_eq!(
            config.time.precision(),
            Precision::new(TimeUnit::Hour, Fraction::Quarter)
        );
        assert_eq!(config.time.focus_date, NaiveDate::from_ymd_opt(2018, 12, 20).unwrap());
        let consolidation = config.consolidation.as_ref().unwrap();
        assert_eq!(consolidation.max_by_dimension.get("user_id"), Some(&8.0));
        assert_eq!(consolidation.shade_steps, crate::consolidation::DEFAULT_SHADE_STEPS);
        assert!(config.effective_collapse_first_level());
        assert!(!config.editable);
    }

    #[test]
    fn test_rejects_disallowed_precision() {
        let json = r#"{ "precision": { "month": "hour:quarter" } }"#;
        assert!(matches!(
            GanttConfig::from_json(json),
            Err(GanttError::InvalidPrecision { scale: Scale::Month, .. })
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(GanttConfig::from_json("{"), Err(GanttError::Json(_))));
        assert!(matches!(
            GanttConfig::from_json(r#"{ "scale": "decade" }"#),
            Err(GanttError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_bad_pixels() {
        let config = GanttConfig::default().with_level_height(0.0);
        assert!(matches!(config.validate(), Err(GanttError::Config(_))));
    }

    #[test]
    fn test_round_trip() {
        let config = GanttConfig::default()
            .with_scale(Scale::Week)
            .with_group_by(["user_id", "project_id"])
            .with_consolidation(
                ConsolidationConfig::new("allocated_hours").with_max("user_id", 8.0),
            )
            .with_unavailability(true);
        let json = serde_json::to_string(&config).unwrap();
        let back: GanttConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
