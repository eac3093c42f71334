//! Versioned shop configuration.
//!
//! Everything the scheduler treats as a constant lives here: department
//! order, weekly capacities, overtime allowances, batching window and
//! the welding heuristics. The document is deserialized from JSON and
//! validated before any job is looked at; a defect here is fatal to the
//! run, unlike a defect in a job record.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::{ConfigError, ConfigResult};
use crate::models::{Calendar, Category, Department, OvertimeTier, SubStage};

/// Capacity figures for one department.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepartmentConfig {
    /// Points the department can absorb in a standard week.
    pub weekly_capacity: f64,
    /// Points one job advances per working day in this department.
    pub daily_throughput: f64,
}

impl DepartmentConfig {
    /// Capacity with throughput spread evenly over a six-day week.
    pub fn with_weekly_capacity(weekly_capacity: f64) -> Self {
        Self {
            weekly_capacity,
            daily_throughput: weekly_capacity / 6.0,
        }
    }
}

/// Calendar settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Weekly day off.
    pub rest_day: Weekday,
    /// Plant shutdown dates.
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            rest_day: Weekday::Sun,
            holidays: Vec::new(),
        }
    }
}

/// Extra capacity granted by one overtime tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OvertimeAllowance {
    /// Fractional increase of weekly capacity (0.10 = +10%).
    pub capacity_factor: f64,
    /// Whether the rest day is worked, adding one day of throughput.
    #[serde(default)]
    pub works_rest_day: bool,
}

/// Batch grouping settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Look-ahead window in business days from today.
    pub lookahead_days: u32,
    /// Last department (inclusive) where jobs may still be batched.
    pub cutoff: Department,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            lookahead_days: 12,
            cutoff: Department::PressBrake,
        }
    }
}

/// Effort model for one welding station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationEffort {
    /// Station.
    pub stage: SubStage,
    /// Fixed setup effort per job.
    pub setup: f64,
    /// Effort per unit.
    pub per_unit: f64,
}

/// Description keyword that scales one station's effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordFactor {
    /// Case-insensitive keyword.
    pub keyword: String,
    /// Station affected.
    pub stage: SubStage,
    /// Effort multiplier.
    pub factor: f64,
}

/// Welding sub-stage heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeldingHeuristics {
    /// Category whose welding expands into stations.
    pub category: Category,
    /// Stations in order, with their effort model.
    pub stations: Vec<StationEffort>,
    /// Keyword multipliers applied to station effort.
    #[serde(default)]
    pub keyword_factors: Vec<KeywordFactor>,
    /// Description keyword that routes the job to the frame line.
    pub frame_keyword: String,
    /// Station frame jobs are welded on, as one block.
    pub frame_stage: SubStage,
}

impl Default for WeldingHeuristics {
    fn default() -> Self {
        Self {
            category: Category::DoorAssembly,
            stations: vec![
                StationEffort {
                    stage: SubStage::Press,
                    setup: 30.0,
                    per_unit: 4.0,
                },
                StationEffort {
                    stage: SubStage::Robot,
                    setup: 60.0,
                    per_unit: 6.0,
                },
                StationEffort {
                    stage: SubStage::FullWeld,
                    setup: 20.0,
                    per_unit: 10.0,
                },
            ],
            keyword_factors: vec![
                KeywordFactor {
                    keyword: "double".into(),
                    stage: SubStage::Robot,
                    factor: 1.5,
                },
                KeywordFactor {
                    keyword: "stainless".into(),
                    stage: SubStage::FullWeld,
                    factor: 1.3,
                },
            ],
            frame_keyword: "frame".into(),
            frame_stage: SubStage::TubeFrame,
        }
    }
}

/// Quote estimation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuoteConfig {
    /// Sales value that corresponds to one point of effort.
    pub value_per_point: f64,
    /// Effort multiplier for big-item carve-outs.
    pub big_item_weight: f64,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            value_per_point: 100.0,
            big_item_weight: 1.5,
        }
    }
}

/// Complete shop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    /// Department order every job follows.
    pub pipeline: Vec<Department>,
    /// Capacity per department.
    pub departments: BTreeMap<Department, DepartmentConfig>,
    /// Working-day calendar.
    pub calendar: CalendarConfig,
    /// Capacity added by each overtime tier.
    pub overtime: BTreeMap<OvertimeTier, OvertimeAllowance>,
    /// Idle working days between departments unless the job is no-gap.
    pub handoff_buffer_days: u32,
    /// Batch grouping.
    pub batching: BatchConfig,
    /// Categories in scheduling order.
    pub category_precedence: Vec<Category>,
    /// Welding station heuristics.
    pub welding: WeldingHeuristics,
    /// Quote estimation.
    pub quote: QuoteConfig,
    /// How far ahead the capacity search looks before giving up.
    pub search_horizon_weeks: u32,
    /// Working days without progress before a late job counts as stalled.
    pub stall_days: u32,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            pipeline: Department::ALL.to_vec(),
            departments: Department::ALL
                .iter()
                .map(|d| (*d, DepartmentConfig::with_weekly_capacity(850.0)))
                .collect(),
            calendar: CalendarConfig::default(),
            overtime: [
                (
                    OvertimeTier::Tier1,
                    OvertimeAllowance {
                        capacity_factor: 0.10,
                        works_rest_day: false,
                    },
                ),
                (
                    OvertimeTier::Tier2,
                    OvertimeAllowance {
                        capacity_factor: 0.25,
                        works_rest_day: true,
                    },
                ),
            ]
            .into_iter()
            .collect(),
            handoff_buffer_days: 1,
            batching: BatchConfig::default(),
            category_precedence: vec![
                Category::DoorAssembly,
                Category::FabricatedMetal,
                Category::Specialty,
            ],
            welding: WeldingHeuristics::default(),
            quote: QuoteConfig::default(),
            search_horizon_weeks: 156,
            stall_days: 2,
        }
    }
}

impl ShopConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces the pipeline.
    pub fn with_pipeline(mut self, pipeline: Vec<Department>) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Sets capacity for one department.
    pub fn with_department(mut self, department: Department, config: DepartmentConfig) -> Self {
        self.departments.insert(department, config);
        self
    }

    /// Sets the handoff buffer.
    pub fn with_handoff_buffer(mut self, days: u32) -> Self {
        self.handoff_buffer_days = days;
        self
    }

    /// Checks the configuration for deployment defects.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.pipeline.is_empty() {
            return Err(ConfigError::EmptyPipeline);
        }

        let mut seen = HashSet::new();
        for &dept in &self.pipeline {
            if !seen.insert(dept) {
                return Err(ConfigError::DuplicateDepartment(dept));
            }
            let cap = self
                .departments
                .get(&dept)
                .ok_or(ConfigError::MissingCapacity(dept))?;
            if !(cap.weekly_capacity.is_finite() && cap.weekly_capacity > 0.0) {
                return Err(ConfigError::invalid(
                    format!("departments.{dept}.weekly_capacity"),
                    "must be a positive number",
                ));
            }
            if !(cap.daily_throughput.is_finite() && cap.daily_throughput > 0.0) {
                return Err(ConfigError::invalid(
                    format!("departments.{dept}.daily_throughput"),
                    "must be a positive number",
                ));
            }
        }

        for tier in OvertimeTier::ESCALATION {
            let allowance = self
                .overtime
                .get(&tier)
                .ok_or(ConfigError::MissingOvertime(tier))?;
            if !(allowance.capacity_factor.is_finite() && allowance.capacity_factor >= 0.0) {
                return Err(ConfigError::invalid(
                    format!("overtime.{tier}.capacity_factor"),
                    "must be zero or positive",
                ));
            }
        }

        if !self.pipeline.contains(&self.batching.cutoff) {
            return Err(ConfigError::CutoffOutsidePipeline(self.batching.cutoff));
        }

        for cat in Category::ALL {
            if !self.category_precedence.contains(&cat) {
                return Err(ConfigError::MissingCategory(cat));
            }
        }

        if self
            .welding
            .stations
            .iter()
            .any(|s| !(s.setup >= 0.0 && s.per_unit >= 0.0))
        {
            return Err(ConfigError::invalid(
                "welding.stations",
                "effort must be zero or positive",
            ));
        }

        if !(self.quote.value_per_point.is_finite() && self.quote.value_per_point > 0.0) {
            return Err(ConfigError::invalid(
                "quote.value_per_point",
                "must be a positive number",
            ));
        }
        if !(self.quote.big_item_weight.is_finite() && self.quote.big_item_weight > 0.0) {
            return Err(ConfigError::invalid(
                "quote.big_item_weight",
                "must be a positive number",
            ));
        }

        if self.search_horizon_weeks == 0 {
            return Err(ConfigError::invalid(
                "search_horizon_weeks",
                "must be at least one week",
            ));
        }

        Ok(())
    }

    /// Position of a department in the pipeline.
    pub fn pipeline_index(&self, department: Department) -> Option<usize> {
        self.pipeline.iter().position(|d| *d == department)
    }

    /// Capacity figures for a department. Only valid for pipeline
    /// departments of a validated config.
    pub fn department(&self, department: Department) -> DepartmentConfig {
        self.departments
            .get(&department)
            .copied()
            .unwrap_or(DepartmentConfig {
                weekly_capacity: 0.0,
                daily_throughput: 1.0,
            })
    }

    /// Allowance for a tier. `OvertimeTier::None` adds nothing.
    pub fn overtime_allowance(&self, tier: OvertimeTier) -> OvertimeAllowance {
        match tier {
            OvertimeTier::None => OvertimeAllowance::default(),
            _ => self.overtime.get(&tier).copied().unwrap_or_default(),
        }
    }

    /// Scheduling rank of a category (lower goes first).
    pub fn category_rank(&self, category: Category) -> usize {
        self.category_precedence
            .iter()
            .position(|c| *c == category)
            .unwrap_or(self.category_precedence.len())
    }

    /// Builds the calendar, with the rest day counted as capacity if the
    /// tier works it.
    pub fn calendar_for(&self, tier: OvertimeTier) -> Calendar {
        let mut calendar = Calendar::new(self.calendar.rest_day)
            .with_overtime_rest_day(self.overtime_allowance(tier).works_rest_day);
        calendar.holidays.extend(self.calendar.holidays.iter().copied());
        calendar
    }
}
