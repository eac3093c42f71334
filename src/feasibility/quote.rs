//! Hypothetical job specification for quotes.
//!
//! # Points Estimate
//!
//! ```text
//! big      = Σ quantity * unit_value over big items
//! points   = max(0, value - big) / value_per_point
//!          + big / value_per_point * big_item_weight
//! ```
//!
//! Big items are carved out of the per-unit average and weighted
//! separately, since one outsized piece costs more shop time than its
//! share of the sales value suggests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{QuoteConfig, ShopConfig};
use crate::models::{Category, Department, Job};

/// Job ID given to the hypothetical job inside a what-if run.
pub const QUOTE_JOB_ID: &str = "quote:what-if";

/// When the quoted job has to be done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "date", rename_all = "snake_case")]
pub enum DueMode {
    /// As soon as capacity allows.
    Earliest,
    /// By this date.
    Target(NaiveDate),
}

impl DueMode {
    /// Target date, if any.
    pub fn target(&self) -> Option<NaiveDate> {
        match self {
            DueMode::Earliest => None,
            DueMode::Target(date) => Some(*date),
        }
    }
}

/// An outsized line item estimated separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigItem {
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Number of pieces.
    pub quantity: u32,
    /// Sales value per piece.
    pub unit_value: f64,
}

impl BigItem {
    /// Total sales value of the line.
    pub fn value(&self) -> f64 {
        self.quantity as f64 * self.unit_value
    }
}

/// A hypothetical job to quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteInput {
    /// Total sales value.
    pub value: f64,
    /// Units quoted.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Carve-outs from the per-unit average.
    #[serde(default)]
    pub big_items: Vec<BigItem>,
    /// Earliest date work could begin (drawings, material).
    #[serde(default)]
    pub ready_date: Option<NaiveDate>,
    /// Completion mode.
    pub mode: DueMode,
    /// Product family.
    pub category: Category,
    /// Description (drives the welding split like a real job).
    #[serde(default)]
    pub description: String,
    /// Department the job would enter. Defaults to the first in the pipeline.
    #[serde(default)]
    pub start_department: Option<Department>,
}

fn default_quantity() -> u32 {
    1
}

impl QuoteInput {
    /// Creates a quote for `value` in `category`, as early as possible.
    pub fn new(value: f64, category: Category) -> Self {
        Self {
            value,
            quantity: 1,
            big_items: Vec::new(),
            ready_date: None,
            mode: DueMode::Earliest,
            category,
            description: String::new(),
            start_department: None,
        }
    }

    /// Sets the quantity.
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Adds a big-item carve-out.
    pub fn with_big_item(mut self, quantity: u32, unit_value: f64) -> Self {
        self.big_items.push(BigItem {
            description: String::new(),
            quantity,
            unit_value,
        });
        self
    }

    /// Sets the ready date.
    pub fn with_ready_date(mut self, date: NaiveDate) -> Self {
        self.ready_date = Some(date);
        self
    }

    /// Requires completion by `date`.
    pub fn with_target(mut self, date: NaiveDate) -> Self {
        self.mode = DueMode::Target(date);
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the entry department.
    pub fn starting_in(mut self, department: Department) -> Self {
        self.start_department = Some(department);
        self
    }

    /// Estimated points per department.
    pub fn total_points(&self, quote: &QuoteConfig) -> f64 {
        let big: f64 = self
            .big_items
            .iter()
            .map(BigItem::value)
            .filter(|v| v.is_finite() && *v > 0.0)
            .sum();
        let value = if self.value.is_finite() { self.value } else { 0.0 };
        let regular = (value - big).max(0.0) / quote.value_per_point;
        regular + big / quote.value_per_point * quote.big_item_weight
    }

    /// Builds the synthetic job placed by what-if runs.
    pub fn to_job(&self, config: &ShopConfig) -> Job {
        let department = self
            .start_department
            .or_else(|| config.pipeline.first().copied())
            .unwrap_or(Department::Engineering);
        let mut job = Job::new(QUOTE_JOB_ID, self.category, self.total_points(&config.quote))
            .with_name("Quote")
            .with_description(self.description.clone())
            .with_quantity(self.quantity)
            .in_department(department);
        job.ready_date = self.ready_date;
        job.due_date = self.mode.target();
        job
    }
}
