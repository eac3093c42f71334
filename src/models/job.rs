//! Job model.
//!
//! A job is a quantity of one product passing through the department
//! pipeline. It carries three groups of fields:
//!
//! - **Inputs** owned by the import pipeline and manual edits (identity,
//!   dates, per-job overrides, component list, floor progress).
//! - **Schedule output** written only by the scheduler.
//! - **Derived flags** written only by the progress tracker.
//!
//! Each run overwrites the last two groups wholesale.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{Category, DateWindow, Department, SubStage};

/// A manual priority rank, scoped to one department's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualPriority {
    /// Department whose queue the rank applies to.
    pub department: Department,
    /// Queue position (lower = earlier).
    pub rank: u32,
}

/// Where a job stands against its plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    #[default]
    OnTrack,
    Ahead,
    Slipping,
    Stalled,
}

/// An open or received purchase order for a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    /// PO number.
    pub number: String,
    /// Vendor name.
    #[serde(default)]
    pub vendor: String,
    /// Quantity ordered.
    pub qty_ordered: f64,
    /// Quantity received so far.
    #[serde(default)]
    pub qty_received: f64,
    /// Promised line due date.
    pub due: Option<NaiveDate>,
}

/// A bill-of-material line committed to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Part number.
    pub part: String,
    /// Part description.
    #[serde(default)]
    pub description: String,
    /// Quantity committed to the job.
    pub qty_committed: f64,
    /// Quantity in stock.
    #[serde(default)]
    pub qty_on_hand: f64,
    /// Quantity already issued to the floor.
    #[serde(default)]
    pub qty_issued: f64,
    /// Purchase order covering the part, if bought out.
    #[serde(default)]
    pub purchase_order: Option<PurchaseOrder>,
}

/// A production job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Free-text description (keywords drive the welding split).
    #[serde(default)]
    pub description: String,
    /// Product family.
    pub category: Category,
    /// Units in the job.
    #[serde(default)]
    pub quantity: u32,
    /// Required effort per department, in points.
    pub points: f64,
    /// Promised completion date. `None` = unparseable upstream.
    pub due_date: Option<NaiveDate>,
    /// Due date the current schedule was computed against.
    #[serde(default)]
    pub previous_due_date: Option<NaiveDate>,
    /// Department the job physically sits in.
    pub current_department: Department,
    /// Earliest date work may begin (customer release, drawings).
    #[serde(default)]
    pub ready_date: Option<NaiveDate>,

    /// Pack departments back to back.
    #[serde(default)]
    pub no_gap: bool,
    /// Departments this job bypasses.
    #[serde(default)]
    pub skipped_departments: BTreeSet<Department>,
    /// Manual queue rank within one department.
    #[serde(default)]
    pub manual_priority: Option<ManualPriority>,
    /// Hand-placed department windows, honored verbatim.
    #[serde(default)]
    pub manual_windows: BTreeMap<Department, DateWindow>,
    /// Bill of materials.
    #[serde(default)]
    pub components: Vec<Component>,

    /// Completion percentage (0-100) reported per department.
    #[serde(default)]
    pub department_progress: BTreeMap<Department, f64>,
    /// Completion percentage (0-100) reported per welding station.
    #[serde(default)]
    pub sub_stage_progress: BTreeMap<SubStage, f64>,
    /// Last date any completion percentage moved.
    #[serde(default)]
    pub last_progress_at: Option<NaiveDate>,

    /// Department windows (scheduler output).
    #[serde(default)]
    pub schedule: BTreeMap<Department, DateWindow>,
    /// Welding station windows (scheduler output).
    #[serde(default)]
    pub sub_stage_schedule: BTreeMap<SubStage, DateWindow>,
    /// Not-yet-finished part of `schedule`.
    #[serde(default)]
    pub remaining_schedule: BTreeMap<Department, DateWindow>,
    /// Computed completion falls after the due date.
    #[serde(default)]
    pub scheduling_conflict: bool,
    /// Departments whose manual window starts before the previous
    /// department has finished.
    #[serde(default)]
    pub out_of_sequence: Vec<Department>,
    /// Progress against the plan.
    #[serde(default)]
    pub progress_status: ProgressStatus,
    /// Due date moved since the last schedule.
    #[serde(default)]
    pub needs_reschedule: bool,
    /// Why the job was left out of capacity allocation.
    #[serde(default)]
    pub exclusion_reason: Option<String>,
}

impl Job {
    /// Creates a job in the first canonical department.
    pub fn new(id: impl Into<String>, category: Category, points: f64) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            description: String::new(),
            category,
            quantity: 1,
            points,
            due_date: None,
            previous_due_date: None,
            current_department: Department::Engineering,
            ready_date: None,
            no_gap: false,
            skipped_departments: BTreeSet::new(),
            manual_priority: None,
            manual_windows: BTreeMap::new(),
            components: Vec::new(),
            department_progress: BTreeMap::new(),
            sub_stage_progress: BTreeMap::new(),
            last_progress_at: None,
            schedule: BTreeMap::new(),
            sub_stage_schedule: BTreeMap::new(),
            remaining_schedule: BTreeMap::new(),
            scheduling_conflict: false,
            out_of_sequence: Vec::new(),
            progress_status: ProgressStatus::OnTrack,
            needs_reschedule: false,
            exclusion_reason: None,
        }
    }

    /// Sets the job name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the quantity.
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets the due date.
    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    /// Sets the department the job currently sits in.
    pub fn in_department(mut self, department: Department) -> Self {
        self.current_department = department;
        self
    }

    /// Sets the earliest start date.
    pub fn with_ready_date(mut self, date: NaiveDate) -> Self {
        self.ready_date = Some(date);
        self
    }

    /// Enables no-gap packing.
    pub fn with_no_gap(mut self) -> Self {
        self.no_gap = true;
        self
    }

    /// Skips a department.
    pub fn skipping(mut self, department: Department) -> Self {
        self.skipped_departments.insert(department);
        self
    }

    /// Sets a manual priority rank for one department.
    pub fn with_manual_priority(mut self, department: Department, rank: u32) -> Self {
        self.manual_priority = Some(ManualPriority { department, rank });
        self
    }

    /// Pins a department to a manual window.
    pub fn with_manual_window(mut self, department: Department, window: DateWindow) -> Self {
        self.manual_windows.insert(department, window);
        self
    }

    /// Adds a component line.
    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    /// Records a completion percentage for a department.
    pub fn with_progress(mut self, department: Department, percent: f64) -> Self {
        self.department_progress.insert(department, percent);
        self
    }

    /// Last scheduled day across all departments.
    pub fn completion_date(&self) -> Option<NaiveDate> {
        self.schedule.values().map(|w| w.end).max()
    }

    /// Whether the scheduler placed this job.
    pub fn is_scheduled(&self) -> bool {
        !self.schedule.is_empty()
    }

    /// Clears every scheduler- and tracker-owned field.
    pub(crate) fn clear_outputs(&mut self) {
        self.schedule.clear();
        self.sub_stage_schedule.clear();
        self.remaining_schedule.clear();
        self.scheduling_conflict = false;
        self.out_of_sequence.clear();
        self.progress_status = ProgressStatus::OnTrack;
        self.needs_reschedule = false;
        self.exclusion_reason = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_job_builder() {
        let job = Job::new("J1", Category::DoorAssembly, 300.0)
            .with_name("Lobby doors")
            .with_quantity(12)
            .with_due_date(date(2026, 11, 2))
            .in_department(Department::Laser)
            .with_no_gap()
            .skipping(Department::Polish)
            .with_manual_priority(Department::Laser, 1);

        assert_eq!(job.id, "J1");
        assert_eq!(job.quantity, 12);
        assert_eq!(job.due_date, Some(date(2026, 11, 2)));
        assert_eq!(job.current_department, Department::Laser);
        assert!(job.no_gap);
        assert!(job.skipped_departments.contains(&Department::Polish));
        assert_eq!(job.manual_priority.unwrap().rank, 1);
        assert!(!job.is_scheduled());
    }

    #[test]
    fn test_completion_date() {
        let mut job = Job::new("J1", Category::Specialty, 100.0);
        job.schedule.insert(
            Department::Laser,
            DateWindow::new(date(2026, 10, 19), date(2026, 10, 20)),
        );
        job.schedule.insert(
            Department::Welding,
            DateWindow::new(date(2026, 10, 22), date(2026, 10, 24)),
        );
        assert_eq!(job.completion_date(), Some(date(2026, 10, 24)));
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let json = r#"{
            "id": "25-1044",
            "category": "fabricated_metal",
            "points": 420.0,
            "due_date": "2026-11-06",
            "current_department": "laser"
        }"#;
        let job: Job = serde_json::from_str(json).unwrap();
        assert_eq!(job.id, "25-1044");
        assert_eq!(job.current_department, Department::Laser);
        assert!(job.schedule.is_empty());
        assert_eq!(job.progress_status, ProgressStatus::OnTrack);
    }

    #[test]
    fn test_progress_status_wire_names() {
        let s = serde_json::to_string(&ProgressStatus::OnTrack).unwrap();
        assert_eq!(s, "\"ON_TRACK\"");
    }
}
