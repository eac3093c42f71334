//! Finite-capacity production scheduling for a multi-stage shop floor.
//!
//! Places every job through an ordered department pipeline against weekly
//! point budgets, groups early-pipeline work into batches, classifies
//! progress against yesterday's plan and answers what-if questions for
//! quotes. Every call is a pure recompute: jobs in, new jobs out.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Job`, `Department`, `Category`,
//!   `SubStage`, `Calendar`, `DateWindow`, `WeekKey`
//! - **`config`**: Versioned shop configuration (`ShopConfig`)
//! - **`validation`**: Input integrity checks (due dates, points, IDs)
//! - **`pipeline`**: Per-job department sequence and welding split
//! - **`batching`**: Early-pipeline batch cohorts
//! - **`materials`**: Component supply and material-ready dates
//! - **`dispatching`**: Composable ordering rules
//! - **`scheduler`**: Forward placement, capacity ledger, insights
//! - **`progress`**: Ahead / slipping / stalled classification
//! - **`feasibility`**: Quote simulation and three-tier analysis
//!
//! # Entry Points
//!
//! - [`compute_schedule`]
//! - [`simulate_quote_schedule`]
//! - [`check_advanced_feasibility`]
//! - [`track_progress`]
//!
//! Only a configuration defect returns `Err`. Bad job records are
//! excluded from allocation and reported, never fatal.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Baker & Trietsch (2019), "Principles of Sequencing and Scheduling"

pub mod batching;
pub mod config;
pub mod dispatching;
pub mod error;
pub mod feasibility;
pub mod materials;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod scheduler;
pub mod validation;

pub use config::ShopConfig;
pub use error::{ConfigError, ConfigResult};
pub use feasibility::{check_advanced_feasibility, simulate_quote_schedule};
pub use progress::track_progress;
pub use scheduler::{compute_schedule, ScheduleOutput};
