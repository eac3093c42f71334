//! Shop-floor scheduling domain models.
//!
//! Provides the data types exchanged with the import, persistence and
//! dashboard layers. They are plain data: the scheduler reads the input
//! fields of a [`Job`] and returns a new job with the output fields set.
//!
//! # Domain Mappings
//!
//! | u-shopfloor | Scheduling theory | Shop floor |
//! |-------------|-------------------|------------|
//! | Job | Task | Work order |
//! | Department | Machine stage | Work center |
//! | SubStage | Parallel station | Welding cell |
//! | DateWindow | Operation interval | Planned dates |

mod calendar;
mod department;
mod job;

pub use calendar::{Calendar, DateWindow, OvertimeTier, WeekKey};
pub use department::{Category, Department, SubStage};
pub use job::{Component, Job, ManualPriority, ProgressStatus, PurchaseOrder};
