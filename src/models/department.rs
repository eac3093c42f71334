//! Production departments, welding sub-stages and job categories.
//!
//! These are closed sets. Everything keyed by department uses the enum
//! directly, so a new department is a compile error at every `match`
//! that has to handle it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A production department a job passes through.
///
/// Declaration order is the canonical shop-floor order. A deployment
/// may run a subset of it (see `ShopConfig::pipeline`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    Engineering,
    Laser,
    PressBrake,
    Welding,
    Polish,
    Assembly,
}

impl Department {
    /// All departments in canonical order.
    pub const ALL: [Department; 6] = [
        Department::Engineering,
        Department::Laser,
        Department::PressBrake,
        Department::Welding,
        Department::Polish,
        Department::Assembly,
    ];

    /// Display name used on the shop floor.
    pub fn name(self) -> &'static str {
        match self {
            Department::Engineering => "Engineering",
            Department::Laser => "Laser",
            Department::PressBrake => "Press Brake",
            Department::Welding => "Welding",
            Department::Polish => "Polish",
            Department::Assembly => "Assembly",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A station inside the welding department.
///
/// Door-assembly jobs are welded station by station; every other
/// category treats `Welding` as one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubStage {
    Press,
    Robot,
    TubeFrame,
    FullWeld,
}

impl SubStage {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            SubStage::Press => "Press",
            SubStage::Robot => "Robot",
            SubStage::TubeFrame => "Tube Frame",
            SubStage::FullWeld => "Full Weld",
        }
    }
}

impl fmt::Display for SubStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Product family of a job.
///
/// Drives scheduling precedence, batching keys and the welding split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    DoorAssembly,
    FabricatedMetal,
    Specialty,
}

impl Category {
    /// All categories.
    pub const ALL: [Category; 3] = [
        Category::DoorAssembly,
        Category::FabricatedMetal,
        Category::Specialty,
    ];

    /// Short code used in batch keys and reports.
    pub fn code(self) -> &'static str {
        match self {
            Category::DoorAssembly => "DOORS",
            Category::FabricatedMetal => "FAB",
            Category::Specialty => "SPECIALTY",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_department_order() {
        let mut sorted = Department::ALL;
        sorted.sort();
        assert_eq!(sorted, Department::ALL);
        assert!(Department::Laser < Department::Welding);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Department::PressBrake).unwrap();
        assert_eq!(json, "\"press_brake\"");
        let cat: Category = serde_json::from_str("\"door_assembly\"").unwrap();
        assert_eq!(cat, Category::DoorAssembly);
    }

    #[test]
    fn test_display() {
        assert_eq!(Department::PressBrake.to_string(), "Press Brake");
        assert_eq!(SubStage::TubeFrame.to_string(), "Tube Frame");
        assert_eq!(Category::FabricatedMetal.to_string(), "FAB");
    }
}
