//! Per-job department pipeline resolution.
//!
//! Turns the shop's fixed department order into the sequence one job
//! still has to visit:
//!
//! 1. Start at the job's current department (earlier ones are done).
//! 2. Drop the job's skipped departments. The current department is
//!    never dropped, the job is physically there.
//! 3. For the welding category, attach the station split of `Welding`.
//!
//! # Station Split
//!
//! Station effort is `setup + per_unit * quantity`, scaled by every
//! keyword factor whose keyword appears in the description. Shares are
//! effort over total effort. A description containing the frame keyword
//! bypasses the split and sends the whole department to the frame
//! station.

use std::collections::BTreeMap;

use crate::config::ShopConfig;
use crate::models::{Department, Job, SubStage};

/// A station's share of its department's duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationShare {
    /// Station.
    pub stage: SubStage,
    /// Fraction of the department (all shares sum to 1).
    pub share: f64,
}

/// One department a job must visit.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStep {
    /// Department.
    pub department: Department,
    /// Station split, empty if the department is a single block.
    pub stations: Vec<StationShare>,
}

impl PipelineStep {
    /// Splits `total_days` among stations.
    ///
    /// Returns `None` when the department should stay one block: no
    /// stations, or any station would round below one working day.
    pub fn split_days(&self, total_days: u32) -> Option<Vec<(SubStage, u32)>> {
        let (last, head) = self.stations.split_last()?;
        let mut days: Vec<(SubStage, u32)> = Vec::with_capacity(self.stations.len());
        let mut used = 0u32;
        for s in head {
            let d = (s.share * total_days as f64).round() as u32;
            if d < 1 {
                return None;
            }
            used += d;
            days.push((s.stage, d));
        }
        let rest = total_days.checked_sub(used)?;
        if rest < 1 {
            return None;
        }
        days.push((last.stage, rest));
        Some(days)
    }

    /// Department completion derived from station completion.
    ///
    /// `None` if no station reported progress.
    pub fn station_progress(&self, reported: &BTreeMap<SubStage, f64>) -> Option<f64> {
        if !self.stations.iter().any(|s| reported.contains_key(&s.stage)) {
            return None;
        }
        Some(
            self.stations
                .iter()
                .map(|s| s.share * reported.get(&s.stage).copied().unwrap_or(0.0))
                .sum(),
        )
    }
}

/// Ordered departments for one job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedPipeline {
    /// Steps in visiting order.
    pub steps: Vec<PipelineStep>,
}

impl ResolvedPipeline {
    /// Departments in visiting order.
    pub fn departments(&self) -> Vec<Department> {
        self.steps.iter().map(|s| s.department).collect()
    }

    /// First department to schedule.
    pub fn first(&self) -> Option<Department> {
        self.steps.first().map(|s| s.department)
    }

    /// Step for a department.
    pub fn step(&self, department: Department) -> Option<&PipelineStep> {
        self.steps.iter().find(|s| s.department == department)
    }

    /// Whether nothing is left to schedule.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Resolves job pipelines against a configuration.
#[derive(Debug, Clone, Copy)]
pub struct PipelineResolver<'a> {
    config: &'a ShopConfig,
}

impl<'a> PipelineResolver<'a> {
    /// Creates a resolver.
    pub fn new(config: &'a ShopConfig) -> Self {
        Self { config }
    }

    /// Departments left for `job`, in order.
    ///
    /// Empty if the job's current department is not in the pipeline.
    pub fn resolve(&self, job: &Job) -> ResolvedPipeline {
        let Some(start) = self.config.pipeline_index(job.current_department) else {
            return ResolvedPipeline::default();
        };

        let steps = self.config.pipeline[start..]
            .iter()
            .copied()
            .filter(|d| *d == job.current_department || !job.skipped_departments.contains(d))
            .map(|department| PipelineStep {
                department,
                stations: if department == Department::Welding {
                    self.station_split(job)
                } else {
                    Vec::new()
                },
            })
            .collect();

        ResolvedPipeline { steps }
    }

    /// Station shares of the welding department for `job`.
    pub fn station_split(&self, job: &Job) -> Vec<StationShare> {
        let welding = &self.config.welding;
        if job.category != welding.category {
            return Vec::new();
        }

        let description = job.description.to_lowercase();
        if !welding.frame_keyword.is_empty()
            && description.contains(&welding.frame_keyword.to_lowercase())
        {
            return vec![StationShare {
                stage: welding.frame_stage,
                share: 1.0,
            }];
        }

        let quantity = job.quantity.max(1) as f64;
        let efforts: Vec<(SubStage, f64)> = welding
            .stations
            .iter()
            .map(|s| {
                let factor: f64 = welding
                    .keyword_factors
                    .iter()
                    .filter(|k| k.stage == s.stage && description.contains(&k.keyword.to_lowercase()))
                    .map(|k| k.factor)
                    .product();
                (s.stage, (s.setup + s.per_unit * quantity) * factor)
            })
            .collect();

        let total: f64 = efforts.iter().map(|(_, e)| e).sum();
        if total <= 0.0 {
            return Vec::new();
        }

        efforts
            .into_iter()
            .map(|(stage, effort)| StationShare {
                stage,
                share: effort / total,
            })
            .collect()
    }
}
