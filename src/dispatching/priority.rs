//! Manual per-department priority.
//!
//! A manual rank only reorders the queue of the department it names.
//! Jobs queued for that department keep the set of positions they held
//! after rule sorting; ranked jobs move to the front of that set in rank
//! order, unranked ones follow in their existing order. Jobs queued
//! elsewhere do not move.

use std::collections::BTreeMap;

use crate::models::{Department, Job};

/// Reorders `order` (indices into `jobs`) by manual department ranks.
///
/// `queue_of` returns the department each job is queued for, i.e. the
/// first department the scheduler will place it in.
pub fn apply_manual_priorities<F>(order: &mut [usize], jobs: &[Job], queue_of: F)
where
    F: Fn(&Job) -> Option<Department>,
{
    let mut queues: BTreeMap<Department, Vec<usize>> = BTreeMap::new();
    for (pos, &idx) in order.iter().enumerate() {
        if let Some(dept) = queue_of(&jobs[idx]) {
            queues.entry(dept).or_default().push(pos);
        }
    }

    for (dept, positions) in queues {
        let rank_of = |idx: usize| {
            jobs[idx]
                .manual_priority
                .filter(|p| p.department == dept)
                .map(|p| p.rank)
        };
        let members: Vec<usize> = positions.iter().map(|&p| order[p]).collect();
        if members.iter().all(|&idx| rank_of(idx).is_none()) {
            continue;
        }

        let mut ranked: Vec<usize> = members
            .iter()
            .copied()
            .filter(|&idx| rank_of(idx).is_some())
            .collect();
        ranked.sort_by_key(|&idx| rank_of(idx));
        let unranked = members.iter().copied().filter(|&idx| rank_of(idx).is_none());

        for (pos, idx) in positions.into_iter().zip(ranked.into_iter().chain(unranked)) {
            order[pos] = idx;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn job(id: &str, dept: Department) -> Job {
        Job::new(id, Category::FabricatedMetal, 10.0).in_department(dept)
    }

    #[test]
    fn test_rank_moves_within_department_only() {
        let jobs = vec![
            job("L1", Department::Laser),
            job("W1", Department::Welding),
            job("L2", Department::Laser),
            job("L3", Department::Laser).with_manual_priority(Department::Laser, 1),
        ];
        let mut order = vec![0, 1, 2, 3];
        apply_manual_priorities(&mut order, &jobs, |j| Some(j.current_department));

        let ids: Vec<&str> = order.iter().map(|&i| jobs[i].id.as_str()).collect();
        // L3 takes the first laser slot, welding job keeps position 1
        assert_eq!(ids, vec!["L3", "W1", "L1", "L2"]);
    }

    #[test]
    fn test_ranks_sorted() {
        let jobs = vec![
            job("A", Department::Laser).with_manual_priority(Department::Laser, 5),
            job("B", Department::Laser),
            job("C", Department::Laser).with_manual_priority(Department::Laser, 2),
        ];
        let mut order = vec![0, 1, 2];
        apply_manual_priorities(&mut order, &jobs, |j| Some(j.current_department));
        let ids: Vec<&str> = order.iter().map(|&i| jobs[i].id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_rank_for_other_department_ignored() {
        let jobs = vec![
            job("A", Department::Laser),
            job("B", Department::Laser).with_manual_priority(Department::Welding, 1),
        ];
        let mut order = vec![0, 1];
        apply_manual_priorities(&mut order, &jobs, |j| Some(j.current_department));
        assert_eq!(order, vec![0, 1]);
    }
}
