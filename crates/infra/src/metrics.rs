//! Derived operational metrics.

use std::collections::HashSet;

use serde::Serialize;

use unitdesk_assignments::{Assignment, AssignmentStatus};
use unitdesk_catalog::{Performer, PerformerStatus, Service};

/// Metrics computed from one consistent snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub services_count: usize,
    pub performers_count: usize,
    pub available_count: usize,
    pub active_assignments_count: usize,
    pub completed_count: usize,
    /// Services, whatever their status, without an active assignment.
    pub pending: usize,
    /// Percentage, always within `0..=100`.
    pub utilization: u8,
}

impl Metrics {
    pub fn compute(services: &[Service], performers: &[Performer], assignments: &[Assignment]) -> Self {
        let active: Vec<&Assignment> = assignments
            .iter()
            .filter(|a| a.status() == AssignmentStatus::Active)
            .collect();

        let covered: HashSet<&str> = active.iter().map(|a| a.service_id().as_str()).collect();
        let pending = services
            .iter()
            .filter(|s| !covered.contains(s.id_typed().as_str()))
            .count();

        Self {
            services_count: services.len(),
            performers_count: performers.len(),
            available_count: performers
                .iter()
                .filter(|p| p.status() == PerformerStatus::Available)
                .count(),
            active_assignments_count: active.len(),
            completed_count: assignments
                .iter()
                .filter(|a| a.status() == AssignmentStatus::Completed)
                .count(),
            pending,
            utilization: utilization(active.len(), performers.len()),
        }
    }
}

/// `round(active / performers × 100)`, 0 without performers, capped at 100.
///
/// Several assignments per performer can push the raw ratio past 100.
pub fn utilization(active: usize, performers: usize) -> u8 {
    if performers == 0 {
        return 0;
    }
    let pct = (active as f64 / performers as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utilization_rounds_half_up() {
        assert_eq!(utilization(1, 3), 33);
        assert_eq!(utilization(2, 3), 67);
        assert_eq!(utilization(1, 8), 13);
    }

    #[test]
    fn utilization_is_zero_without_performers() {
        assert_eq!(utilization(0, 0), 0);
        assert_eq!(utilization(5, 0), 0);
    }

    #[test]
    fn utilization_is_capped() {
        assert_eq!(utilization(7, 2), 100);
    }

    #[test]
    fn empty_snapshot_is_all_zero() {
        let m = Metrics::compute(&[], &[], &[]);
        assert_eq!(m.services_count, 0);
        assert_eq!(m.pending, 0);
        assert_eq!(m.utilization, 0);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn utilization_stays_in_bounds(active in 0usize..10_000, performers in 0usize..10_000) {
                let u = utilization(active, performers);
                prop_assert!(u <= 100);
                if performers == 0 {
                    prop_assert_eq!(u, 0);
                }
                if active <= performers && performers > 0 {
                    let exact = active as f64 / performers as f64 * 100.0;
                    prop_assert!((u as f64 - exact).abs() <= 0.5);
                }
            }
        }
    }
}
