//! Dashboard read-model: per-owner stats and productivity trends.
//!
//! Everything here is a pure fold over a snapshot of one owner's tasks, so
//! handlers can compute several views from a single store read.

mod trends;

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Category, Priority, Status, Task};

pub use trends::{productivity_trends, ProductivityTrends};

/// Count per enum value, zero-filled for values nobody holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Breakdown<K: Ord>(BTreeMap<K, u64>);

impl<K: Category> Breakdown<K> {
    pub fn tally(values: impl IntoIterator<Item = K>) -> Self {
        let mut counts: BTreeMap<K, u64> = K::ALL.iter().map(|k| (*k, 0)).collect();
        for value in values {
            *counts.entry(value).or_insert(0) += 1;
        }
        Self(counts)
    }

    pub fn get(&self, key: K) -> u64 {
        self.0.get(&key).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub user_id: Uuid,
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub pending_tasks: u64,
    pub completion_percentage: u32,
    pub priority_breakdown: Breakdown<Priority>,
    pub status_breakdown: Breakdown<Status>,
}

pub fn user_stats(user_id: Uuid, tasks: &[Task]) -> UserStats {
    let priority_breakdown = Breakdown::tally(tasks.iter().map(|t| t.priority));
    let status_breakdown = Breakdown::tally(tasks.iter().map(|t| t.status));

    let total_tasks = tasks.len() as u64;
    let completed_tasks = status_breakdown.get(Status::Completed);
    debug_assert_eq!(priority_breakdown.total(), total_tasks);

    UserStats {
        user_id,
        total_tasks,
        completed_tasks,
        pending_tasks: total_tasks - completed_tasks,
        completion_percentage: completion_percentage(completed_tasks, total_tasks),
        priority_breakdown,
        status_breakdown,
    }
}

/// Whole-number percentage, 0 for an empty set.
pub fn completion_percentage(completed: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round() as u32
}
