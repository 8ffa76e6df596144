use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::Task;

/// Reported as the average completion time when nothing is completed.
pub const NOT_AVAILABLE: &str = "N/A";

const TREND_DAYS: i64 = 7;
const WEEK_DAYS: i64 = 7;
const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WeekActivity {
    pub created: u64,
    pub completed: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub current_week: WeekActivity,
    pub last_week: WeekActivity,
}

impl WeeklyStats {
    /// The week bucket `at` falls in: `[now - 7d, ..)` or `[now - 14d, now - 7d)`.
    fn bucket(&mut self, at: DateTime<Utc>, now: DateTime<Utc>) -> Option<&mut WeekActivity> {
        let current_start = now - Duration::days(WEEK_DAYS);
        let last_start = current_start - Duration::days(WEEK_DAYS);

        if at >= current_start {
            Some(&mut self.current_week)
        } else if at >= last_start {
            Some(&mut self.last_week)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub created: u64,
    pub completed: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityTrends {
    pub user_id: Uuid,
    pub tasks_per_day: Vec<DailyActivity>,
    pub weekly_stats: WeeklyStats,
    pub average_completion_time: String,
}

/// Daily and weekly activity as of `now`.
///
/// "Completed" activity is dated by [`Task::completion_time`]. Days are UTC
/// calendar days; the series always covers the seven days ending today.
pub fn productivity_trends(user_id: Uuid, tasks: &[Task], now: DateTime<Utc>) -> ProductivityTrends {
    let first_day = now.date_naive() - Duration::days(TREND_DAYS - 1);
    let mut tasks_per_day: Vec<DailyActivity> = (0..TREND_DAYS)
        .map(|offset| DailyActivity {
            date: first_day + Duration::days(offset),
            created: 0,
            completed: 0,
        })
        .collect();

    let mut weekly_stats = WeeklyStats::default();
    let mut completion_days = 0.0;
    let mut completed_count = 0u32;

    for task in tasks {
        if let Some(day) = day_slot(&mut tasks_per_day, first_day, task.created_at) {
            day.created += 1;
        }
        if let Some(week) = weekly_stats.bucket(task.created_at, now) {
            week.created += 1;
        }

        let Some(done_at) = task.completion_time() else {
            continue;
        };
        if let Some(day) = day_slot(&mut tasks_per_day, first_day, done_at) {
            day.completed += 1;
        }
        if let Some(week) = weekly_stats.bucket(done_at, now) {
            week.completed += 1;
        }

        let elapsed = (done_at - task.created_at).num_seconds().max(0);
        completion_days += elapsed as f64 / SECONDS_PER_DAY;
        completed_count += 1;
    }

    let average_completion_time = if completed_count == 0 {
        NOT_AVAILABLE.to_string()
    } else {
        format!("{:.1} days", completion_days / f64::from(completed_count))
    };

    ProductivityTrends {
        user_id,
        tasks_per_day,
        weekly_stats,
        average_completion_time,
    }
}

fn day_slot(
    days: &mut [DailyActivity],
    first_day: NaiveDate,
    at: DateTime<Utc>,
) -> Option<&mut DailyActivity> {
    let index = at.date_naive().signed_duration_since(first_day).num_days();
    usize::try_from(index).ok().and_then(|i| days.get_mut(i))
}
