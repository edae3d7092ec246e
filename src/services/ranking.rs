//! Credit ranking and ratio helpers.
//!
//! Everything here is pure: callers load members and per-member counters from
//! the store and these functions turn them into ordered standings.

use crate::db::MemberTaskCounts;
use crate::models::member::Member;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// A member with its derived task statistics and 1-based position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMember {
    pub rank: usize,
    #[serde(flatten)]
    pub member: Member,
    pub total_credits: i64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Podium {
    pub first_place: Option<RankedMember>,
    pub second_place: Option<RankedMember>,
    pub third_place: Option<RankedMember>,
}

/// Percentage of completed tasks, unrounded. Zero when `total` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn completion_rate(completed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let completed = completed.min(total);
    completed as f64 * 100.0 / total as f64
}

/// Credits descending, then name (case-insensitive), then id.
fn standing_order(a: &RankedMember, b: &RankedMember) -> Ordering {
    b.total_credits
        .cmp(&a.total_credits)
        .then_with(|| {
            a.member
                .name
                .to_lowercase()
                .cmp(&b.member.name.to_lowercase())
        })
        .then_with(|| a.member.id.cmp(&b.member.id))
}

/// Ranks every member. Members without any task rank with zero credits.
#[must_use]
pub fn rank_members(
    members: Vec<Member>,
    counts: &HashMap<i32, MemberTaskCounts>,
) -> Vec<RankedMember> {
    let mut ranked: Vec<RankedMember> = members
        .into_iter()
        .map(|member| {
            let stats = counts.get(&member.id).copied().unwrap_or_default();
            RankedMember {
                rank: 0,
                total_credits: stats.completed_credits,
                total_tasks: stats.total_tasks,
                completed_tasks: stats.completed_tasks,
                completion_rate: completion_rate(
                    u64::try_from(stats.completed_tasks).unwrap_or(0),
                    u64::try_from(stats.total_tasks).unwrap_or(0),
                ),
                member,
            }
        })
        .collect();

    ranked.sort_by(standing_order);
    for (index, entry) in ranked.iter_mut().enumerate() {
        entry.rank = index + 1;
    }
    ranked
}

#[must_use]
pub fn podium(ranked: &[RankedMember]) -> Podium {
    Podium {
        first_place: ranked.first().cloned(),
        second_place: ranked.get(1).cloned(),
        third_place: ranked.get(2).cloned(),
    }
}
