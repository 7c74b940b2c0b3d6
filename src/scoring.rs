//! Group-size-weighted averages of evaluated work.
//!
//! A score earned in a group of `n` weighs `1/n`: the smaller the group, the more the
//! score says about the individual student.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::request::StatsSort;
use crate::model::student_stats::{StudentActivity, StudentStats};

pub const MIN_SCORE: i64 = 0;
pub const MAX_SCORE: i64 = 30;

/// One evaluated (or not yet evaluated) assignment as seen from a single student.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredAssignment {
    pub score: Option<i32>,
    pub group_size: i64,
}

pub fn is_valid_score(score: i64) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&score)
}

/// Rounds to two decimals, halves going up: `Int(100*x + 0.5) / 100`.
pub fn round_half_up_2(x: f64) -> f64 {
    ((100.0 * x) + 0.5).floor() / 100.0
}

/// Weighted average of `assignments`, or `None` when none of them has been evaluated.
///
/// Entries without a score or with a non-positive group size are skipped. Sums are
/// folded in input order and only the final value is rounded.
pub fn weighted_average(assignments: &[ScoredAssignment]) -> Option<f64> {
    let (weighted_sum, total_weight, n) = assignments
        .iter()
        .filter(|a| a.group_size > 0)
        .filter_map(|a| a.score.map(|s| (f64::from(s), 1.0 / a.group_size as f64)))
        .fold((0.0, 0.0, 0usize), |(sum, weights, n), (score, weight)| {
            (sum + score * weight, weights + weight, n + 1)
        });

    if n == 0 {
        return None;
    }

    Some(round_half_up_2(weighted_sum / total_weight))
}

pub fn student_stats(activity: StudentActivity) -> StudentStats {
    let weighted_average = weighted_average(&activity.scored);
    StudentStats {
        id: activity.student.id,
        name: activity.student.name,
        email: activity.student.email,
        open_assignments: activity.open_assignments,
        closed_assignments: activity.closed_assignments,
        total_assignments: activity.open_assignments + activity.closed_assignments,
        weighted_average,
    }
}

/// Name ascending, or total / average descending. Students without an average sort last.
pub fn sort_stats(stats: &mut [StudentStats], sort: StatsSort) {
    match sort {
        StatsSort::Name => stats.sort_by(|a, b| a.name.cmp(&b.name)),
        StatsSort::Total => stats.sort_by(|a, b| {
            b.total_assignments
                .cmp(&a.total_assignments)
                .then_with(|| a.name.cmp(&b.name))
        }),
        StatsSort::Average => stats.sort_by(|a, b| {
            match (a.weighted_average, b.weighted_average) {
                (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(|| a.name.cmp(&b.name))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user_info::{Role, UserInfo};

    fn scored(score: i32, group_size: i64) -> ScoredAssignment {
        ScoredAssignment {
            score: Some(score),
            group_size,
        }
    }

    fn stats(name: &str, total: i64, average: Option<f64>) -> StudentStats {
        StudentStats {
            id: 0,
            name: name.into(),
            email: format!("{name}@example.com"),
            open_assignments: total,
            closed_assignments: 0,
            total_assignments: total,
            weighted_average: average,
        }
    }

    #[test]
    fn no_evaluated_work_is_not_zero() {
        assert_eq!(weighted_average(&[]), None);
        assert_eq!(
            weighted_average(&[
                ScoredAssignment {
                    score: None,
                    group_size: 3
                },
                ScoredAssignment {
                    score: None,
                    group_size: 2
                },
            ]),
            None
        );
        assert_eq!(weighted_average(&[scored(0, 2)]), Some(0.0));
    }

    #[test]
    fn equal_groups_give_the_plain_mean() {
        assert_eq!(weighted_average(&[scored(30, 1)]), Some(30.0));
        assert_eq!(weighted_average(&[scored(30, 1), scored(0, 1)]), Some(15.0));
        assert_eq!(weighted_average(&[scored(18, 4), scored(24, 4)]), Some(21.0));
    }

    #[test]
    fn smaller_groups_weigh_more() {
        assert_eq!(weighted_average(&[scored(30, 1), scored(0, 3)]), Some(22.5));
        // (20/2 + 30/6) / (1/2 + 1/6) = 22.5
        assert_eq!(weighted_average(&[scored(20, 2), scored(30, 6)]), Some(22.5));
    }

    #[test]
    fn result_has_two_decimals() {
        // (25/2 + 18/3 + 30/4) / (1/2 + 1/3 + 1/4) = 26 / 1.0833.. = 24.0
        assert_eq!(
            weighted_average(&[scored(25, 2), scored(18, 3), scored(30, 4)]),
            Some(24.0)
        );
        // (10/2 + 21/3) / (1/2 + 1/3) = 14.4
        assert_eq!(weighted_average(&[scored(10, 2), scored(21, 3)]), Some(14.4));
        // (29 + 30 + 30) / 3 = 29.666..
        assert_eq!(
            weighted_average(&[scored(29, 2), scored(30, 2), scored(30, 2)]),
            Some(29.67)
        );
    }

    #[test]
    fn broken_entries_are_skipped() {
        assert_eq!(
            weighted_average(&[scored(30, 2), scored(0, 0), scored(0, -1)]),
            Some(30.0)
        );
    }

    #[test]
    fn input_order_does_not_change_the_result() {
        let forward = [scored(12, 2), scored(27, 5), scored(30, 3), scored(7, 6)];
        let mut backward = forward;
        backward.reverse();
        assert_eq!(weighted_average(&forward), weighted_average(&backward));
    }

    #[test]
    fn rounding_goes_half_up() {
        assert_eq!(round_half_up_2(22.125), 22.13);
        assert_eq!(round_half_up_2(22.124), 22.12);
        assert_eq!(round_half_up_2(0.0), 0.0);
    }

    #[test]
    fn scores_outside_zero_to_thirty_are_rejected() {
        assert!(is_valid_score(0));
        assert!(is_valid_score(30));
        assert!(!is_valid_score(-1));
        assert!(!is_valid_score(31));
    }

    #[test]
    fn stats_add_up_totals() {
        let s = student_stats(StudentActivity {
            student: UserInfo {
                id: 4,
                name: "Chiara".into(),
                email: "chiara@example.com".into(),
                role: Role::Student,
            },
            open_assignments: 2,
            closed_assignments: 1,
            scored: vec![scored(27, 3)],
        });
        assert_eq!(s.total_assignments, 3);
        assert_eq!(s.weighted_average, Some(27.0));
    }

    #[test]
    fn average_sort_puts_missing_averages_last() {
        let mut all = vec![
            stats("Bruno", 1, None),
            stats("Anna", 3, Some(12.5)),
            stats("Carla", 2, Some(28.0)),
        ];

        sort_stats(&mut all, StatsSort::Average);
        let names = all.iter().map(|s| s.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["Carla", "Anna", "Bruno"]);

        sort_stats(&mut all, StatsSort::Total);
        let names = all.iter().map(|s| s.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["Anna", "Carla", "Bruno"]);

        sort_stats(&mut all, StatsSort::Name);
        let names = all.iter().map(|s| s.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["Anna", "Bruno", "Carla"]);
    }
}
