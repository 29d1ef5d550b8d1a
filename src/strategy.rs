//! Adaptive Response Strategy Selection
//!
//! A small bandit over a fixed set of coaching styles:
//! - each arm is scored by its mean observed reward plus an optimistic bonus
//!   that shrinks as the arm collects rated interactions
//! - with probability epsilon a uniformly random arm is returned instead
//!
//! Everything here is a pure function of aggregated reward statistics. The
//! caller fetches the aggregates and persists whichever strategy is chosen.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
/// Strategy: the arms of the bandit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Concise,
    Motivational,
    Analytical,
}

impl Strategy {
    /// Enumeration order; ties in scoring resolve to the earliest arm
    pub const ALL: [Strategy; 3] = [
        Strategy::Concise,
        Strategy::Motivational,
        Strategy::Analytical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Concise => "concise",
            Strategy::Motivational => "motivational",
            Strategy::Analytical => "analytical",
        }
    }

    /// Style line appended to the coach system prompt
    pub fn style_instruction(&self) -> &'static str {
        match self {
            Strategy::Concise => "Keep responses compact and actionable. Use short bullet points.",
            Strategy::Motivational => {
                "Use an energetic coaching tone with strong encouragement and clear next action."
            }
            Strategy::Analytical => {
                "Use data-first explanation with reasoning from trends and specific metrics."
            }
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "concise" => Ok(Self::Concise),
            "motivational" => Ok(Self::Motivational),
            "analytical" => Ok(Self::Analytical),
            _ => Err(format!("Unknown strategy: {}", s)),
        }
    }
}

// ---------------------------------------------------------------------------
/// Reward statistics
// ---------------------------------------------------------------------------

/// One row of the grouped reward query, before validation
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RewardAggregate {
    pub strategy: Option<String>,
    /// Mean over rated interactions only; NULL when none are rated
    pub avg_reward: Option<f64>,
    pub reward_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyStat {
    pub strategy: Strategy,
    pub avg_reward: f64,
    pub reward_count: u64,
}

impl StrategyStat {
    pub fn empty(strategy: Strategy) -> Self {
        Self {
            strategy,
            avg_reward: 0.0,
            reward_count: 0,
        }
    }
}

/// Build one stat per arm (in enumeration order) from raw aggregates.
///
/// Rows naming an unknown strategy are ignored. Arms without rated
/// interactions get an average of 0.
pub fn collect_stats(rows: &[RewardAggregate]) -> Vec<StrategyStat> {
    let mut stats: Vec<StrategyStat> = Strategy::ALL.iter().map(|s| StrategyStat::empty(*s)).collect();

    for row in rows {
        let Some(strategy) = row.strategy.as_deref().and_then(|s| s.parse::<Strategy>().ok()) else {
            continue;
        };
        let count = row.reward_count.max(0) as u64;
        let avg = row.avg_reward.filter(|a| a.is_finite()).unwrap_or(0.0);
        if count == 0 {
            continue;
        }

        if let Some(stat) = stats.iter_mut().find(|s| s.strategy == strategy) {
            // Merge duplicates as a weighted mean
            let total = stat.reward_count + count;
            stat.avg_reward =
                (stat.avg_reward * stat.reward_count as f64 + avg * count as f64) / total as f64;
            stat.reward_count = total;
        }
    }

    stats
}

// ---------------------------------------------------------------------------
/// Scoring
// ---------------------------------------------------------------------------

/// avg_reward + sqrt(2 * ln(N + 1) / (n + 1))
pub fn score(stat: &StrategyStat, total_rewarded: u64) -> f64 {
    let bonus = (2.0 * ((total_rewarded + 1) as f64).ln() / (stat.reward_count + 1) as f64).sqrt();
    stat.avg_reward + bonus
}

/// Score every arm, in enumeration order
pub fn strategy_scores(stats: &[StrategyStat]) -> Vec<(Strategy, f64)> {
    let total: u64 = stats.iter().map(|s| s.reward_count).sum();

    Strategy::ALL
        .iter()
        .map(|arm| {
            let stat = stats
                .iter()
                .find(|s| s.strategy == *arm)
                .copied()
                .unwrap_or_else(|| StrategyStat::empty(*arm));
            (*arm, score(&stat, total))
        })
        .collect()
}

/// Exploitation branch: highest score, first arm wins ties
pub fn best_strategy(stats: &[StrategyStat]) -> Strategy {
    let mut best: Option<(Strategy, f64)> = None;
    for (arm, arm_score) in strategy_scores(stats) {
        match best {
            Some((_, best_score)) if arm_score <= best_score => {}
            _ => best = Some((arm, arm_score)),
        }
    }
    best.map(|(arm, _)| arm).unwrap_or(Strategy::Concise)
}

/// Choose a strategy for the next chat turn
pub fn select_strategy<R: Rng + ?Sized>(
    stats: &[StrategyStat],
    exploration_rate: f64,
    rng: &mut R,
) -> Strategy {
    if rng.gen::<f64>() < exploration_rate {
        let arm = *Strategy::ALL.choose(rng).unwrap_or(&Strategy::Concise);
        tracing::debug!(strategy = %arm, "exploring random strategy");
        return arm;
    }

    let arm = best_strategy(stats);
    tracing::debug!(strategy = %arm, scores = ?strategy_scores(stats), "exploiting best strategy");
    arm
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn stat(strategy: Strategy, avg_reward: f64, reward_count: u64) -> StrategyStat {
        StrategyStat {
            strategy,
            avg_reward,
            reward_count,
        }
    }

    fn aggregate(strategy: &str, avg: Option<f64>, count: i64) -> RewardAggregate {
        RewardAggregate {
            strategy: Some(strategy.to_string()),
            avg_reward: avg,
            reward_count: count,
        }
    }

    #[test]
    fn test_no_rewards_picks_first_arm() {
        let stats = collect_stats(&[]);
        assert_eq!(best_strategy(&stats), Strategy::Concise);

        for (_, s) in strategy_scores(&stats) {
            assert_eq!(s, 0.0);
        }

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(select_strategy(&stats, 0.0, &mut rng), Strategy::Concise);
        }
    }

    #[test]
    fn test_unrated_rows_do_not_change_first_arm_choice() {
        // Interactions exist but none are rated: AVG(reward) is NULL, COUNT is 0
        let rows = vec![
            aggregate("analytical", None, 0),
            aggregate("motivational", None, 0),
        ];
        let stats = collect_stats(&rows);
        assert_eq!(best_strategy(&stats), Strategy::Concise);
    }

    #[test]
    fn test_higher_reward_wins_with_equal_counts() {
        let stats = vec![
            stat(Strategy::Concise, 0.1, 10),
            stat(Strategy::Motivational, 0.8, 10),
            stat(Strategy::Analytical, -0.2, 10),
        ];
        assert_eq!(best_strategy(&stats), Strategy::Motivational);
    }

    #[test]
    fn test_score_formula() {
        // N = 4, n = 1: 0.5 + sqrt(2 * ln 5 / 2)
        let s = score(&stat(Strategy::Analytical, 0.5, 1), 4);
        let expected = 0.5 + (2.0 * 5f64.ln() / 2.0).sqrt();
        crate::assert_approx_eq!(s, expected, 1e-12);
    }

    #[test]
    fn test_under_sampled_arm_gets_bonus() {
        // Analytical has never been rated, so its bonus outweighs a modest average
        let stats = vec![
            stat(Strategy::Concise, 0.2, 20),
            stat(Strategy::Motivational, 0.2, 20),
            stat(Strategy::Analytical, 0.0, 0),
        ];
        assert_eq!(best_strategy(&stats), Strategy::Analytical);
    }

    #[test]
    fn test_ties_resolve_in_enumeration_order() {
        let stats = vec![
            stat(Strategy::Concise, 0.0, 3),
            stat(Strategy::Motivational, 0.5, 3),
            stat(Strategy::Analytical, 0.5, 3),
        ];
        assert_eq!(best_strategy(&stats), Strategy::Motivational);
    }

    #[test]
    fn test_unknown_strategies_are_ignored() {
        let rows = vec![
            aggregate("shouty", Some(1.0), 50),
            aggregate("analytical", Some(0.5), 2),
        ];
        let stats = collect_stats(&rows);
        assert_eq!(stats.len(), 3);
        let total: u64 = stats.iter().map(|s| s.reward_count).sum();
        assert_eq!(total, 2);
        assert_eq!(stats, collect_stats(&[aggregate("analytical", Some(0.5), 2)]));
    }

    #[test]
    fn test_full_exploration_visits_every_arm() {
        let stats = vec![stat(Strategy::Concise, 1.0, 100)];
        let mut rng = StdRng::seed_from_u64(42);
        let seen: HashSet<Strategy> = (0..300)
            .map(|_| select_strategy(&stats, 1.0, &mut rng))
            .collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_strategy_round_trips_through_str() {
        for arm in Strategy::ALL {
            assert_eq!(arm.as_str().parse::<Strategy>(), Ok(arm));
        }
        assert!("verbose".parse::<Strategy>().is_err());
    }
}
