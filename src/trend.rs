//! Trend engine: streaks, load momentum and coaching text
//!
//! Pure functions over rows already fetched from the workout log. Callers pass
//! "today" explicitly so results are reproducible.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

use crate::config::CoachTuning;
use crate::models::workout::normalize_exercise;
use crate::models::Workout;

/// ---------------------------------------------------------------------------
/// Fixed Coaching Text
/// ---------------------------------------------------------------------------

pub const BEGINNER_ROUTINE: &str = "No workout history yet. Start with 3 full-body sessions/week: \
squat, push, pull, hinge, core (3 sets each, moderate effort).";

const DELOAD_ADVICE: &str = "Recovery signal is high. Run a deload for 5-7 days: reduce volume by ~20%.";
const HOLD_ADVICE: &str = "Keep load steady and improve movement quality this week.";
const WEEKLY_SPLIT: &str =
  "Weekly split suggestion: 2 strength days, 1 hypertrophy day, 1 conditioning session.";

const MOTIVATION_UPWARD: &str =
  "Your loads are trending upward on multiple exercises. Stay patient and let compounding work.";
const MOTIVATION_DEFAULT: &str =
  "Every rep logged is data and progress. Get one focused workout in today and reset momentum.";

/// Most exercises named in a single suggestion line
const MAX_LISTED_EXERCISES: usize = 4;

/// Entries needed before an exercise gets a trend
const MIN_TREND_ENTRIES: usize = 4;
const TREND_WINDOW: usize = 3;

/// ---------------------------------------------------------------------------
/// Streak
/// ---------------------------------------------------------------------------

/// Consecutive days with at least one workout, counting back from today.
///
/// A missing log for today is forgiven when yesterday has one, so the streak
/// does not reset before the user has trained.
pub fn workout_streak(dates: &[NaiveDate], today: NaiveDate) -> u32 {
  if dates.is_empty() {
    return 0;
  }

  let logged: HashSet<NaiveDate> = dates.iter().copied().collect();
  let mut current = today;

  if !logged.contains(&today) {
    match today.pred_opt() {
      Some(yesterday) if logged.contains(&yesterday) => current = yesterday,
      _ => return 0,
    }
  }

  let mut streak = 0;
  while logged.contains(&current) {
    streak += 1;
    match current.pred_opt() {
      Some(prev) => current = prev,
      None => break,
    }
  }
  streak
}

/// ---------------------------------------------------------------------------
/// Load Trend
/// ---------------------------------------------------------------------------

/// Percent change of training load per exercise.
///
/// `history` must be ordered newest first. Exercises with fewer than four
/// entries, or whose older window averages zero load, are omitted.
pub fn exercise_load_trend(history: &[Workout]) -> BTreeMap<String, f64> {
  let mut per_exercise: BTreeMap<String, Vec<f64>> = BTreeMap::new();
  for workout in history {
    per_exercise
      .entry(normalize_exercise(&workout.exercise))
      .or_default()
      .push(workout.load());
  }

  per_exercise
    .into_iter()
    .filter_map(|(exercise, loads)| load_trend(&loads).map(|t| (exercise, t)))
    .collect()
}

/// Trend for one exercise's loads (newest first)
fn load_trend(loads: &[f64]) -> Option<f64> {
  if loads.len() < MIN_TREND_ENTRIES {
    return None;
  }

  let recent = mean(&loads[..TREND_WINDOW])?;
  let older_end = loads.len().min(TREND_WINDOW * 2);
  let older = mean(&loads[TREND_WINDOW..older_end])?;

  if older > 0.0 {
    Some((recent - older) / older * 100.0)
  } else {
    None
  }
}

fn mean(values: &[f64]) -> Option<f64> {
  if values.is_empty() {
    None
  } else {
    Some(values.iter().sum::<f64>() / values.len() as f64)
  }
}

/// Average RPE, skipping workouts without one
pub fn average_rpe(workouts: &[Workout]) -> Option<f64> {
  let rpes: Vec<f64> = workouts
    .iter()
    .filter_map(|w| w.rpe)
    .filter(|r| r.is_finite())
    .collect();
  mean(&rpes)
}

/// ---------------------------------------------------------------------------
/// Adaptive Routine
/// ---------------------------------------------------------------------------

/// Build the adaptive training plan as bullet lines.
///
/// `recent` holds workouts from the recent window (see
/// `CoachTuning::recent_window_days`); `trends` comes from
/// [`exercise_load_trend`] over the full history.
pub fn adaptive_routine(
  recent: &[Workout],
  trends: &BTreeMap<String, f64>,
  tuning: &CoachTuning,
) -> String {
  if recent.is_empty() {
    return BEGINNER_ROUTINE.to_string();
  }

  let threshold = tuning.progress_threshold_pct;
  let progressing: Vec<&str> = trends
    .iter()
    .filter(|(_, t)| **t >= threshold)
    .map(|(ex, _)| ex.as_str())
    .collect();
  let plateaued: Vec<&str> = trends
    .iter()
    .filter(|(_, t)| **t < threshold)
    .map(|(ex, _)| ex.as_str())
    .collect();

  let mut suggestions = Vec::new();

  // Fatigue overrides progression
  let high_fatigue = average_rpe(recent).is_some_and(|rpe| rpe >= tuning.deload_rpe);
  if high_fatigue {
    suggestions.push(DELOAD_ADVICE.to_string());
  } else if !progressing.is_empty() {
    suggestions.push(format!(
      "Progress is trending up. Add 2.5-5% load or 1 extra rep on: {}.",
      list_exercises(&progressing)
    ));
  } else {
    suggestions.push(HOLD_ADVICE.to_string());
  }

  if !plateaued.is_empty() {
    suggestions.push(format!(
      "For plateaued lifts ({}), add one back-off set at lighter weight.",
      list_exercises(&plateaued)
    ));
  }

  suggestions.push(WEEKLY_SPLIT.to_string());

  suggestions
    .iter()
    .map(|s| format!("- {}", s))
    .collect::<Vec<_>>()
    .join("\n")
}

/// Names are already alphabetical (BTreeMap order)
fn list_exercises(names: &[&str]) -> String {
  names
    .iter()
    .take(MAX_LISTED_EXERCISES)
    .copied()
    .collect::<Vec<_>>()
    .join(", ")
}

/// ---------------------------------------------------------------------------
/// Motivation
/// ---------------------------------------------------------------------------

pub fn motivation_message(streak: u32, trends: &BTreeMap<String, f64>) -> String {
  if streak >= 10 {
    return format!(
      "{}-day streak. Consistency is your superpower. Keep execution tight and recover hard.",
      streak
    );
  }
  if streak >= 3 {
    return format!(
      "{}-day streak active. You're building momentum; protect it with one solid session today.",
      streak
    );
  }

  let improving = trends.values().filter(|t| **t > 0.0).count();
  if improving >= 2 {
    return MOTIVATION_UPWARD.to_string();
  }

  MOTIVATION_DEFAULT.to_string()
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{mock_workout, today};
  use chrono::Duration;

  fn days_ago(n: i64) -> NaiveDate {
    today() - Duration::days(n)
  }

  /// Build newest-first history for one exercise from loads given as weight
  /// with sets = reps = 1
  fn history(exercise: &str, weights: &[f64]) -> Vec<Workout> {
    weights
      .iter()
      .enumerate()
      .map(|(i, w)| mock_workout(days_ago(i as i64), exercise, 1, 1, *w, Some(7.0)))
      .collect()
  }

  // --- streak -------------------------------------------------------------

  #[test]
  fn test_streak_empty_log() {
    assert_eq!(workout_streak(&[], today()), 0);
  }

  #[test]
  fn test_streak_today_and_yesterday() {
    let dates = vec![days_ago(0), days_ago(1)];
    assert_eq!(workout_streak(&dates, today()), 2);
  }

  #[test]
  fn test_streak_grace_for_today() {
    let dates = vec![days_ago(1), days_ago(2), days_ago(3)];
    assert_eq!(workout_streak(&dates, today()), 3);
  }

  #[test]
  fn test_streak_gap_before_today_resets() {
    let dates = vec![days_ago(2)];
    assert_eq!(workout_streak(&dates, today()), 0);
  }

  #[test]
  fn test_streak_stops_at_gap_and_ignores_duplicates() {
    let dates = vec![days_ago(0), days_ago(0), days_ago(1), days_ago(3), days_ago(4)];
    assert_eq!(workout_streak(&dates, today()), 2);
  }

  // --- load trend ---------------------------------------------------------

  #[test]
  fn test_trend_squat_example() {
    let rows = history("squat", &[100.0, 100.0, 100.0, 50.0, 50.0, 50.0]);
    let trends = exercise_load_trend(&rows);
    crate::assert_approx_eq!(trends["squat"], 100.0, 1e-9);

    let routine = adaptive_routine(&rows, &trends, &CoachTuning::default());
    assert!(routine.contains("Add 2.5-5% load or 1 extra rep on: squat."));
  }

  #[test]
  fn test_trend_requires_four_entries() {
    let rows = history("bench", &[80.0, 80.0, 70.0]);
    assert!(exercise_load_trend(&rows).is_empty());
  }

  #[test]
  fn test_trend_with_short_older_window() {
    // Four entries: older window is just the fourth load
    let rows = history("row", &[60.0, 60.0, 60.0, 50.0]);
    crate::assert_approx_eq!(exercise_load_trend(&rows)["row"], 20.0, 1e-9);

    // Five entries: older window averages the remaining two
    let rows = history("row", &[60.0, 60.0, 60.0, 40.0, 60.0]);
    crate::assert_approx_eq!(exercise_load_trend(&rows)["row"], 20.0, 1e-9);
  }

  #[test]
  fn test_trend_only_uses_six_most_recent() {
    let rows = history("deadlift", &[90.0, 90.0, 90.0, 100.0, 100.0, 100.0, 1.0, 1.0]);
    crate::assert_approx_eq!(exercise_load_trend(&rows)["deadlift"], -10.0, 1e-9);
  }

  #[test]
  fn test_trend_omits_zero_older_load() {
    let rows = history("plank", &[10.0, 10.0, 10.0, 0.0, 0.0, 0.0]);
    assert!(!exercise_load_trend(&rows).contains_key("plank"));
  }

  #[test]
  fn test_trend_missing_values_count_as_zero() {
    let mut rows = history("press", &[40.0, 40.0, 40.0, 40.0]);
    rows[3].weight = None;
    // Older window is a single zero-load entry, so the exercise is omitted
    assert!(exercise_load_trend(&rows).is_empty());
  }

  #[test]
  fn test_trend_groups_normalized_names() {
    let mut rows = history("squat", &[100.0, 100.0, 100.0, 50.0]);
    rows[0].exercise = "  Squat ".to_string();
    rows[2].exercise = "SQUAT".to_string();
    let trends = exercise_load_trend(&rows);
    assert_eq!(trends.len(), 1);
    crate::assert_approx_eq!(trends["squat"], 100.0, 1e-9);
  }

  // --- adaptive routine ---------------------------------------------------

  #[test]
  fn test_routine_without_recent_workouts() {
    let routine = adaptive_routine(&[], &BTreeMap::new(), &CoachTuning::default());
    assert_eq!(routine, BEGINNER_ROUTINE);
  }

  #[test]
  fn test_routine_deload_overrides_progress() {
    let mut rows = history("squat", &[100.0, 100.0, 100.0, 50.0, 50.0, 50.0]);
    for w in rows.iter_mut() {
      w.rpe = Some(9.0);
    }
    let trends = exercise_load_trend(&rows);
    let routine = adaptive_routine(&rows, &trends, &CoachTuning::default());

    assert!(routine.starts_with("- Recovery signal is high."));
    assert!(!routine.contains("Progress is trending up"));
    assert!(routine.ends_with(WEEKLY_SPLIT));
  }

  #[test]
  fn test_routine_ignores_missing_rpe() {
    let mut rows = history("squat", &[50.0, 50.0, 50.0, 50.0]);
    rows[0].rpe = Some(9.0);
    rows[1].rpe = None;
    rows[2].rpe = None;
    rows[3].rpe = Some(9.0);
    assert_eq!(average_rpe(&rows), Some(9.0));

    let routine = adaptive_routine(&rows, &BTreeMap::new(), &CoachTuning::default());
    assert!(routine.contains("deload"));
  }

  #[test]
  fn test_routine_lists_four_exercises_alphabetically() {
    let recent = history("squat", &[50.0]);
    let trends: BTreeMap<String, f64> = [
      ("squat", 12.0),
      ("bench", 5.0),
      ("row", 3.0),
      ("curl", 40.0),
      ("deadlift", 8.0),
      ("press", 1.0),
      ("lunge", -4.0),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), *v))
    .collect();

    let routine = adaptive_routine(&recent, &trends, &CoachTuning::default());
    let lines: Vec<&str> = routine.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(
      lines[0],
      "- Progress is trending up. Add 2.5-5% load or 1 extra rep on: bench, curl, deadlift, row."
    );
    assert_eq!(
      lines[1],
      "- For plateaued lifts (lunge, press), add one back-off set at lighter weight."
    );
    assert_eq!(lines[2], format!("- {}", WEEKLY_SPLIT));
  }

  #[test]
  fn test_routine_holds_when_nothing_progresses() {
    let rows = history("bench", &[50.0, 50.0, 50.0, 50.0]);
    let trends = exercise_load_trend(&rows);
    let routine = adaptive_routine(&rows, &trends, &CoachTuning::default());

    assert!(routine.contains(HOLD_ADVICE));
    assert!(routine.contains("For plateaued lifts (bench)"));
  }

  #[test]
  fn test_routine_respects_configured_threshold() {
    let recent = history("squat", &[50.0]);
    let trends: BTreeMap<String, f64> = [("squat".to_string(), 4.0)].into_iter().collect();
    let tuning = CoachTuning {
      progress_threshold_pct: 5.0,
      ..CoachTuning::default()
    };

    let routine = adaptive_routine(&recent, &trends, &tuning);
    assert!(routine.contains(HOLD_ADVICE));
    assert!(routine.contains("For plateaued lifts (squat)"));
  }

  // --- motivation ---------------------------------------------------------

  #[test]
  fn test_motivation_long_streak_wins_over_trends() {
    let trends: BTreeMap<String, f64> =
      [("squat".to_string(), 10.0), ("bench".to_string(), 5.0)].into_iter().collect();
    let msg = motivation_message(12, &trends);
    assert!(msg.starts_with("12-day streak. Consistency is your superpower."));
  }

  #[test]
  fn test_motivation_momentum_band() {
    let msg = motivation_message(3, &BTreeMap::new());
    assert!(msg.starts_with("3-day streak active."));
    let msg = motivation_message(9, &BTreeMap::new());
    assert!(msg.starts_with("9-day streak active."));
  }

  #[test]
  fn test_motivation_upward_trend_needs_two_positive() {
    let one: BTreeMap<String, f64> =
      [("squat".to_string(), 10.0), ("bench".to_string(), 0.0)].into_iter().collect();
    assert_eq!(motivation_message(1, &one), MOTIVATION_DEFAULT);

    let two: BTreeMap<String, f64> =
      [("squat".to_string(), 10.0), ("bench".to_string(), 0.5)].into_iter().collect();
    assert_eq!(motivation_message(1, &two), MOTIVATION_UPWARD);
  }

  #[test]
  fn test_motivation_default() {
    assert_eq!(motivation_message(0, &BTreeMap::new()), MOTIVATION_DEFAULT);
  }
}
