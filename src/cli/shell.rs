//! Interactive line-mode shell
//!
//! Each command prompts for its fields one line at a time; blank answers
//! take the documented default.

use chrono::NaiveDate;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::str::FromStr;

use crate::commands::{coach, local_today, nutrition, parse_date_or_today, profile, workouts};
use crate::db::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{CalorieSummary, Meal, NewWorkout, Workout};
use crate::nutrition::Recipe;

const PROMPT: &str = "nox> ";
const GOODBYE: &str = "Good session. Keep consistency high.";
const VIEW_WORKOUT_DAYS: i64 = 30;
const VIEW_WORKOUT_ROWS: usize = 20;
const MEAL_HISTORY_ROWS: i64 = 20;
const RECIPE_ROWS: usize = 5;

pub const HELP_TEXT: &str = "Commands:
  help                     Show commands
  dashboard                Show today's overview
  set-goal                 Set goal + calorie target
  log-workout              Log a workout session
  view-workouts            Show recent workouts
  adaptive-plan            Get adaptive training suggestions
  log-meal                 Log meal and calorie estimate
  meal-history             Show recent meals
  calorie-summary          Show calories for a date (default today)
  recipes                  Suggest recipes based on goal
  chat                     Ask the coach a question
  feedback                 Rate the coach's last reply
  exit                     Quit the app";

enum Flow {
  Continue,
  Exit,
}

/// ---------------------------------------------------------------------------
/// Rendering
/// ---------------------------------------------------------------------------

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
  value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn format_workout(w: &Workout) -> String {
  format!(
    "{} | {} | {}x{} @ {} | {} min | RPE {}",
    w.date,
    w.exercise,
    opt(w.sets),
    opt(w.reps),
    opt(w.weight),
    opt(w.duration_min),
    opt(w.rpe)
  )
}

pub fn format_meal(m: &Meal) -> String {
  format!(
    "{} | {} | {:.0} kcal | {}",
    m.date, m.meal_name, m.estimated_calories, m.description
  )
}

pub fn format_calorie_summary(summary: &CalorieSummary) -> String {
  let status = if summary.is_over() { "over" } else { "under" };
  format!(
    "Total calories: {:.0} kcal\nTarget: {} kcal\nYou are {:.0} kcal {} target.",
    summary.total,
    summary.target,
    summary.delta.abs(),
    status
  )
}

pub fn format_recipe(r: &Recipe) -> String {
  format!(
    "{} ({}) - {} kcal, P{} C{} F{}\nIngredients: {}\nSteps: {}",
    r.name,
    r.meal_type,
    r.calories,
    r.protein_g,
    r.carbs_g,
    r.fat_g,
    r.ingredients.join(", "),
    r.steps.join(" ")
  )
}

/// Blank input yields `default`
fn parse_or<T: FromStr>(raw: &str, default: T, field: &str) -> AppResult<T> {
  let raw = raw.trim();
  if raw.is_empty() {
    return Ok(default);
  }
  raw
    .parse()
    .map_err(|_| AppError::invalid(format!("Invalid {}: '{}'", field, raw)))
}

fn parse_optional<T: FromStr>(raw: &str, field: &str) -> AppResult<Option<T>> {
  let raw = raw.trim();
  if raw.is_empty() {
    return Ok(None);
  }
  raw
    .parse()
    .map(Some)
    .map_err(|_| AppError::invalid(format!("Invalid {}: '{}'", field, raw)))
}

/// ---------------------------------------------------------------------------
/// Shell
/// ---------------------------------------------------------------------------

pub struct Shell<'a> {
  state: &'a AppState,
  editor: DefaultEditor,
  history_path: Option<PathBuf>,
  last_interaction: Option<i64>,
}

impl<'a> Shell<'a> {
  pub fn new(state: &'a AppState) -> AppResult<Self> {
    let mut editor = DefaultEditor::new()?;

    let history_path = state
      .config
      .database_path
      .parent()
      .map(|dir| dir.join("shell_history.txt"));
    if let Some(path) = history_path.as_ref().filter(|p| p.exists()) {
      if let Err(e) = editor.load_history(path) {
        tracing::warn!(error = %e, "failed to load shell history");
      }
    }

    Ok(Self {
      state,
      editor,
      history_path,
      last_interaction: None,
    })
  }

  fn ask(&mut self, prompt: &str) -> AppResult<String> {
    Ok(self.editor.readline(prompt)?.trim().to_string())
  }

  fn ask_date(&mut self) -> AppResult<NaiveDate> {
    let raw = self.ask("Date (YYYY-MM-DD, blank=today): ")?;
    parse_date_or_today(Some(raw.as_str()))
  }

  pub async fn run(&mut self) -> AppResult<()> {
    println!("NOX: Fitness Coach + Nutrition Assistant");
    println!("Type 'help' to see commands.\n");

    loop {
      let line = match self.editor.readline(PROMPT) {
        Ok(line) => line,
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
          println!("{}", GOODBYE);
          break;
        }
        Err(e) => return Err(e.into()),
      };

      let command = line.trim().to_lowercase();
      if command.is_empty() {
        continue;
      }
      let _ = self.editor.add_history_entry(command.as_str());

      match self.dispatch(&command).await {
        Ok(Flow::Continue) => {}
        Ok(Flow::Exit) => break,
        Err(AppError::Readline(ReadlineError::Interrupted)) => println!("Cancelled.\n"),
        Err(e) => {
          tracing::debug!(error = ?e, command = %command, "shell command failed");
          println!("Error: {}\n", e);
        }
      }
    }

    if let Some(path) = &self.history_path {
      if let Err(e) = self.editor.save_history(path) {
        tracing::warn!(error = %e, "failed to save shell history");
      }
    }
    Ok(())
  }

  async fn dispatch(&mut self, command: &str) -> AppResult<Flow> {
    let state = self.state;
    let db = &state.db;

    match command {
      "exit" | "quit" => {
        println!("{}", GOODBYE);
        return Ok(Flow::Exit);
      }
      "help" => println!("{}\n", HELP_TEXT),
      "dashboard" => {
        let board = profile::dashboard(db, local_today()).await?;
        println!("\n{}\n", board.render());
      }
      "set-goal" => self.set_goal().await?,
      "log-workout" => self.log_workout().await?,
      "view-workouts" => {
        let rows = workouts::recent_workouts(db, VIEW_WORKOUT_DAYS, local_today()).await?;
        if rows.is_empty() {
          println!("No workouts logged yet.\n");
        } else {
          println!();
          for w in rows.iter().take(VIEW_WORKOUT_ROWS) {
            println!("{}", format_workout(w));
          }
          println!();
        }
      }
      "adaptive-plan" => {
        let plan = workouts::adaptive_plan(db, &state.config.tuning, local_today()).await?;
        println!("\nAdaptive Routine:\n{}\n", plan);
      }
      "log-meal" => self.log_meal().await?,
      "meal-history" => {
        let meals = nutrition::meal_history(db, MEAL_HISTORY_ROWS).await?;
        if meals.is_empty() {
          println!("No meals logged yet.\n");
        } else {
          println!();
          for m in &meals {
            println!("{}", format_meal(m));
          }
          println!();
        }
      }
      "calorie-summary" => {
        let date = self.ask_date()?;
        let summary = nutrition::calorie_summary(db, date).await?;
        println!("{}\n", format_calorie_summary(&summary));
      }
      "recipes" => self.recipes().await?,
      "chat" => self.chat().await?,
      "feedback" => self.feedback().await?,
      _ => println!("Unknown command. Type 'help'.\n"),
    }

    Ok(Flow::Continue)
  }

  async fn set_goal(&mut self) -> AppResult<()> {
    let goal = self.ask("Goal (fat_loss | maintenance | muscle_gain): ")?;
    let target = parse_optional::<i64>(&self.ask("Daily calorie target (blank for auto): ")?, "calorie target")?;
    let updated = profile::set_profile_goal(&self.state.db, &goal, target).await?;
    println!(
      "Goal updated: {} ({} kcal/day).\n",
      updated.goal, updated.daily_calorie_target
    );
    Ok(())
  }

  async fn log_workout(&mut self) -> AppResult<()> {
    let date = self.ask_date()?;
    let exercise = self.ask("Exercise: ")?;
    let sets = parse_or(&self.ask("Sets: ")?, 0, "sets")?;
    let reps = parse_or(&self.ask("Reps: ")?, 0, "reps")?;
    let weight = parse_or(&self.ask("Weight (kg/lb number only): ")?, 0.0, "weight")?;
    let duration_min = parse_or(&self.ask("Duration (minutes): ")?, 0, "duration")?;
    let rpe = parse_or(&self.ask("RPE (1-10): ")?, 7.0, "RPE")?;
    let notes = self.ask("Notes (optional): ")?;

    let workout = NewWorkout {
      date,
      exercise,
      sets,
      reps,
      weight,
      duration_min,
      rpe,
      notes,
    };
    workouts::log_workout(&self.state.db, &workout).await?;

    println!("Workout logged.");
    println!("{}\n", workouts::motivation(&self.state.db, local_today()).await?);
    Ok(())
  }

  async fn log_meal(&mut self) -> AppResult<()> {
    let date = self.ask_date()?;
    let meal_name = self.ask("Meal name (breakfast/lunch/dinner/snack): ")?;
    let description =
      self.ask("Foods (comma-separated, e.g., '150g chicken breast, 200g rice, 1 banana'): ")?;

    let estimate = nutrition::log_meal(&self.state.db, &meal_name, &description, date).await?;
    println!("Estimated calories: {:.0} kcal", estimate.estimated_calories);
    for detail in &estimate.details {
      println!("- {}", detail);
    }
    println!();
    Ok(())
  }

  async fn recipes(&mut self) -> AppResult<()> {
    let current = profile::get_profile(&self.state.db).await?;
    let goal = self.ask(&format!("Goal (blank uses profile={}): ", current.goal))?;
    let max_calories = parse_optional::<i64>(&self.ask("Max calories per meal (blank=no limit): ")?, "max calories")?;
    let meal_type = self.ask("Meal type (breakfast/lunch/dinner, blank=any): ")?;

    let picks = nutrition::recipes_for(
      &self.state.db,
      &self.state.recipes,
      Some(goal.as_str()),
      max_calories,
      Some(meal_type.as_str()),
      RECIPE_ROWS,
    )
    .await?;

    if picks.is_empty() {
      println!("No recipe match found. Try removing filters.\n");
      return Ok(());
    }
    println!();
    for recipe in &picks {
      println!("{}\n", format_recipe(recipe));
    }
    Ok(())
  }

  async fn chat(&mut self) -> AppResult<()> {
    let message = self.ask("You: ")?;
    println!("(thinking...)");
    let reply = coach::chat(self.state, &message, local_today()).await?;
    self.last_interaction = Some(reply.interaction_id);
    println!(
      "\nCoach [{} / #{}]:\n{}\n",
      reply.strategy, reply.interaction_id, reply.response
    );
    Ok(())
  }

  async fn feedback(&mut self) -> AppResult<()> {
    let prompt = match self.last_interaction {
      Some(id) => format!("Interaction id (blank={}): ", id),
      None => "Interaction id: ".to_string(),
    };
    let raw_id = self.ask(&prompt)?;
    let interaction_id = match (parse_optional::<i64>(&raw_id, "interaction id")?, self.last_interaction) {
      (Some(id), _) | (None, Some(id)) => id,
      (None, None) => return Err(AppError::invalid("interaction id is required")),
    };
    let reward = parse_optional::<f64>(&self.ask("Reward (-1 to 1): ")?, "reward")?
      .ok_or_else(|| AppError::invalid("reward is required"))?;
    let notes = self.ask("Notes (optional): ")?;

    let result = coach::feedback(&self.state.db, interaction_id, reward, &notes).await?;
    println!("Feedback saved (reward {}).\n", result.reward);
    Ok(())
  }
}
