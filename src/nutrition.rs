//! Calorie estimation and recipe suggestions
//!
//! Meal descriptions are parsed item by item ("150g chicken breast, 1 banana")
//! against a small local food table. Nothing here touches the database.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

use crate::error::AppResult;
use crate::models::Goal;

/// ---------------------------------------------------------------------------
/// Food Table
/// ---------------------------------------------------------------------------

/// kcal per 100 g (or 100 ml)
const FOOD_CALORIES_PER_100G: &[(&str, f64)] = &[
  ("almonds", 579.0),
  ("apple", 52.0),
  ("avocado", 160.0),
  ("banana", 89.0),
  ("beef", 250.0),
  ("bread", 265.0),
  ("broccoli", 34.0),
  ("brown rice cooked", 112.0),
  ("cheese", 402.0),
  ("chicken breast", 165.0),
  ("chickpeas cooked", 164.0),
  ("egg", 155.0),
  ("greek yogurt", 59.0),
  ("lentils cooked", 116.0),
  ("milk", 42.0),
  ("oats", 389.0),
  ("olive oil", 884.0),
  ("orange", 47.0),
  ("pasta cooked", 131.0),
  ("peanut butter", 588.0),
  ("potato", 77.0),
  ("rice cooked", 130.0),
  ("salmon", 208.0),
  ("spinach", 23.0),
  ("sweet potato", 86.0),
  ("tofu", 76.0),
  ("whey protein", 400.0),
];

/// Typical weight of one item when no unit is given ("2 eggs")
const FOOD_UNIT_GRAMS: &[(&str, f64)] = &[
  ("apple", 182.0),
  ("avocado", 150.0),
  ("banana", 118.0),
  ("bread", 30.0),
  ("egg", 50.0),
  ("orange", 131.0),
  ("potato", 170.0),
  ("sweet potato", 130.0),
];

/// Grams per household unit
const UNIT_GRAMS: &[(&str, f64)] = &[
  ("cup", 240.0),
  ("tbsp", 15.0),
  ("tablespoon", 15.0),
  ("tsp", 5.0),
  ("teaspoon", 5.0),
  ("scoop", 30.0),
  ("slice", 30.0),
  ("egg", 50.0),
  ("banana", 118.0),
  ("apple", 182.0),
];

const FOOD_ALIASES: &[(&str, &str)] = &[
  ("rice", "rice cooked"),
  ("brown rice", "brown rice cooked"),
  ("lentils", "lentils cooked"),
  ("chickpeas", "chickpeas cooked"),
  ("pasta", "pasta cooked"),
  ("yogurt", "greek yogurt"),
  ("chicken", "chicken breast"),
  ("eggs", "egg"),
  ("protein powder", "whey protein"),
];

const DEFAULT_UNIT_GRAMS: f64 = 100.0;

fn lookup(table: &[(&str, f64)], key: &str) -> Option<f64> {
  table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn calories_per_100g(food: &str) -> Option<f64> {
  lookup(FOOD_CALORIES_PER_100G, food)
}

fn item_regex() -> &'static Regex {
  static ITEM_RE: OnceLock<Regex> = OnceLock::new();
  ITEM_RE.get_or_init(|| {
    Regex::new(
      r"^\s*(?:(?P<qty>\d+(?:\.\d+)?)\s*)?(?:(?P<unit>g|gram|grams|kg|ml|cup|cups|tbsp|tablespoon|tablespoons|tsp|teaspoon|teaspoons|scoop|scoops|slice|slices|egg|eggs|banana|bananas|apple|apples)\s+)?(?P<food>[a-z ]+)\s*$",
    )
    .expect("food item pattern is valid")
  })
}

/// ---------------------------------------------------------------------------
/// Calorie Estimation
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalorieEstimate {
  /// Rounded to one decimal
  pub total: f64,
  /// One line per item: either "<item> -> N kcal" or why it was skipped
  pub details: Vec<String>,
}

/// Map free-text food names onto table keys
pub fn normalize_food_name(food: &str) -> String {
  let food = food.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();

  let normalized = FOOD_ALIASES
    .iter()
    .find(|(alias, _)| *alias == food)
    .map(|(_, target)| target.to_string())
    .unwrap_or(food);

  if calories_per_100g(&normalized).is_none() {
    if let Some(singular) = normalized.strip_suffix('s') {
      if calories_per_100g(singular).is_some() {
        return singular.to_string();
      }
    }
  }
  normalized
}

/// Singular form of a matched unit ("cups" -> "cup")
fn canonical_unit(unit: &str) -> &str {
  match unit {
    "gram" | "grams" => "g",
    "cups" => "cup",
    "tablespoons" => "tablespoon",
    "teaspoons" => "teaspoon",
    "scoops" => "scoop",
    "slices" => "slice",
    "eggs" => "egg",
    "bananas" => "banana",
    "apples" => "apple",
    other => other,
  }
}

fn item_grams(qty: f64, unit: Option<&str>, food: &str) -> f64 {
  match unit.map(canonical_unit) {
    None => match lookup(FOOD_UNIT_GRAMS, food) {
      Some(per_item) => qty * per_item,
      None => qty,
    },
    Some("g") | Some("ml") => qty,
    Some("kg") => qty * 1000.0,
    Some(other) => qty * lookup(UNIT_GRAMS, other).unwrap_or(DEFAULT_UNIT_GRAMS),
  }
}

/// Estimate calories for a comma-separated meal description
pub fn estimate_calories(description: &str) -> CalorieEstimate {
  let mut total = 0.0;
  let mut details = Vec::new();

  for raw_item in description.split(',').map(str::trim).filter(|s| !s.is_empty()) {
    let lowered = raw_item.to_lowercase();
    let Some(caps) = item_regex().captures(&lowered) else {
      details.push(format!("Skipped '{}' (format not recognized)", raw_item));
      continue;
    };

    let qty = caps
      .name("qty")
      .and_then(|m| m.as_str().parse::<f64>().ok())
      .unwrap_or(1.0);
    let unit = caps.name("unit").map(|m| m.as_str());
    let food = normalize_food_name(caps.name("food").map(|m| m.as_str()).unwrap_or_default());

    let Some(kcal_per_100g) = calories_per_100g(&food) else {
      details.push(format!("Skipped '{}' (food not in local database)", raw_item));
      continue;
    };

    let cals = item_grams(qty, unit, &food) / 100.0 * kcal_per_100g;
    total += cals;
    details.push(format!("{} -> {:.0} kcal", raw_item, cals));
  }

  CalorieEstimate {
    total: (total * 10.0).round() / 10.0,
    details,
  }
}

/// ---------------------------------------------------------------------------
/// Recipes
/// ---------------------------------------------------------------------------

const EMBEDDED_RECIPES: &str = include_str!("data/recipes.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
  pub name: String,
  #[serde(default)]
  pub meal_type: String,
  #[serde(default)]
  pub goal_tags: Vec<String>,
  #[serde(default)]
  pub calories: f64,
  #[serde(default)]
  pub protein_g: f64,
  #[serde(default)]
  pub carbs_g: f64,
  #[serde(default)]
  pub fat_g: f64,
  #[serde(default)]
  pub ingredients: Vec<String>,
  #[serde(default)]
  pub steps: Vec<String>,
}

/// Load recipes from a JSON file, or the embedded set when no path is given
pub fn load_recipes(path: Option<&Path>) -> AppResult<Vec<Recipe>> {
  let recipes = match path {
    Some(p) => {
      let raw = std::fs::read_to_string(p)?;
      serde_json::from_str(&raw)?
    }
    None => serde_json::from_str(EMBEDDED_RECIPES)?,
  };
  Ok(recipes)
}

/// Recipes matching the goal and optional filters, highest protein first.
///
/// Unknown goals fall back to maintenance; a calorie cap of zero means no cap.
pub fn recipe_suggestions(
  recipes: &[Recipe],
  goal: &str,
  max_calories: Option<i64>,
  meal_type: Option<&str>,
) -> Vec<Recipe> {
  let goal = Goal::parse_or_default(goal);
  let meal_type = meal_type.map(str::trim).filter(|m| !m.is_empty());

  let mut matches: Vec<Recipe> = recipes
    .iter()
    .filter(|r| r.goal_tags.iter().any(|t| t == goal.as_str()))
    .filter(|r| meal_type.map_or(true, |m| r.meal_type.eq_ignore_ascii_case(m)))
    .filter(|r| match max_calories {
      Some(cap) if cap > 0 => r.calories <= cap as f64,
      _ => true,
    })
    .cloned()
    .collect();

  matches.sort_by(|a, b| b.protein_g.total_cmp(&a.protein_g));
  matches
}
