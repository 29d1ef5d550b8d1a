use serde::{Deserialize, Serialize};

/// Nutrition goal driving calorie targets and recipe filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
  FatLoss,
  #[default]
  Maintenance,
  MuscleGain,
}

impl Goal {
  pub fn as_str(&self) -> &'static str {
    match self {
      Goal::FatLoss => "fat_loss",
      Goal::Maintenance => "maintenance",
      Goal::MuscleGain => "muscle_gain",
    }
  }

  /// Lenient parse: anything unrecognized falls back to maintenance
  pub fn parse_or_default(raw: &str) -> Self {
    raw.parse().unwrap_or_default()
  }

  pub fn default_calorie_target(&self) -> i64 {
    match self {
      Goal::FatLoss => 1800,
      Goal::Maintenance => 2200,
      Goal::MuscleGain => 2800,
    }
  }
}

impl std::fmt::Display for Goal {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for Goal {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "fat_loss" => Ok(Goal::FatLoss),
      "maintenance" => Ok(Goal::Maintenance),
      "muscle_gain" => Ok(Goal::MuscleGain),
      other => Err(format!("Unknown goal: {}", other)),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
  pub name: String,
  pub goal: Goal,
  pub daily_calorie_target: i64,
}

impl Default for Profile {
  fn default() -> Self {
    Self {
      name: "User".to_string(),
      goal: Goal::Maintenance,
      daily_calorie_target: Goal::Maintenance.default_calorie_target(),
    }
  }
}
