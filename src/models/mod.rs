pub mod interaction;
pub mod meal;
pub mod profile;
pub mod workout;

pub use interaction::Interaction;
pub use meal::{CalorieSummary, Meal, MealEstimate};
pub use profile::{Goal, Profile};
pub use workout::{NewWorkout, Workout};
