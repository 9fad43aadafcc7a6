//! Built-in exercise routines, one per category.
//!
//! Lookups are case-insensitive. Unknown categories get a generic
//! warm-up / exercise / cool-down routine so playback can always start.

use crate::types::{Exercise, Routine};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Cached catalog - built once and reused for every lookup
static CATALOG: Lazy<BTreeMap<&'static str, Vec<Exercise>>> = Lazy::new(build_catalog);

/// Names of every built-in category, sorted
pub fn categories() -> Vec<&'static str> {
    CATALOG.keys().copied().collect()
}

/// Ordered exercises for a category
///
/// Never empty: unrecognized names return the three-item fallback list.
pub fn routine_for_category(name: &str) -> Vec<Exercise> {
    let key = name.trim().to_lowercase();
    match CATALOG.get(key.as_str()) {
        Some(exercises) => exercises.clone(),
        None => {
            tracing::debug!("Unknown routine category '{}', using fallback", name);
            fallback_routine()
        }
    }
}

/// Same as [`routine_for_category`], wrapped as a playable [`Routine`]
pub fn build_routine(name: &str) -> Routine {
    let category = name.trim().to_lowercase();
    let exercises = routine_for_category(&category);
    Routine::from_non_empty(category, exercises)
}

fn fallback_routine() -> Vec<Exercise> {
    vec![
        Exercise::timed(
            "Warm-up",
            "Light movement to raise your heart rate and loosen up.",
            60,
        ),
        Exercise::repetitions(
            "Exercise",
            "Bodyweight squats at a steady, controlled pace.",
            10,
        ),
        Exercise::timed(
            "Cool-down",
            "Slow breathing and gentle stretching.",
            60,
        ),
    ]
}

fn build_catalog() -> BTreeMap<&'static str, Vec<Exercise>> {
    let mut catalog = BTreeMap::new();

    catalog.insert(
        "cardio",
        vec![
            Exercise::timed(
                "Jumping Jacks",
                "Jump feet apart while raising arms overhead, then return.",
                30,
            ),
            Exercise::timed(
                "High Knees",
                "Run in place driving the knees up to hip height.",
                30,
            ),
            Exercise::repetitions(
                "Burpees",
                "Squat, kick back to a plank, return and jump up.",
                10,
            ),
            Exercise::timed(
                "Mountain Climbers",
                "From a plank, alternate driving knees toward the chest.",
                45,
            ),
            Exercise::timed("Butt Kicks", "Jog in place kicking heels toward glutes.", 30),
        ],
    );

    catalog.insert(
        "strength",
        vec![
            Exercise::repetitions(
                "Push-ups",
                "Keep a straight line from head to heels; chest to the floor.",
                12,
            ),
            Exercise::repetitions(
                "Squats",
                "Feet shoulder-width apart, hips back, thighs parallel.",
                15,
            ),
            Exercise::repetitions(
                "Lunges",
                "Step forward and lower the back knee; alternate legs.",
                12,
            ),
            Exercise::timed("Wall Sit", "Back against the wall, knees at ninety degrees.", 45),
            Exercise::repetitions(
                "Tricep Dips",
                "Hands on a chair edge, lower and press back up.",
                10,
            ),
        ],
    );

    catalog.insert(
        "yoga",
        vec![
            Exercise::timed(
                "Mountain Pose",
                "Stand tall, feet grounded, breathe evenly.",
                30,
            ),
            Exercise::timed(
                "Downward Dog",
                "Hips high, heels reaching toward the floor.",
                45,
            ),
            Exercise::timed(
                "Warrior II",
                "Front knee bent, arms extended, gaze over the front hand.",
                45,
            ),
            Exercise::timed("Tree Pose", "Balance on one foot, sole pressed to the inner leg.", 30),
            Exercise::timed("Child's Pose", "Kneel, sit back on heels, arms forward.", 60),
        ],
    );

    catalog.insert(
        "stretching",
        vec![
            Exercise::timed(
                "Neck Rolls",
                "Slowly roll the head in a full circle both ways.",
                30,
            ),
            Exercise::timed(
                "Shoulder Stretch",
                "Pull one arm across the chest; switch halfway.",
                30,
            ),
            Exercise::timed(
                "Hamstring Stretch",
                "Seated, reach toward your toes with a long spine.",
                45,
            ),
            Exercise::timed(
                "Quad Stretch",
                "Standing, pull one heel toward the glutes; switch halfway.",
                45,
            ),
            Exercise::timed(
                "Cat-Cow",
                "On hands and knees, alternate arching and rounding the back.",
                45,
            ),
        ],
    );

    catalog.insert(
        "hiit",
        vec![
            Exercise::timed("Squat Jumps", "Explode upward from a squat, land softly.", 40),
            Exercise::timed("Rest", "Breathe and shake out the legs.", 20),
            Exercise::timed("Plank Jacks", "From a plank, jump feet in and out.", 40),
            Exercise::timed("Rest", "Breathe and shake out the arms.", 20),
            Exercise::repetitions("Tuck Jumps", "Jump and pull both knees to the chest.", 8),
            Exercise::timed("Sprint in Place", "Maximum effort running on the spot.", 30),
        ],
    );

    catalog.insert(
        "core",
        vec![
            Exercise::timed("Plank", "Forearms down, body in a straight line.", 45),
            Exercise::repetitions("Crunches", "Lift the shoulders, keep the lower back down.", 15),
            Exercise::repetitions(
                "Russian Twists",
                "Seated and leaning back, rotate the torso side to side.",
                20,
            ),
            Exercise::timed("Side Plank", "Stack the feet, hips lifted; switch halfway.", 40),
            Exercise::repetitions("Leg Raises", "Lying flat, lift straight legs to vertical.", 12),
        ],
    );

    catalog
}

/// Validate the built-in catalog for consistency
///
/// Returns a list of validation errors, or empty Vec if valid.
pub fn validate_catalog() -> Vec<String> {
    let mut errors = Vec::new();

    for (category, exercises) in CATALOG.iter() {
        if exercises.is_empty() {
            errors.push(format!("Category '{}' has no exercises", category));
        }
        for (index, exercise) in exercises.iter().enumerate() {
            if exercise.name().is_empty() {
                errors.push(format!("Category '{}': exercise {} has no name", category, index));
            }
            if exercise.is_repetition_based() && exercise.repetition_count() == 0 {
                errors.push(format!(
                    "Category '{}': '{}' has zero repetitions",
                    category,
                    exercise.name()
                ));
            }
            if !exercise.is_repetition_based() && exercise.duration_seconds() == 0 {
                errors.push(format!(
                    "Category '{}': '{}' has zero duration",
                    category,
                    exercise.name()
                ));
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        assert_eq!(categories().len(), 6);
        assert!(categories().contains(&"cardio"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(routine_for_category("YOGA"), routine_for_category("yoga"));
        assert_eq!(routine_for_category("  Cardio "), routine_for_category("cardio"));
    }

    #[test]
    fn test_unknown_category_falls_back() {
        let exercises = routine_for_category("underwater basket weaving");
        assert_eq!(exercises.len(), 3);
        assert_eq!(exercises[0].name(), "Warm-up");
        assert_eq!(exercises[1].name(), "Exercise");
        assert_eq!(exercises[2].name(), "Cool-down");
    }

    #[test]
    fn test_empty_name_falls_back() {
        assert_eq!(routine_for_category("").len(), 3);
    }

    #[test]
    fn test_every_category_non_empty() {
        for category in categories() {
            assert!(!routine_for_category(category).is_empty(), "{}", category);
        }
    }

    #[test]
    fn test_build_routine_keeps_category() {
        let routine = build_routine("Strength");
        assert_eq!(routine.category(), "strength");
        assert_eq!(routine.len(), 5);
    }

    #[test]
    fn test_default_catalog_validates() {
        let errors = validate_catalog();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }
}
