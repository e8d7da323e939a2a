//! Fixed vocabularies: the weekly workout plan, the amalan checklist and the
//! wallet categories.
//!
//! The weekday → workout mapping lives only here. Both the daily accessor and
//! the schema migrator call [`WorkoutType::for_weekday`].

use chrono::Weekday;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkoutType {
    ChestTriceps,
    Core,
    LegsGlutes,
    ShouldersBack,
    FullBodyLight,
    CoreStretching,
    FullWorkout,
}

impl WorkoutType {
    pub const ALL: [WorkoutType; 7] = [
        WorkoutType::ChestTriceps,
        WorkoutType::Core,
        WorkoutType::LegsGlutes,
        WorkoutType::ShouldersBack,
        WorkoutType::FullBodyLight,
        WorkoutType::CoreStretching,
        WorkoutType::FullWorkout,
    ];

    pub fn for_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => WorkoutType::ChestTriceps,
            Weekday::Tue => WorkoutType::Core,
            Weekday::Wed => WorkoutType::LegsGlutes,
            Weekday::Thu => WorkoutType::ShouldersBack,
            Weekday::Fri => WorkoutType::FullBodyLight,
            Weekday::Sat => WorkoutType::CoreStretching,
            Weekday::Sun => WorkoutType::FullWorkout,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkoutType::ChestTriceps => "chest-triceps",
            WorkoutType::Core => "core",
            WorkoutType::LegsGlutes => "legs-glutes",
            WorkoutType::ShouldersBack => "shoulders-back",
            WorkoutType::FullBodyLight => "full-body-light",
            WorkoutType::CoreStretching => "core-stretching",
            WorkoutType::FullWorkout => "full-workout",
        }
    }

    pub fn details(self) -> WorkoutDetails {
        match self {
            WorkoutType::ChestTriceps => WorkoutDetails {
                workout_type: self,
                weekday: Weekday::Mon,
                label: "Chest & Triceps",
                duration: 10,
                exercises: &[
                    "Push-up",
                    "Knee push-up",
                    "Diamond push-up",
                    "Plank shoulder tap",
                ],
                work_secs: 40,
                rest_secs: 20,
                rounds: 2,
                focus: None,
            },
            WorkoutType::Core => WorkoutDetails {
                workout_type: self,
                weekday: Weekday::Tue,
                label: "Core",
                duration: 10,
                exercises: &["Sit-up", "Leg raise", "Russian twist", "Plank"],
                work_secs: 40,
                rest_secs: 20,
                rounds: 2,
                focus: None,
            },
            WorkoutType::LegsGlutes => WorkoutDetails {
                workout_type: self,
                weekday: Weekday::Wed,
                label: "Legs & Glutes",
                duration: 10,
                exercises: &["Squat", "Alternating lunges", "Wall sit", "Calf raise"],
                work_secs: 40,
                rest_secs: 20,
                rounds: 2,
                focus: None,
            },
            WorkoutType::ShouldersBack => WorkoutDetails {
                workout_type: self,
                weekday: Weekday::Thu,
                label: "Shoulders & Back",
                duration: 10,
                exercises: &["Arm circle", "Wide push-up", "Superman hold", "Plank raise"],
                work_secs: 40,
                rest_secs: 20,
                rounds: 2,
                focus: None,
            },
            WorkoutType::FullBodyLight => WorkoutDetails {
                workout_type: self,
                weekday: Weekday::Fri,
                label: "Light Full Body",
                duration: 10,
                exercises: &["Jumping jack", "Squat", "Light push-up", "Plank"],
                work_secs: 40,
                rest_secs: 20,
                rounds: 2,
                focus: Some("Keep it easy, active recovery"),
            },
            WorkoutType::CoreStretching => WorkoutDetails {
                workout_type: self,
                weekday: Weekday::Sat,
                label: "Core + Stretching",
                duration: 10,
                exercises: &[
                    "Plank",
                    "Slow mountain climber",
                    "Thigh, back and shoulder stretch",
                ],
                work_secs: 30,
                rest_secs: 30,
                rounds: 2,
                focus: Some("Recovery"),
            },
            WorkoutType::FullWorkout => WorkoutDetails {
                workout_type: self,
                weekday: Weekday::Sun,
                label: "Full Workout",
                duration: 40,
                exercises: &[
                    "Warm-up (5 min): light jumping jack, arm and leg swings",
                    "Main set (20-25 min): push-up, squat, lunges, sit-up, mountain climber, plank",
                    "Cool-down (5-10 min): full body stretch",
                ],
                work_secs: 40,
                rest_secs: 20,
                rounds: 4,
                focus: Some("Full session"),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDetails {
    pub workout_type: WorkoutType,
    #[serde(serialize_with = "serialize_weekday")]
    pub weekday: Weekday,
    pub label: &'static str,
    /// Minutes.
    pub duration: u32,
    pub exercises: &'static [&'static str],
    pub work_secs: u32,
    pub rest_secs: u32,
    pub rounds: u32,
    pub focus: Option<&'static str>,
}

fn serialize_weekday<S: serde::Serializer>(weekday: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&weekday.to_string())
}

/// The plan in calendar order, Monday first.
pub fn weekly_plan() -> Vec<WorkoutDetails> {
    WorkoutType::ALL.iter().map(|kind| kind.details()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AmalanFlag {
    DzikirPagi,
    DzikirPetang,
    Tilawah,
    SholatDhuha,
    SholatTahajud,
    Sedekah,
}

impl AmalanFlag {
    pub const ALL: [AmalanFlag; 6] = [
        AmalanFlag::DzikirPagi,
        AmalanFlag::DzikirPetang,
        AmalanFlag::Tilawah,
        AmalanFlag::SholatDhuha,
        AmalanFlag::SholatTahajud,
        AmalanFlag::Sedekah,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AmalanFlag::DzikirPagi => "Morning dhikr",
            AmalanFlag::DzikirPetang => "Evening dhikr",
            AmalanFlag::Tilawah => "Quran recitation",
            AmalanFlag::SholatDhuha => "Dhuha prayer",
            AmalanFlag::SholatTahajud => "Tahajjud prayer",
            AmalanFlag::Sedekah => "Charity",
        }
    }
}

pub const INCOME_CATEGORIES: [&str; 4] = ["Salary", "Bonus", "Gift", "Other"];

pub const EXPENSE_CATEGORIES: [&str; 6] = [
    "Food",
    "Transport",
    "Shopping",
    "Entertainment",
    "Health",
    "Other",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_weekday_maps_to_its_catalog_entry() {
        for weekday in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ] {
            assert_eq!(WorkoutType::for_weekday(weekday).details().weekday, weekday);
        }
    }

    #[test]
    fn sunday_is_the_long_session() {
        assert_eq!(WorkoutType::FullWorkout.details().duration, 40);
        assert_eq!(WorkoutType::Core.details().duration, 10);
        assert_eq!(weekly_plan().len(), 7);
    }

    #[test]
    fn workout_type_uses_kebab_case_on_disk() {
        let json = serde_json::to_string(&WorkoutType::LegsGlutes).unwrap();
        assert_eq!(json, "\"legs-glutes\"");
        for kind in WorkoutType::ALL {
            assert_eq!(serde_json::to_string(&kind).unwrap(), format!("\"{}\"", kind.as_str()));
        }
    }
}
