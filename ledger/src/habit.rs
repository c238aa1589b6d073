//! Habit catalogue shared by the ledger and the verification pipeline.
//!
//! Each [`HabitType`] maps to exactly one [`HabitProfile`]: the ledger reads
//! titles and descriptions from it, the fitness checker reads its activity
//! policy, and the proof judge reads its acceptance bar. Nothing else in the
//! workspace keeps a per-habit literal map.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of habits a goal can be staked against.
///
/// Wire encoding is the numeric code (`0=Coding .. 4=Running`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum HabitType {
    Coding,
    Dsa,
    Gym,
    Yoga,
    Running,
}

impl HabitType {
    pub const ALL: [HabitType; 5] = [
        HabitType::Coding,
        HabitType::Dsa,
        HabitType::Gym,
        HabitType::Yoga,
        HabitType::Running,
    ];

    /// Numeric wire code
    pub fn code(self) -> u8 {
        match self {
            HabitType::Coding => 0,
            HabitType::Dsa => 1,
            HabitType::Gym => 2,
            HabitType::Yoga => 3,
            HabitType::Running => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn profile(self) -> &'static HabitProfile {
        &HABIT_PROFILES[self.code() as usize]
    }

    pub fn name(self) -> &'static str {
        self.profile().name
    }

    /// Habits whose evidence comes from public code activity
    pub fn is_code_habit(self) -> bool {
        matches!(self, HabitType::Coding | HabitType::Dsa)
    }

    /// Habits with an activity policy for fitness providers
    pub fn is_fitness_habit(self) -> bool {
        self.profile().fitness.is_some()
    }
}

impl From<HabitType> for u8 {
    fn from(habit: HabitType) -> Self {
        habit.code()
    }
}

impl TryFrom<u8> for HabitType {
    type Error = UnknownHabitCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        HabitType::from_code(code).ok_or(UnknownHabitCode(code))
    }
}

impl fmt::Display for HabitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raised when a wire code does not name a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown habit type code {0}")]
pub struct UnknownHabitCode(pub u8);

/// Minimum activity a fitness provider must report for a day to count.
#[derive(Debug, Clone, Serialize)]
pub struct FitnessPolicy {
    /// Provider activity-type codes that count toward the habit
    pub activity_codes: &'static [i64],
    /// Summed session minutes required
    pub min_minutes: u32,
    /// Alternate qualifying signal: daily step count
    pub min_steps: Option<u64>,
}

impl FitnessPolicy {
    pub fn counts_activity(&self, code: i64) -> bool {
        self.activity_codes.contains(&code)
    }

    pub fn is_met(&self, minutes: f64, steps: u64) -> bool {
        minutes >= f64::from(self.min_minutes) || self.min_steps.is_some_and(|min| steps >= min)
    }
}

/// Everything the system knows about one habit.
#[derive(Debug, Clone, Serialize)]
pub struct HabitProfile {
    pub habit: HabitType,
    /// Short display name used in summaries and prompts
    pub name: &'static str,
    /// Goal title recorded by the ledger
    pub title: &'static str,
    /// Goal description recorded by the ledger
    pub description: &'static str,
    /// Activity policy for fitness providers, if the habit has one
    pub fitness: Option<FitnessPolicy>,
    /// Kinds of proof the judge should expect
    pub evidence_kinds: &'static [&'static str],
    /// The bar a proof must clear to be accepted
    pub acceptance_bar: &'static str,
}

// Activity-type codes follow the Google Fit activity table.
const GYM_ACTIVITIES: &[i64] = &[13, 80, 97, 10, 35, 44, 48, 68, 74, 79, 88, 93, 98];
const YOGA_ACTIVITIES: &[i64] = &[100, 29, 58];
const RUNNING_ACTIVITIES: &[i64] = &[8, 56, 95, 7];

static HABIT_PROFILES: [HabitProfile; 5] = [
    HabitProfile {
        habit: HabitType::Coding,
        name: "Coding",
        title: "Level Up Your Coding Skills!",
        description: "Make one GitHub contribution daily",
        fitness: None,
        evidence_kinds: &[
            "GitHub contribution data (commits, pull requests, issues)",
            "screenshots of code",
            "links to repositories or commits",
            "a description of the work done",
        ],
        acceptance_bar: "The proof must show real coding work on the given date. \
            A single meaningful commit is enough; empty or trivial commits are not.",
    },
    HabitProfile {
        habit: HabitType::Dsa,
        name: "DSA",
        title: "Master DSA Skills",
        description: "Solve one LeetCode problem daily",
        fitness: None,
        evidence_kinds: &[
            "LeetCode, HackerRank or Codeforces submission screenshots",
            "links to solved problems",
            "code solutions",
            "problem statements with the user's solution",
        ],
        acceptance_bar: "The proof must show actual problem-solving effort on data structures \
            or algorithms. Merely viewing a problem does not count.",
    },
    HabitProfile {
        habit: HabitType::Gym,
        name: "Gym",
        title: "Gym Training Goal",
        description: "Complete daily workout sessions",
        fitness: Some(FitnessPolicy {
            activity_codes: GYM_ACTIVITIES,
            min_minutes: 20,
            min_steps: None,
        }),
        evidence_kinds: &[
            "fitness tracker data",
            "gym check-in screenshots",
            "workout photos",
            "workout log descriptions",
        ],
        acceptance_bar: "The proof must show a genuine gym session of at least 20 minutes \
            of exercise. Be reasonable, but reject fake or recycled proof.",
    },
    HabitProfile {
        habit: HabitType::Yoga,
        name: "Yoga",
        title: "Daily Yoga Practice",
        description: "Complete one yoga session daily",
        fitness: Some(FitnessPolicy {
            activity_codes: YOGA_ACTIVITIES,
            min_minutes: 15,
            min_steps: None,
        }),
        evidence_kinds: &[
            "fitness tracker data showing yoga activity",
            "screenshots from yoga apps",
            "photos of the practice",
            "a description of the poses or routine",
        ],
        acceptance_bar: "The proof must show a genuine yoga session of at least 15 minutes.",
    },
    HabitProfile {
        habit: HabitType::Running,
        name: "Running",
        title: "Running Challenge",
        description: "Achieve your daily running goals",
        fitness: Some(FitnessPolicy {
            activity_codes: RUNNING_ACTIVITIES,
            min_minutes: 10,
            min_steps: Some(3_000),
        }),
        evidence_kinds: &[
            "fitness tracker data (steps, distance, pace)",
            "running app screenshots",
            "GPS route maps",
            "photos from the run",
        ],
        acceptance_bar: "The proof must show a genuine run or jog of at least 1 km \
            or 10 minutes.",
    },
];
