//! Closed value sets for the `sport` and `visibility` updates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::StravaError;

macro_rules! sports {
    ($($variant:ident),+ $(,)?) => {
        /// Activity types the training-activities endpoint accepts.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Sport {
            $($variant),+
        }

        impl Sport {
            pub const ALL: &'static [Sport] = &[$(Sport::$variant),+];

            /// Canonical wire name, e.g. `"VirtualRide"`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Sport::$variant => stringify!($variant)),+
                }
            }
        }
    };
}

sports!(
    AlpineSki,
    BackcountrySki,
    Canoeing,
    Crossfit,
    EBikeRide,
    Elliptical,
    Golf,
    Handcycle,
    Hike,
    IceSkate,
    InlineSkate,
    Kayaking,
    Kitesurf,
    NordicSki,
    Ride,
    RockClimbing,
    RollerSki,
    Rowing,
    Run,
    Sail,
    Skateboard,
    Snowboard,
    Snowshoe,
    Soccer,
    StairStepper,
    StandUpPaddling,
    Surfing,
    Swim,
    Velomobile,
    VirtualRide,
    VirtualRun,
    Walk,
    WeightTraining,
    Wheelchair,
    Windsurf,
    Workout,
    Yoga,
);

impl FromStr for Sport {
    type Err = StravaError;

    /// Case-insensitive match against the canonical names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Sport::ALL
            .iter()
            .copied()
            .find(|sport| sport.as_str().to_lowercase() == lowered)
            .ok_or_else(|| StravaError::Validation(format!("unknown sport type {s:?}")))
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Everyone,
    FollowersOnly,
    OnlyMe,
}

impl Visibility {
    pub const ALL: &'static [Visibility] = &[
        Visibility::Everyone,
        Visibility::FollowersOnly,
        Visibility::OnlyMe,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Everyone => "everyone",
            Visibility::FollowersOnly => "followers_only",
            Visibility::OnlyMe => "only_me",
        }
    }
}

impl FromStr for Visibility {
    type Err = StravaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Visibility::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == lowered)
            .ok_or_else(|| {
                StravaError::Validation(format!(
                    "unknown visibility {s:?} (expected everyone, followers_only or only_me)"
                ))
            })
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
