/*
    Ascent GNC, closed-loop launch and maneuver guidance
    Copyright (C) 2025-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use super::{GuidanceError, InvalidPitchProfileSnafu, InvalidTargetSnafu};
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;
use typed_builder::TypedBuilder;

/// Thrust below this value, in Newtons, is considered zero.
const ZERO_THRUST_N: f64 = 1e-6;

/// Quadratic pitch program `pitch = a h² + b h + c` (degrees, h in meters).
///
/// The default coefficients were fitted for a small two stage vehicle aiming at a 90 km orbit
/// around a Kerbin-sized body: 90° on the pad, bottoming out around 77 km. They are a vehicle
/// tuning, not physics.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
#[serde(default)]
pub struct PitchProfile {
    #[builder(default = 1.48272e-8)]
    pub a: f64,
    #[builder(default = -0.00229755)]
    pub b: f64,
    #[builder(default = 90.0)]
    pub c: f64,
    /// Floor of the commanded pitch, in degrees
    #[builder(default = 2.0)]
    pub min_pitch_deg: f64,
}

impl Default for PitchProfile {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PitchProfile {
    pub fn validate(&self) -> Result<(), GuidanceError> {
        ensure!(
            self.a.is_finite() && self.b.is_finite() && self.c.is_finite(),
            InvalidPitchProfileSnafu {
                reason: format!("non finite coefficients {self}")
            }
        );
        ensure!(
            (0.0..=90.0).contains(&self.min_pitch_deg),
            InvalidPitchProfileSnafu {
                reason: format!("minimum pitch {} is not in [0; 90]", self.min_pitch_deg)
            }
        );
        Ok(())
    }

    /// Altitude of the bottom of the curve, if the parabola opens upward.
    pub fn vertex_altitude_m(&self) -> Option<f64> {
        if self.a > 0.0 {
            Some(-self.b / (2.0 * self.a))
        } else {
            None
        }
    }

    /// Pitch above the horizon, in degrees, to command at the provided altitude.
    ///
    /// Past the bottom of the parabola, the pitch is held at its lowest value instead of rising
    /// again. The result is floored at `min_pitch_deg` and never exceeds 90, even when the floor
    /// itself does.
    pub fn pitch_for_altitude(&self, altitude_m: f64) -> f64 {
        let mut h = altitude_m.max(0.0);
        if let Some(vertex) = self.vertex_altitude_m() {
            if vertex > 0.0 {
                h = h.min(vertex);
            }
        }
        let pitch = self.a * h * h + self.b * h + self.c;
        if pitch.is_nan() {
            return self.min_pitch_deg.min(90.0);
        }
        pitch.max(self.min_pitch_deg).min(90.0)
    }
}

impl fmt::Display for PitchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pitch = {:e} h² + {:e} h + {} (>= {}°)",
            self.a, self.b, self.c, self.min_pitch_deg
        )
    }
}

/// Target orbit and launch azimuth of one ascent.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuidanceTarget {
    /// Apoapsis altitude above sea level at which the powered ascent ends, in meters
    pub target_apoapsis_m: f64,
    /// Compass heading of the ascent, in degrees
    pub compass_heading_deg: f64,
}

/// Whether the current apoapsis is above the target one.
pub fn apoapsis_reached(current_apoapsis_m: f64, target_apoapsis_m: f64) -> bool {
    current_apoapsis_m > target_apoapsis_m
}

/// Whether the thrust has read zero for `every_n_ticks` consecutive ticks, `zero_thrust_ticks`
/// counting the current one.
pub fn should_advance_stage(
    current_thrust_n: f64,
    zero_thrust_ticks: u32,
    every_n_ticks: u32,
) -> bool {
    current_thrust_n <= ZERO_THRUST_N && zero_thrust_ticks >= every_n_ticks.max(1)
}

/// Debounces the "thrust is zero" condition before staging.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StagingMonitor {
    every_n_ticks: u32,
    zero_thrust_ticks: u32,
}

impl StagingMonitor {
    pub fn new(every_n_ticks: u32) -> Self {
        Self {
            every_n_ticks,
            zero_thrust_ticks: 0,
        }
    }

    /// Records the thrust of this tick and returns whether the next stage must be activated.
    /// The counter restarts after firing, so a stage that never lights up is retried every N ticks.
    pub fn sample(&mut self, thrust_n: f64) -> bool {
        if thrust_n > ZERO_THRUST_N {
            self.zero_thrust_ticks = 0;
            return false;
        }
        self.zero_thrust_ticks = self.zero_thrust_ticks.saturating_add(1);
        if should_advance_stage(thrust_n, self.zero_thrust_ticks, self.every_n_ticks) {
            self.zero_thrust_ticks = 0;
            true
        } else {
            false
        }
    }

    pub fn zero_thrust_ticks(&self) -> u32 {
        self.zero_thrust_ticks
    }
}

/// Stateless ascent guidance: a pitch program toward a target apoapsis along a fixed heading.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AscentGuidance {
    pub target: GuidanceTarget,
    pub profile: PitchProfile,
}

impl AscentGuidance {
    pub fn new(target: GuidanceTarget, profile: PitchProfile) -> Result<Self, GuidanceError> {
        ensure!(
            target.target_apoapsis_m > 0.0,
            InvalidTargetSnafu {
                target_m: target.target_apoapsis_m
            }
        );
        profile.validate()?;
        Ok(Self { target, profile })
    }

    pub fn pitch_for_altitude(&self, altitude_m: f64) -> f64 {
        self.profile.pitch_for_altitude(altitude_m)
    }

    pub fn heading_deg(&self) -> f64 {
        self.target.compass_heading_deg
    }

    pub fn apoapsis_reached(&self, current_apoapsis_m: f64) -> bool {
        apoapsis_reached(current_apoapsis_m, self.target.target_apoapsis_m)
    }
}

#[test]
fn default_profile_shape() {
    let profile = PitchProfile::default();
    assert_eq!(profile.pitch_for_altitude(0.0), 90.0);
    let vertex = profile.vertex_altitude_m().unwrap();
    assert!((vertex - 77_477.0).abs() < 1.0, "vertex at {vertex}");
    // Between ~69 km and the vertex, the raw curve dips under the floor.
    assert_eq!(profile.pitch_for_altitude(75_000.0), 2.0);
    // Above the vertex the raw parabola climbs back above 3°, but the command stays on the floor.
    assert_eq!(profile.pitch_for_altitude(90_000.0), 2.0);
    assert_eq!(profile.pitch_for_altitude(-50.0), 90.0);
}

#[test]
fn floor_above_vertical_is_capped() {
    let profile = PitchProfile::builder().min_pitch_deg(95.0).build();
    assert_eq!(profile.pitch_for_altitude(1_000.0), 90.0);
    assert_eq!(profile.pitch_for_altitude(80_000.0), 90.0);

    let profile = PitchProfile::builder().min_pitch_deg(f64::NAN).build();
    for altitude_m in [0.0, 10_000.0, 75_000.0, 200_000.0] {
        let pitch = profile.pitch_for_altitude(altitude_m);
        assert!(pitch <= 90.0, "{pitch} deg at {altitude_m} m");
    }

    let profile = PitchProfile::builder().a(f64::NAN).min_pitch_deg(120.0).build();
    assert_eq!(profile.pitch_for_altitude(1_000.0), 90.0);
}

#[test]
fn staging_is_debounced() {
    let mut monitor = StagingMonitor::new(3);
    assert!(!monitor.sample(0.0));
    assert!(!monitor.sample(0.0));
    // A single tick of thrust resets the count.
    assert!(!monitor.sample(1000.0));
    assert!(!monitor.sample(0.0));
    assert!(!monitor.sample(0.0));
    assert!(monitor.sample(0.0));
    assert_eq!(monitor.zero_thrust_ticks(), 0);
}
