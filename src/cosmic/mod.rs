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

use serde_derive::{Deserialize, Serialize};
use std::fmt;

mod telemetry;
pub use self::telemetry::{OrbitSnapshot, TelemetrySnapshot};

/// One of the two apsides of an orbit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Apsis {
    Apoapsis,
    Periapsis,
}

impl Apsis {
    /// Radius of this apsis (from the center of the body) on the provided orbit, in meters.
    pub fn radius_m(&self, orbit: &OrbitSnapshot) -> f64 {
        match self {
            Apsis::Apoapsis => orbit.apoapsis_radius_m,
            Apsis::Periapsis => orbit.periapsis_radius_m,
        }
    }

    /// Time until the vessel reaches this apsis, in seconds.
    pub fn time_to_s(&self, orbit: &OrbitSnapshot) -> f64 {
        match self {
            Apsis::Apoapsis => orbit.time_to_apoapsis_s,
            Apsis::Periapsis => orbit.time_to_periapsis_s,
        }
    }
}

impl fmt::Display for Apsis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Apsis::Apoapsis => write!(f, "apoapsis"),
            Apsis::Periapsis => write!(f, "periapsis"),
        }
    }
}
