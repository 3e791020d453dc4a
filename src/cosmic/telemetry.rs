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

use crate::mechanics::thrust_to_weight;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Osculating orbit of the vessel around its reference body, as reported at one tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrbitSnapshot {
    /// Gravitational parameter of the reference body, in m^3/s^2
    pub gm_m3_s2: f64,
    /// Surface gravity of the reference body, in m/s^2
    pub surface_gravity_m_s2: f64,
    /// Apoapsis radius from the center of the body, in meters
    pub apoapsis_radius_m: f64,
    /// Periapsis radius from the center of the body, in meters
    pub periapsis_radius_m: f64,
    /// Periapsis altitude above the mean surface, in meters
    pub periapsis_altitude_m: f64,
    /// Semi-major axis, in meters
    pub sma_m: f64,
    pub eccentricity: f64,
    /// Inclination, in degrees
    pub inclination_deg: f64,
    /// Seconds until the next apoapsis passage
    pub time_to_apoapsis_s: f64,
    /// Seconds until the next periapsis passage
    pub time_to_periapsis_s: f64,
}

/// Everything the guidance needs from the vessel for one control tick.
///
/// A snapshot is produced by the vessel once per tick and is never mutated: all the guidance
/// computations of a tick read from the same snapshot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Altitude above sea level, in meters
    pub mean_altitude_m: f64,
    /// Altitude above the terrain, in meters
    pub surface_altitude_m: f64,
    /// Apoapsis altitude above sea level, in meters
    pub apoapsis_altitude_m: f64,
    /// Vertical speed in the body fixed frame, in m/s
    pub vertical_speed_m_s: f64,
    /// Compass heading, in degrees
    pub heading_deg: f64,
    /// Roll, in degrees
    pub roll_deg: f64,
    /// Total vessel mass, in kg
    pub mass_kg: f64,
    /// Thrust currently delivered by the engines, in Newtons
    pub thrust_n: f64,
    /// Thrust the active engines would deliver at full throttle, in Newtons
    pub available_thrust_n: f64,
    /// Combined specific impulse of the active engines, in seconds
    pub isp_s: f64,
    /// Universal time, in seconds
    pub ut_s: f64,
    pub orbit: OrbitSnapshot,
}

impl TelemetrySnapshot {
    /// Thrust to weight ratio at full available thrust, using the surface gravity of the body.
    pub fn available_twr(&self) -> f64 {
        thrust_to_weight(
            self.available_thrust_n,
            self.mass_kg,
            self.orbit.surface_gravity_m_s2,
        )
    }

    /// Thrust to weight ratio at the thrust currently delivered, using the surface gravity of the body.
    pub fn delivered_twr(&self) -> f64 {
        thrust_to_weight(self.thrust_n, self.mass_kg, self.orbit.surface_gravity_m_s2)
    }
}

impl fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UT {:.1} s: alt {:.0} m, Ap {:.0} m, vs {:.1} m/s, m {:.0} kg, F {:.0}/{:.0} N",
            self.ut_s,
            self.mean_altitude_m,
            self.apoapsis_altitude_m,
            self.vertical_speed_m_s,
            self.mass_kg,
            self.thrust_n,
            self.available_thrust_n
        )
    }
}
