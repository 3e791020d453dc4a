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

/*! # ascent-gnc

Closed-loop guidance, throttle control and maneuver execution for a vehicle commanded
through a remote vehicle-control service.

The crate never talks to the vehicle directly: everything goes through the [`vessel::Vessel`]
and [`vessel::Clock`] traits, so the same guidance runs against a live connection or a scripted
simulation in tests.
*/

/// Vis-viva and rocket equation helpers, and the vector angle used to detect burn overshoot.
pub mod mechanics;

/// Telemetry snapshots and physical constants.
pub mod cosmic;

/// The interface to the externally controlled vehicle, and the clock used for all waiting.
pub mod vessel;

/// Throttle control and the ascent pitch program.
pub mod guidance;

/// Mission design: maneuver planning, burn execution, and the ascent and launch drivers.
pub mod md;

/// Configuration loading.
pub mod io;

mod errors;
/// Functions which may fail return an error rather than panic, and the end-to-end drivers gather them here.
pub use self::errors::GncError;

#[macro_use]
extern crate log;
extern crate hifitime;
extern crate nalgebra as na;

/// Re-export of hifitime
pub mod time {
    pub use hifitime::*;
}

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
}

/// Re-export some useful things
pub use self::cosmic::TelemetrySnapshot;
pub use self::md::{AscentSession, BurnExecutor, ManeuverPlan, ManeuverPlanner};
