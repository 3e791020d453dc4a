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

use snafu::prelude::*;

mod throttle;
pub use throttle::{ThrottleConfig, ThrottleController, TwrSource};

mod ascent;
pub use ascent::{
    apoapsis_reached, should_advance_stage, AscentGuidance, GuidanceTarget, PitchProfile,
    StagingMonitor,
};

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum GuidanceError {
    #[snafu(display("throttle output limits [{min}; {max}] are invalid"))]
    InvalidOutputLimits { min: f64, max: f64 },
    #[snafu(display("throttle gain {ki} must be finite and positive"))]
    InvalidGain { ki: f64 },
    #[snafu(display("initial throttle integral {integral} is not finite"))]
    InvalidIntegral { integral: f64 },
    #[snafu(display("pitch profile is invalid: {reason}"))]
    InvalidPitchProfile { reason: String },
    #[snafu(display("target apoapsis must be positive, got {target_m} m"))]
    InvalidTarget { target_m: f64 },
}
