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

use super::{GuidanceError, InvalidGainSnafu, InvalidIntegralSnafu, InvalidOutputLimitsSnafu};
use crate::cosmic::TelemetrySnapshot;
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;
use typed_builder::TypedBuilder;

/// Which thrust is used to compute the current thrust to weight ratio.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TwrSource {
    /// Full available thrust of the active engines.
    #[default]
    Available,
    /// Thrust delivered at the current throttle setting.
    Delivered,
}

impl TwrSource {
    /// Current thrust to weight ratio of the snapshot according to this source.
    pub fn twr(&self, snapshot: &TelemetrySnapshot) -> f64 {
        match self {
            TwrSource::Available => snapshot.available_twr(),
            TwrSource::Delivered => snapshot.delivered_twr(),
        }
    }
}

/// Tuning of the throttle controller.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Integral gain
    #[builder(default = 1.0)]
    pub ki: f64,
    /// Value of the integral accumulator at construction, the first output is `ki * initial_integral`
    #[builder(default = 1.0)]
    pub initial_integral: f64,
    /// Lowest throttle ever commanded
    #[builder(default = 0.01)]
    pub min: f64,
    /// Highest throttle ever commanded
    #[builder(default = 1.0)]
    pub max: f64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Integral-only throttle controller with anti-windup.
///
/// The output is the integral of the error scaled by the gain, clamped to the output limits. The
/// integral stops accumulating whenever the output is saturated at the limit the error pushes
/// toward, so that leaving saturation does not first require unwinding a huge integral.
#[derive(Clone, Debug, PartialEq)]
pub struct ThrottleController {
    ki: f64,
    integral: f64,
    output_limits: (f64, f64),
}

impl ThrottleController {
    /// Builds a new controller. The gain must be finite and positive, and the limits finite and
    /// ordered.
    pub fn new(ki: f64, initial_integral: f64, min: f64, max: f64) -> Result<Self, GuidanceError> {
        ensure!(ki.is_finite() && ki > 0.0, InvalidGainSnafu { ki });
        ensure!(
            initial_integral.is_finite(),
            InvalidIntegralSnafu {
                integral: initial_integral
            }
        );
        ensure!(
            min.is_finite() && max.is_finite() && min <= max,
            InvalidOutputLimitsSnafu { min, max }
        );
        Ok(Self {
            ki,
            integral: initial_integral,
            output_limits: (min, max),
        })
    }

    pub fn from_config(cfg: &ThrottleConfig) -> Result<Self, GuidanceError> {
        Self::new(cfg.ki, cfg.initial_integral, cfg.min, cfg.max)
    }

    /// Feeds the error (target minus current) accumulated over `dt_s` seconds and returns the
    /// throttle to command.
    ///
    /// The returned output is computed from the integral before this error is accumulated. A
    /// non-positive (or non-finite) `dt_s` does not integrate anything.
    pub fn update(&mut self, error: f64, dt_s: f64) -> f64 {
        let output = self.raw_output();
        let (min, max) = self.output_limits;

        let may_rise = output < max || error <= 0.0;
        let may_fall = output > min || error >= 0.0;
        if dt_s > 0.0 && dt_s.is_finite() && error.is_finite() && may_rise && may_fall {
            self.integral += error * dt_s;
        }

        output.clamp(min, max)
    }

    /// Clamped output for the current integral, without updating anything.
    pub fn output(&self) -> f64 {
        let (min, max) = self.output_limits;
        self.raw_output().clamp(min, max)
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn output_limits(&self) -> (f64, f64) {
        self.output_limits
    }

    fn raw_output(&self) -> f64 {
        self.ki * self.integral
    }
}

impl fmt::Display for ThrottleController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "I-controller (Ki = {}) in [{}; {}] at {:.3}",
            self.ki,
            self.output_limits.0,
            self.output_limits.1,
            self.output()
        )
    }
}
