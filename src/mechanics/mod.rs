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

use crate::linalg::Vector3;
use crate::vessel::Engine;
use snafu::prelude::*;

/// Below this norm, a vector is considered to have no direction.
const NEAR_ZERO_NORM: f64 = 1e-12;

/// Invalid physical inputs to the orbital mechanics helpers.
///
/// These are precondition violations: the operation that raised one is aborted and nothing is retried.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MechanicsError {
    #[snafu(display("gravitational parameter must be positive, got {mu} m^3/s^2"))]
    NonPositiveGm { mu: f64 },
    #[snafu(display("orbital radius must be positive, got {radius_m} m"))]
    NonPositiveRadius { radius_m: f64 },
    #[snafu(display("semi-major axis must be positive, got {sma_m} m"))]
    NonPositiveSma { sma_m: f64 },
    #[snafu(display(
        "vis-viva radicand is negative (r = {radius_m} m, a = {sma_m} m): orbit is hyperbolic or degenerate"
    ))]
    NegativeRadicand { radius_m: f64, sma_m: f64 },
    #[snafu(display("cannot plan burn: available thrust is {thrust_n} N"))]
    NoThrust { thrust_n: f64 },
    #[snafu(display("cannot plan burn: effective exhaust velocity is {exhaust_velocity_m_s} m/s"))]
    NonPositiveExhaustVelocity { exhaust_velocity_m_s: f64 },
    #[snafu(display("vehicle mass must be positive, got {mass_kg} kg"))]
    NonPositiveMass { mass_kg: f64 },
    #[snafu(display("cannot plan burn: no active engines with a specific impulse"))]
    NoActiveEngines,
}

/// Orbital speed at radius `radius_m` on an orbit of semi-major axis `sma_m`, from the vis-viva equation.
pub fn vis_viva_speed(mu: f64, radius_m: f64, sma_m: f64) -> Result<f64, MechanicsError> {
    ensure!(mu > 0.0, NonPositiveGmSnafu { mu });
    ensure!(radius_m > 0.0, NonPositiveRadiusSnafu { radius_m });
    ensure!(sma_m > 0.0, NonPositiveSmaSnafu { sma_m });

    let radicand = mu * (2.0 / radius_m - 1.0 / sma_m);
    ensure!(radicand >= 0.0, NegativeRadicandSnafu { radius_m, sma_m });

    Ok(radicand.sqrt())
}

/// Velocity change needed at `current_radius_m` to go from an orbit of semi-major axis `sma_m`
/// to one of semi-major axis `target_radius_m`.
///
/// When the current radius equals the target radius, this is the circularization burn. The sign
/// is meaningful: a positive value is a prograde burn, a negative one is retrograde.
pub fn circularization_delta_v(
    mu: f64,
    current_radius_m: f64,
    sma_m: f64,
    target_radius_m: f64,
) -> Result<f64, MechanicsError> {
    let v1 = vis_viva_speed(mu, current_radius_m, sma_m)?;
    let v2 = vis_viva_speed(mu, current_radius_m, target_radius_m)?;
    Ok(v2 - v1)
}

/// Mass remaining after imparting `delta_v_m_s` with the provided effective exhaust velocity (Tsiolkovsky).
pub fn final_mass(delta_v_m_s: f64, exhaust_velocity_m_s: f64, mass_kg: f64) -> f64 {
    mass_kg / (delta_v_m_s / exhaust_velocity_m_s).exp()
}

/// Propellant mass flow rate in kg/s at full available thrust.
pub fn mass_flow_rate(available_thrust_n: f64, exhaust_velocity_m_s: f64) -> f64 {
    available_thrust_n / exhaust_velocity_m_s
}

/// Duration in seconds of a full-thrust burn imparting `delta_v_m_s`.
///
/// The effective exhaust velocity is `isp_s * g0_m_s2`. Only the magnitude of the velocity change matters.
pub fn burn_duration(
    delta_v_m_s: f64,
    isp_s: f64,
    g0_m_s2: f64,
    available_thrust_n: f64,
    mass_kg: f64,
) -> Result<f64, MechanicsError> {
    let exhaust_velocity_m_s = isp_s * g0_m_s2;
    ensure!(
        available_thrust_n > 0.0,
        NoThrustSnafu {
            thrust_n: available_thrust_n
        }
    );
    ensure!(
        exhaust_velocity_m_s > 0.0,
        NonPositiveExhaustVelocitySnafu {
            exhaust_velocity_m_s
        }
    );
    ensure!(mass_kg > 0.0, NonPositiveMassSnafu { mass_kg });

    let m1 = final_mass(delta_v_m_s.abs(), exhaust_velocity_m_s, mass_kg);
    let flow_rate = mass_flow_rate(available_thrust_n, exhaust_velocity_m_s);
    Ok((mass_kg - m1) / flow_rate)
}

/// Arithmetic mean of the specific impulse of the provided engines.
///
/// This is not thrust weighted: it is accurate for stages of similar engines, and biased for mixed stages.
pub fn mean_isp(engines: &[Engine]) -> Result<f64, MechanicsError> {
    ensure!(!engines.is_empty(), NoActiveEnginesSnafu);
    let isp = engines.iter().map(|e| e.isp_s).sum::<f64>() / engines.len() as f64;
    ensure!(isp > 0.0, NoActiveEnginesSnafu);
    Ok(isp)
}

/// Thrust to weight ratio, where the weight uses the provided local gravity.
pub fn thrust_to_weight(thrust_n: f64, mass_kg: f64, gravity_m_s2: f64) -> f64 {
    let weight = mass_kg * gravity_m_s2;
    if weight > 0.0 {
        thrust_n / weight
    } else {
        0.0
    }
}

/// Angle between two vectors in degrees, in [0; 180].
///
/// Returns zero if either vector has (nearly) no magnitude, and clamps the cosine so that
/// floating point noise never produces NaN.
pub fn vector_angle_deg(v1: &Vector3<f64>, v2: &Vector3<f64>) -> f64 {
    let denom = v1.norm() * v2.norm();
    if denom < NEAR_ZERO_NORM {
        return 0.0;
    }
    let cos_theta = v1.dot(v2) / denom;
    if !cos_theta.is_finite() {
        return 0.0;
    }
    cos_theta.clamp(-1.0, 1.0).acos().to_degrees()
}
