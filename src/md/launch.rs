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

use super::{
    AscentSession, AscentStatus, BurnConfig, BurnExecutor, BurnOutcome, ManeuverError,
    ManeuverPlanner,
};
use crate::cosmic::{Apsis, TelemetrySnapshot};
use crate::errors::GncError;
use crate::guidance::{PitchProfile, ThrottleConfig, ThrottleController, TwrSource};
use crate::io::{duration_from_str, duration_to_str, ConfigError, ConfigRepr};
use crate::time::{Duration, Unit};
use crate::vessel::{surface_direction, Clock, ControlGuard, ReferenceFrame, Vessel};
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use typed_builder::TypedBuilder;

/// Configuration of a launch to a circular orbit.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
#[serde(default)]
pub struct LaunchConfig {
    /// Apoapsis altitude at which the powered ascent ends, in meters
    #[builder(default = 90_000.0)]
    pub target_apoapsis_m: f64,
    /// Compass heading of the ascent, in degrees
    #[builder(default = 90.0)]
    pub compass_deg: f64,
    /// Whether the throttle tracks the target TWR, otherwise it stays at its launch value
    #[builder(default = true)]
    pub auto_throttle: bool,
    /// Toggle action group 5 once above `action_group_altitude_m` during the coast
    #[builder(default = false)]
    pub action_group_5: bool,
    #[builder(default = 1.6)]
    pub target_twr: f64,
    #[builder(default)]
    pub twr_source: TwrSource,
    #[builder(default)]
    pub throttle: ThrottleConfig,
    #[builder(default)]
    pub pitch_profile: PitchProfile,
    /// Consecutive zero-thrust ticks before staging
    #[builder(default = 10)]
    pub staging_debounce_ticks: u32,
    /// Period of the control loop
    #[builder(default = 100 * Unit::Millisecond)]
    #[serde(serialize_with = "duration_to_str", deserialize_with = "duration_from_str")]
    pub tick_period: Duration,
    /// The roll program starts once the vertical speed exceeds this value, in m/s
    #[builder(default = 60.0)]
    pub roll_vertical_speed_m_s: f64,
    /// The roll program starts at the latest this long after lift off
    #[builder(default = 15 * Unit::Second)]
    #[serde(serialize_with = "duration_to_str", deserialize_with = "duration_from_str")]
    pub roll_timeout: Duration,
    /// Altitude above which the vessel is out of the atmosphere, in meters
    #[builder(default = 70_050.0)]
    pub atmosphere_altitude_m: f64,
    #[builder(default = 65_000.0)]
    pub action_group_altitude_m: f64,
    /// Seconds counted down before lift off
    #[builder(default = 3)]
    pub countdown_s: u32,
    /// Wait after the circularization for the steering to settle
    #[builder(default = 3 * Unit::Second)]
    #[serde(serialize_with = "duration_to_str", deserialize_with = "duration_from_str")]
    pub settle_time: Duration,
    #[builder(default)]
    pub burn: BurnConfig,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConfigRepr for LaunchConfig {}

impl LaunchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::InvalidConfig { msg });
        if !(self.target_apoapsis_m > 0.0) {
            return invalid(format!(
                "target apoapsis must be positive, got {} m",
                self.target_apoapsis_m
            ));
        }
        if !(self.target_twr > 0.0) {
            return invalid(format!("target TWR must be positive, got {}", self.target_twr));
        }
        if self.tick_period <= Duration::ZERO {
            return invalid(format!("tick period must be positive, got {}", self.tick_period));
        }
        if self.burn.poll_period <= Duration::ZERO {
            return invalid(format!(
                "burn poll period must be positive, got {}",
                self.burn.poll_period
            ));
        }
        if let Err(e) = ThrottleController::from_config(&self.throttle) {
            return invalid(e.to_string());
        }
        if !(0.0..=1.0).contains(&self.throttle.min) || !(0.0..=1.0).contains(&self.throttle.max) {
            return invalid(format!(
                "throttle limits [{}; {}] must be within [0; 1]",
                self.throttle.min, self.throttle.max
            ));
        }
        if let Err(e) = self.pitch_profile.validate() {
            return invalid(e.to_string());
        }
        Ok(())
    }
}

/// Orbit reached at the end of a launch.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OrbitReport {
    pub apoapsis_altitude_m: f64,
    pub periapsis_altitude_m: f64,
    pub sma_m: f64,
    pub eccentricity: f64,
    pub inclination_deg: f64,
}

impl From<&TelemetrySnapshot> for OrbitReport {
    fn from(snapshot: &TelemetrySnapshot) -> Self {
        Self {
            apoapsis_altitude_m: snapshot.apoapsis_altitude_m,
            periapsis_altitude_m: snapshot.orbit.periapsis_altitude_m,
            sma_m: snapshot.orbit.sma_m,
            eccentricity: snapshot.orbit.eccentricity,
            inclination_deg: snapshot.orbit.inclination_deg,
        }
    }
}

impl fmt::Display for OrbitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Apoapsis: {:.3} km, Periapsis: {:.3} km",
            self.apoapsis_altitude_m / 1e3,
            self.periapsis_altitude_m / 1e3
        )?;
        writeln!(
            f,
            "Semi-major axis: {:.3} km, Eccentricity: {:.4}",
            self.sma_m / 1e3,
            self.eccentricity
        )?;
        write!(f, "Inclination: {:.2} degrees", self.inclination_deg)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LaunchReport {
    /// Tick of the powered ascent on which the target apoapsis was reached
    pub ascent_ticks: u64,
    pub circularization: BurnOutcome,
    pub orbit: OrbitReport,
}

/// Launch from the pad to a circular orbit at the target apoapsis.
///
/// The sequence polls the vessel and sleeps on the provided clock between polls. If any step
/// fails, the throttle is cut and the attitude control released before the error is returned.
#[derive(Clone, Debug)]
pub struct LaunchSequence {
    cfg: LaunchConfig,
}

impl LaunchSequence {
    pub fn new(cfg: LaunchConfig) -> Result<Self, GncError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.cfg
    }

    pub fn run<V: Vessel + ?Sized, C: Clock + ?Sized>(
        &self,
        vessel: &mut V,
        clock: &mut C,
    ) -> Result<LaunchReport, GncError> {
        info!(
            "Target: {} m, Compass: {} deg, auto throttle: {}, AG5: {}",
            self.cfg.target_apoapsis_m,
            self.cfg.compass_deg,
            self.cfg.auto_throttle,
            self.cfg.action_group_5
        );
        let mut session = AscentSession::from_config(&self.cfg)?;
        let mut guard = ControlGuard::new(vessel);

        self.pre_launch(&mut *guard, &session)?;
        self.countdown(clock);
        self.lift_off(&mut *guard)?;
        self.roll_program(&mut *guard, clock)?;
        let ascent_ticks = self.powered_ascent(&mut session, &mut *guard, clock)?;
        self.coast_out_of_atmosphere(&mut *guard, clock)?;

        let plan = ManeuverPlanner::circularize(&mut *guard, Apsis::Apoapsis)?;
        let circularization = BurnExecutor::new(plan, self.cfg.burn)?.run(&mut *guard, clock)?;

        let orbit = self.finalize(&mut *guard, clock)?;
        guard.release();
        info!("Launch complete");

        Ok(LaunchReport {
            ascent_ticks,
            circularization,
            orbit,
        })
    }

    fn pre_launch<V: Vessel + ?Sized>(
        &self,
        vessel: &mut V,
        session: &AscentSession,
    ) -> Result<(), GncError> {
        vessel.set_sas(false)?;
        vessel.set_rcs(false)?;
        vessel.set_throttle(session.throttle_controller().output())?;
        Ok(())
    }

    fn countdown<C: Clock + ?Sized>(&self, clock: &mut C) {
        for second in (1..=self.cfg.countdown_s).rev() {
            info!("...{second}");
            clock.sleep(1 * Unit::Second);
        }
        info!("Launch!");
    }

    fn lift_off<V: Vessel + ?Sized>(&self, vessel: &mut V) -> Result<(), GncError> {
        vessel.activate_next_stage()?;
        let snapshot = vessel.telemetry()?;
        vessel.point_along(
            surface_direction(90.0, snapshot.heading_deg),
            ReferenceFrame::Surface,
        )?;
        vessel.target_roll(snapshot.roll_deg)?;
        Ok(())
    }

    /// Climbs vertically until fast enough, then rolls to the ascent heading.
    fn roll_program<V: Vessel + ?Sized, C: Clock + ?Sized>(
        &self,
        vessel: &mut V,
        clock: &mut C,
    ) -> Result<(), GncError> {
        let start_ut_s = vessel.ut()?;
        loop {
            let snapshot = vessel.telemetry()?;
            if snapshot.vertical_speed_m_s >= self.cfg.roll_vertical_speed_m_s
                || snapshot.ut_s - start_ut_s > self.cfg.roll_timeout.to_seconds()
            {
                break;
            }
            clock.sleep(self.cfg.tick_period);
        }
        info!("Roll");
        vessel.target_roll(0.0)?;
        vessel.point_along(
            surface_direction(90.0, self.cfg.compass_deg),
            ReferenceFrame::Surface,
        )?;
        Ok(())
    }

    /// Runs the ascent session until the target apoapsis is reached, returns the number of ticks.
    fn powered_ascent<V: Vessel + ?Sized, C: Clock + ?Sized>(
        &self,
        session: &mut AscentSession,
        vessel: &mut V,
        clock: &mut C,
    ) -> Result<u64, GncError> {
        info!("Gravity turn");
        loop {
            match session.tick(vessel)? {
                AscentStatus::ApoapsisReached { tick, .. } => return Ok(tick),
                AscentStatus::Climbing(_) => clock.sleep(self.cfg.tick_period),
                AscentStatus::Finished => return Ok(0),
            }
        }
    }

    fn coast_out_of_atmosphere<V: Vessel + ?Sized, C: Clock + ?Sized>(
        &self,
        vessel: &mut V,
        clock: &mut C,
    ) -> Result<(), GncError> {
        info!("Coasting out of atmosphere");
        let mut ag5_pending = self.cfg.action_group_5;
        loop {
            let snapshot = vessel.telemetry()?;
            if ag5_pending && snapshot.mean_altitude_m > self.cfg.action_group_altitude_m {
                vessel.toggle_action_group(5)?;
                info!(
                    "Action group 5 activated above {} m",
                    self.cfg.action_group_altitude_m
                );
                ag5_pending = false;
            }
            if snapshot.mean_altitude_m >= self.cfg.atmosphere_altitude_m {
                return Ok(());
            }
            clock.sleep(self.cfg.tick_period);
        }
    }

    fn finalize<V: Vessel + ?Sized, C: Clock + ?Sized>(
        &self,
        vessel: &mut V,
        clock: &mut C,
    ) -> Result<OrbitReport, GncError> {
        vessel.disengage_attitude()?;
        vessel.engage_stability_assist()?;
        info!("Waiting for steering to settle down");
        clock.sleep(self.cfg.settle_time);
        let report = OrbitReport::from(&vessel.telemetry()?);
        info!("{report}");
        Ok(report)
    }
}

/// Executes the next maneuver node, after planning a circularization node at the requested apsis if any.
///
/// Returns [`ManeuverError::NothingToExecute`] when there is no node to execute.
pub fn execute_node<V: Vessel + ?Sized, C: Clock + ?Sized>(
    vessel: &mut V,
    clock: &mut C,
    cfg: BurnConfig,
    circularize_at: Option<Apsis>,
) -> Result<BurnOutcome, GncError> {
    vessel.set_sas(false)?;
    let plan = match circularize_at {
        Some(apsis) => ManeuverPlanner::circularize(vessel, apsis)?,
        None => match ManeuverPlanner::plan_existing_node(vessel)? {
            Some(plan) => plan,
            None => {
                info!("No maneuver node exists.");
                return Err(ManeuverError::NothingToExecute.into());
            }
        },
    };
    let outcome = BurnExecutor::new(plan, cfg)?.run(vessel, clock)?;
    vessel.set_sas(true)?;
    Ok(outcome)
}
