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

use super::LaunchConfig;
use crate::cosmic::TelemetrySnapshot;
use crate::guidance::{
    AscentGuidance, GuidanceError, GuidanceTarget, StagingMonitor, ThrottleController, TwrSource,
};
use crate::vessel::{surface_direction, ReferenceFrame, Vessel, VesselError};

/// What the session commanded during one tick of the powered ascent.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AscentTick {
    /// Tick number, starting at 1
    pub tick: u64,
    pub pitch_deg: f64,
    /// Throttle commanded on this tick, `None` when the auto throttle is off
    pub throttle: Option<f64>,
    /// Whether the next stage was activated on this tick
    pub staged: bool,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AscentStatus {
    /// Still climbing toward the target apoapsis.
    Climbing(AscentTick),
    /// The target apoapsis was exceeded on this tick: the throttle was cut and the session is over.
    ApoapsisReached { tick: u64, apoapsis_altitude_m: f64 },
    /// The session ended on a previous tick, nothing was commanded.
    Finished,
}

/// Powered ascent: the pitch program and the throttle controller, driven one tick at a time by the caller.
#[derive(Clone, Debug)]
pub struct AscentSession {
    guidance: AscentGuidance,
    throttle: ThrottleController,
    staging: StagingMonitor,
    twr_source: TwrSource,
    target_twr: f64,
    auto_throttle: bool,
    prev_ut_s: Option<f64>,
    ticks: u64,
    finished: bool,
}

impl AscentSession {
    pub fn new(guidance: AscentGuidance, throttle: ThrottleController, target_twr: f64) -> Self {
        Self {
            guidance,
            throttle,
            staging: StagingMonitor::new(10),
            twr_source: TwrSource::default(),
            target_twr,
            auto_throttle: true,
            prev_ut_s: None,
            ticks: 0,
            finished: false,
        }
    }

    pub fn from_config(cfg: &LaunchConfig) -> Result<Self, GuidanceError> {
        let guidance = AscentGuidance::new(
            GuidanceTarget {
                target_apoapsis_m: cfg.target_apoapsis_m,
                compass_heading_deg: cfg.compass_deg,
            },
            cfg.pitch_profile,
        )?;
        let throttle = ThrottleController::from_config(&cfg.throttle)?;
        Ok(Self::new(guidance, throttle, cfg.target_twr)
            .with_staging_debounce(cfg.staging_debounce_ticks)
            .with_twr_source(cfg.twr_source)
            .with_auto_throttle(cfg.auto_throttle))
    }

    /// Number of consecutive zero-thrust ticks before staging.
    pub fn with_staging_debounce(mut self, every_n_ticks: u32) -> Self {
        self.staging = StagingMonitor::new(every_n_ticks);
        self
    }

    pub fn with_twr_source(mut self, source: TwrSource) -> Self {
        self.twr_source = source;
        self
    }

    pub fn with_auto_throttle(mut self, enabled: bool) -> Self {
        self.auto_throttle = enabled;
        self
    }

    pub fn set_auto_throttle(&mut self, enabled: bool) {
        self.auto_throttle = enabled;
    }

    /// Flips the auto throttle and returns its new state.
    pub fn toggle_auto_throttle(&mut self) -> bool {
        self.auto_throttle = !self.auto_throttle;
        info!(
            "Auto throttle {}",
            if self.auto_throttle { "on" } else { "off" }
        );
        self.auto_throttle
    }

    pub fn auto_throttle(&self) -> bool {
        self.auto_throttle
    }

    pub fn guidance(&self) -> &AscentGuidance {
        &self.guidance
    }

    pub fn throttle_controller(&self) -> &ThrottleController {
        &self.throttle
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Reads one snapshot from the vessel and runs one tick on it.
    pub fn tick<V: Vessel + ?Sized>(
        &mut self,
        vessel: &mut V,
    ) -> Result<AscentStatus, VesselError> {
        if self.finished {
            return Ok(AscentStatus::Finished);
        }
        let snapshot = vessel.telemetry()?;
        self.step(&snapshot, vessel)
    }

    /// Runs one tick of the ascent on the provided snapshot.
    pub fn step<V: Vessel + ?Sized>(
        &mut self,
        snapshot: &TelemetrySnapshot,
        vessel: &mut V,
    ) -> Result<AscentStatus, VesselError> {
        if self.finished {
            return Ok(AscentStatus::Finished);
        }
        self.ticks += 1;
        let dt_s = self
            .prev_ut_s
            .map_or(0.0, |prev_ut_s| snapshot.ut_s - prev_ut_s);
        self.prev_ut_s = Some(snapshot.ut_s);

        let pitch_deg = self.guidance.pitch_for_altitude(snapshot.mean_altitude_m);
        vessel.point_along(
            surface_direction(pitch_deg, self.guidance.heading_deg()),
            ReferenceFrame::Surface,
        )?;

        if self.guidance.apoapsis_reached(snapshot.apoapsis_altitude_m) {
            vessel.set_throttle(0.0)?;
            self.finished = true;
            info!(
                "Target apoapsis reached: {:.0} m on tick {}",
                snapshot.apoapsis_altitude_m, self.ticks
            );
            return Ok(AscentStatus::ApoapsisReached {
                tick: self.ticks,
                apoapsis_altitude_m: snapshot.apoapsis_altitude_m,
            });
        }

        let staged = self.staging.sample(snapshot.thrust_n);
        if staged {
            info!("Thrust is zero, activating next stage.");
            vessel.activate_next_stage()?;
        }

        let throttle = if self.auto_throttle {
            let twr = self.twr_source.twr(snapshot);
            let cmd = self.throttle.update(self.target_twr - twr, dt_s);
            vessel.set_throttle(cmd)?;
            debug!("{snapshot} | pitch {pitch_deg:.2} deg, TWR {twr:.3}, throttle {cmd:.3}");
            Some(cmd)
        } else {
            debug!("{snapshot} | pitch {pitch_deg:.2} deg");
            None
        };

        Ok(AscentStatus::Climbing(AscentTick {
            tick: self.ticks,
            pitch_deg,
            throttle,
            staged,
        }))
    }
}
