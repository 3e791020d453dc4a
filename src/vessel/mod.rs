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

use crate::cosmic::TelemetrySnapshot;
use crate::linalg::Vector3;
use crate::time::Duration;
use serde_derive::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fmt;

mod guard;
pub use guard::ControlGuard;

/// An opaque handle on a maneuver node owned by the vehicle-control service.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeHandle(pub u64);

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node #{}", self.0)
    }
}

/// The frame in which an attitude target is expressed. The guidance never looks inside a frame,
/// it only hands it back to the vessel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReferenceFrame {
    /// Vessel surface frame: x points up, y points north, z points east.
    Surface,
    /// Frame attached to a maneuver node: y is prograde.
    Maneuver(NodeHandle),
}

impl fmt::Display for ReferenceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceFrame::Surface => write!(f, "surface frame"),
            ReferenceFrame::Maneuver(node) => write!(f, "{node} frame"),
        }
    }
}

/// An active engine, as far as burn planning is concerned.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Engine {
    /// Specific impulse in seconds
    pub isp_s: f64,
}

/// Live state of a maneuver node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NodeState {
    /// Universal time of the node, in seconds
    pub ut_s: f64,
    /// Total delta-v of the node, in m/s
    pub delta_v_m_s: f64,
    /// Delta-v still to be imparted, in m/s
    pub remaining_delta_v_m_s: f64,
    /// Remaining burn vector expressed in the node's own frame
    pub burn_vector: Vector3<f64>,
}

/// Errors reported by the vehicle-control service.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum VesselError {
    #[snafu(display("vehicle-control service failed when {action}: {details}"))]
    Transport {
        action: &'static str,
        details: String,
    },
    #[snafu(display("{node} no longer exists"))]
    NodeNotFound { node: NodeHandle },
}

/// The vehicle-control service, as seen by the guidance.
///
/// How the vessel talks to the actual vehicle, and how it achieves a commanded attitude, is none
/// of the guidance's business: it only issues intents and reads back telemetry.
pub trait Vessel {
    /// Retrieve a consistent snapshot of the telemetry. May block on I/O.
    fn telemetry(&mut self) -> Result<TelemetrySnapshot, VesselError>;

    /// Current universal time, in seconds.
    fn ut(&mut self) -> Result<f64, VesselError>;

    /// Set the main throttle, between 0.0 and 1.0.
    fn set_throttle(&mut self, throttle: f64) -> Result<(), VesselError>;

    /// Engage the attitude control to point along `direction` in `frame`.
    fn point_along(
        &mut self,
        direction: Vector3<f64>,
        frame: ReferenceFrame,
    ) -> Result<(), VesselError>;

    /// Request a roll angle in degrees, kept until changed.
    fn target_roll(&mut self, roll_deg: f64) -> Result<(), VesselError>;

    /// Whether the attitude control has settled on its target.
    fn attitude_settled(&mut self) -> Result<bool, VesselError>;

    /// Release the attitude control.
    fn disengage_attitude(&mut self) -> Result<(), VesselError>;

    fn activate_next_stage(&mut self) -> Result<(), VesselError>;

    fn toggle_action_group(&mut self, group: u8) -> Result<(), VesselError>;

    fn set_sas(&mut self, enabled: bool) -> Result<(), VesselError>;

    fn set_rcs(&mut self, enabled: bool) -> Result<(), VesselError>;

    /// Enable SAS in stability assist mode.
    fn engage_stability_assist(&mut self) -> Result<(), VesselError>;

    /// Engines currently active, empty if none are.
    fn active_engines(&mut self) -> Result<Vec<Engine>, VesselError>;

    /// Add a maneuver node at `ut_s` with a prograde delta-v of `prograde_m_s`.
    fn add_node(&mut self, ut_s: f64, prograde_m_s: f64) -> Result<NodeHandle, VesselError>;

    /// The first maneuver node of the flight plan, if any.
    fn next_node(&mut self) -> Result<Option<NodeHandle>, VesselError>;

    /// Live state of a node, `None` if it no longer exists.
    fn node_state(&mut self, node: NodeHandle) -> Result<Option<NodeState>, VesselError>;

    fn remove_node(&mut self, node: NodeHandle) -> Result<(), VesselError>;

    /// Time warp until `ut_s`. Returns once the warp is over.
    fn warp_to(&mut self, ut_s: f64) -> Result<(), VesselError>;
}

/// The only way the guidance waits. A live implementation sleeps the thread, a test one just
/// advances simulated time.
pub trait Clock {
    fn sleep(&mut self, duration: Duration);
}

/// A clock that blocks the current thread.
#[derive(Copy, Clone, Debug, Default)]
pub struct ThreadClock;

impl Clock for ThreadClock {
    fn sleep(&mut self, duration: Duration) {
        let nanos = duration.total_nanoseconds();
        if nanos > 0 {
            std::thread::sleep(std::time::Duration::from_nanos(
                u64::try_from(nanos).unwrap_or(u64::MAX),
            ));
        }
    }
}

/// Attitude direction for a pitch above the horizon and a compass heading, in the surface frame.
pub fn surface_direction(pitch_deg: f64, heading_deg: f64) -> Vector3<f64> {
    let (pitch, heading) = (pitch_deg.to_radians(), heading_deg.to_radians());
    Vector3::new(
        pitch.sin(),
        pitch.cos() * heading.cos(),
        pitch.cos() * heading.sin(),
    )
}
