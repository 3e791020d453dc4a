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

use super::{ManeuverError, ManeuverVesselSnafu};
use crate::cosmic::{Apsis, TelemetrySnapshot};
use crate::mechanics::{burn_duration, circularization_delta_v, mean_isp, MechanicsError};
use crate::vessel::{Engine, NodeHandle, ReferenceFrame, Vessel};
use snafu::ResultExt;
use std::fmt;

/// A burn centered on a maneuver node.
///
/// Plans are immutable: attaching the node consumes the plan and returns a new one.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ManeuverPlan {
    /// Velocity change of the node, in m/s (negative for a retrograde burn)
    pub delta_v_m_s: f64,
    /// Duration of the burn at full available thrust, in seconds
    pub burn_duration_s: f64,
    /// Universal time at which to open the throttle, in seconds
    pub burn_start_ut_s: f64,
    /// Universal time of the node itself, in seconds
    pub node_ut_s: f64,
    /// Node on the vessel's flight plan, once created
    pub node: Option<NodeHandle>,
}

impl ManeuverPlan {
    /// Centers a burn of `burn_duration_s` seconds on the node at `node_ut_s`.
    pub fn centered(delta_v_m_s: f64, burn_duration_s: f64, node_ut_s: f64) -> Self {
        Self {
            delta_v_m_s,
            burn_duration_s,
            burn_start_ut_s: node_ut_s - burn_duration_s / 2.0,
            node_ut_s,
            node: None,
        }
    }

    pub fn with_node(self, node: NodeHandle) -> Self {
        Self {
            node: Some(node),
            ..self
        }
    }

    /// Frame of the burn vector, only known once a node is attached.
    pub fn frame(&self) -> Option<ReferenceFrame> {
        self.node.map(ReferenceFrame::Maneuver)
    }

    pub fn burn_end_ut_s(&self) -> f64 {
        self.burn_start_ut_s + self.burn_duration_s
    }
}

impl fmt::Display for ManeuverPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3} m/s burn of {:.2} s from UT {:.2} s (node at UT {:.2} s",
            self.delta_v_m_s, self.burn_duration_s, self.burn_start_ut_s, self.node_ut_s
        )?;
        match self.node {
            Some(node) => write!(f, ", {node})"),
            None => write!(f, ", no node)"),
        }
    }
}

/// Turns orbital targets into burn plans.
pub struct ManeuverPlanner;

impl ManeuverPlanner {
    /// Plans the burn that circularizes the orbit at `target_radius_m`, on a node at `node_ut_s`.
    ///
    /// The target radius is also the radius at which the burn happens, i.e. an apsis radius.
    pub fn plan(
        snapshot: &TelemetrySnapshot,
        engines: &[Engine],
        target_radius_m: f64,
        node_ut_s: f64,
    ) -> Result<ManeuverPlan, MechanicsError> {
        let delta_v_m_s = circularization_delta_v(
            snapshot.orbit.gm_m3_s2,
            target_radius_m,
            snapshot.orbit.sma_m,
            target_radius_m,
        )?;
        Self::burn_window(snapshot, engines, delta_v_m_s, node_ut_s)
    }

    /// Plans the burn window for a known delta-v on a node at `node_ut_s`.
    ///
    /// The specific impulse is the plain mean of the active engines, and the exhaust velocity
    /// uses the surface gravity of the body.
    pub fn burn_window(
        snapshot: &TelemetrySnapshot,
        engines: &[Engine],
        delta_v_m_s: f64,
        node_ut_s: f64,
    ) -> Result<ManeuverPlan, MechanicsError> {
        let isp_s = mean_isp(engines)?;
        for engine in engines {
            debug!("active engine with Isp = {:.1} s", engine.isp_s);
        }
        let duration_s = burn_duration(
            delta_v_m_s,
            isp_s,
            snapshot.orbit.surface_gravity_m_s2,
            snapshot.available_thrust_n,
            snapshot.mass_kg,
        )?;
        info!("Maneuver duration: {duration_s:.2} s for {delta_v_m_s:.3} m/s");
        Ok(ManeuverPlan::centered(delta_v_m_s, duration_s, node_ut_s))
    }

    /// Plans a circularization at the next apoapsis or periapsis and adds the matching prograde node.
    pub fn circularize<V: Vessel + ?Sized>(
        vessel: &mut V,
        at: Apsis,
    ) -> Result<ManeuverPlan, ManeuverError> {
        info!("Planning circularization burn at {at}");
        let snapshot = vessel.telemetry().context(ManeuverVesselSnafu {
            action: "reading telemetry",
        })?;
        let engines = vessel.active_engines().context(ManeuverVesselSnafu {
            action: "listing active engines",
        })?;
        let node_ut_s = snapshot.ut_s + at.time_to_s(&snapshot.orbit);
        let plan = Self::plan(&snapshot, &engines, at.radius_m(&snapshot.orbit), node_ut_s)?;

        let node = vessel
            .add_node(node_ut_s, plan.delta_v_m_s)
            .context(ManeuverVesselSnafu {
                action: "adding maneuver node",
            })?;
        let plan = plan.with_node(node);
        info!("{plan}");
        Ok(plan)
    }

    /// Plans the burn window of the first node already on the flight plan, if there is one.
    pub fn plan_existing_node<V: Vessel + ?Sized>(
        vessel: &mut V,
    ) -> Result<Option<ManeuverPlan>, ManeuverError> {
        let node = match vessel.next_node().context(ManeuverVesselSnafu {
            action: "looking up the next node",
        })? {
            Some(node) => node,
            None => return Ok(None),
        };
        let state = match vessel.node_state(node).context(ManeuverVesselSnafu {
            action: "reading the next node",
        })? {
            Some(state) => state,
            None => return Ok(None),
        };
        let snapshot = vessel.telemetry().context(ManeuverVesselSnafu {
            action: "reading telemetry",
        })?;
        let engines = vessel.active_engines().context(ManeuverVesselSnafu {
            action: "listing active engines",
        })?;

        let plan = Self::burn_window(&snapshot, &engines, state.delta_v_m_s, state.ut_s)?
            .with_node(node);
        info!("{plan}");
        Ok(Some(plan))
    }
}
