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

use super::{ManeuverError, ManeuverPlan, ManeuverVesselSnafu, NothingToExecuteSnafu};
use crate::io::{
    duration_from_str, duration_to_str, maybe_duration_from_str, maybe_duration_to_str, ConfigRepr,
};
use crate::linalg::Vector3;
use crate::mechanics::vector_angle_deg;
use crate::time::{Duration, Unit};
use crate::vessel::{Clock, ControlGuard, NodeHandle, NodeState, ReferenceFrame, Vessel};
use serde_derive::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};
use std::fmt;
use typed_builder::TypedBuilder;

/// Tuning of the burn execution.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
#[serde(default)]
pub struct BurnConfig {
    /// The burn stops once the remaining delta-v drops under this value, in m/s
    #[builder(default = 0.2)]
    pub completion_threshold_m_s: f64,
    /// The burn stops once the burn vector has turned by more than this angle, in degrees
    #[builder(default = 90.0)]
    pub overshoot_angle_deg: f64,
    /// Throttle commanded during the burn
    #[builder(default = 1.0)]
    pub burn_throttle: f64,
    /// Number of seconds announced before the burn starts
    #[builder(default = 5)]
    pub countdown_s: u32,
    /// Time warp stops this long before the burn, no warping if unset
    #[builder(default = Some(30 * Unit::Second))]
    #[serde(
        serialize_with = "maybe_duration_to_str",
        deserialize_with = "maybe_duration_from_str"
    )]
    pub warp_lead: Option<Duration>,
    /// Period at which the executor is ticked by `run`
    #[builder(default = 100 * Unit::Millisecond)]
    #[serde(serialize_with = "duration_to_str", deserialize_with = "duration_from_str")]
    pub poll_period: Duration,
}

impl Default for BurnConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConfigRepr for BurnConfig {}

/// Phases of a burn, only ever traversed forward.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BurnPhase {
    Planned,
    Orienting,
    Waiting,
    Burning,
    Complete,
}

impl fmt::Display for BurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Why a burn was considered complete.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Completion {
    /// The remaining delta-v dropped under the threshold.
    RemainingDeltaV { remaining_m_s: f64 },
    /// The burn vector turned past the overshoot angle: continuing would work against the node.
    Overshoot { angle_deg: f64 },
    /// The node disappeared from the flight plan mid-burn.
    NodeVanished,
    /// The burn was aborted by the caller.
    Aborted,
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemainingDeltaV { remaining_m_s } => {
                write!(f, "remaining delta-v {remaining_m_s:.3} m/s")
            }
            Self::Overshoot { angle_deg } => {
                write!(f, "burn vector turned by {angle_deg:.1} deg")
            }
            Self::NodeVanished => write!(f, "node vanished"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// State of one burn.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BurnSession {
    pub plan: ManeuverPlan,
    /// Burn vector when the throttle opened, in the node frame
    pub reference_burn_vector: Option<Vector3<f64>>,
    pub phase: BurnPhase,
}

/// Summary of an executed burn.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BurnOutcome {
    pub plan: ManeuverPlan,
    pub completion: Completion,
    /// Universal time at which the throttle opened, if it did
    pub ignition_ut_s: Option<f64>,
    /// Universal time at which the throttle closed
    pub cutoff_ut_s: f64,
}

/// Executes one maneuver node, closing the loop on the node's live burn vector rather than on a timer.
///
/// Each call to [`BurnExecutor::tick`] performs at most one phase transition. An executor runs
/// exactly one burn: once complete it stays complete.
#[derive(Clone, Debug)]
pub struct BurnExecutor {
    session: BurnSession,
    node: NodeHandle,
    cfg: BurnConfig,
    next_countdown_s: u32,
    ignition_ut_s: Option<f64>,
    outcome: Option<BurnOutcome>,
}

impl BurnExecutor {
    /// Prepares the execution of a plan, which must be attached to a node.
    pub fn new(plan: ManeuverPlan, cfg: BurnConfig) -> Result<Self, ManeuverError> {
        let node = plan.node.context(NothingToExecuteSnafu)?;
        Ok(Self {
            session: BurnSession {
                plan,
                reference_burn_vector: None,
                phase: BurnPhase::Planned,
            },
            node,
            next_countdown_s: cfg.countdown_s,
            cfg,
            ignition_ut_s: None,
            outcome: None,
        })
    }

    pub fn phase(&self) -> BurnPhase {
        self.session.phase
    }

    pub fn session(&self) -> &BurnSession {
        &self.session
    }

    /// Outcome of the burn, once complete.
    pub fn outcome(&self) -> Option<BurnOutcome> {
        self.outcome
    }

    /// Advances the burn by one control tick and returns the phase it is in afterward.
    pub fn tick<V: Vessel + ?Sized>(&mut self, vessel: &mut V) -> Result<BurnPhase, ManeuverError> {
        match self.session.phase {
            BurnPhase::Planned => {
                let state = self.live_node(vessel)?.context(NothingToExecuteSnafu)?;
                info!("Orienting ship for burn of {}", self.session.plan);
                vessel
                    .point_along(state.burn_vector, ReferenceFrame::Maneuver(self.node))
                    .context(ManeuverVesselSnafu {
                        action: "pointing along the burn vector",
                    })?;
                self.session.phase = BurnPhase::Orienting;
            }
            BurnPhase::Orienting => {
                let settled = vessel.attitude_settled().context(ManeuverVesselSnafu {
                    action: "checking attitude",
                })?;
                if settled {
                    self.start_waiting(vessel)?;
                }
            }
            BurnPhase::Waiting => {
                let ut_s = self.ut(vessel)?;
                let start_ut_s = self.session.plan.burn_start_ut_s;
                while self.next_countdown_s > 0
                    && ut_s >= start_ut_s - f64::from(self.next_countdown_s)
                {
                    info!("...{}", self.next_countdown_s);
                    self.next_countdown_s -= 1;
                }
                if ut_s >= start_ut_s {
                    self.ignite(vessel, ut_s)?;
                }
            }
            BurnPhase::Burning => match self.live_node(vessel)? {
                None => self.complete(vessel, Completion::NodeVanished)?,
                Some(state) => {
                    if let Some(completion) = self.completion_of(&state) {
                        self.complete(vessel, completion)?;
                    }
                }
            },
            BurnPhase::Complete => {}
        }
        Ok(self.session.phase)
    }

    /// Ticks the burn until completion, sleeping `poll_period` between ticks.
    ///
    /// Whatever happens, the throttle is closed and the attitude control released on return.
    pub fn run<V: Vessel + ?Sized, C: Clock + ?Sized>(
        mut self,
        vessel: &mut V,
        clock: &mut C,
    ) -> Result<BurnOutcome, ManeuverError> {
        let mut guard = ControlGuard::new(vessel);
        let outcome = loop {
            self.tick(&mut *guard)?;
            if let Some(outcome) = self.outcome {
                break outcome;
            }
            clock.sleep(self.cfg.poll_period);
        };
        guard.release();
        Ok(outcome)
    }

    /// Cuts the throttle and releases the attitude control. The node is left on the flight plan.
    pub fn abort<V: Vessel + ?Sized>(&mut self, vessel: &mut V) -> Result<(), ManeuverError> {
        if self.session.phase == BurnPhase::Complete {
            return Ok(());
        }
        warn!("Aborting burn in phase {}", self.session.phase);
        self.shut_down(vessel)?;
        let cutoff_ut_s = self.ut(vessel)?;
        self.finish(Completion::Aborted, cutoff_ut_s);
        Ok(())
    }

    /// Checks the completion conditions against the live node.
    fn completion_of(&self, state: &NodeState) -> Option<Completion> {
        if let Some(reference) = self.session.reference_burn_vector {
            let angle_deg = vector_angle_deg(&reference, &state.burn_vector);
            if angle_deg > self.cfg.overshoot_angle_deg {
                return Some(Completion::Overshoot { angle_deg });
            }
        }
        if state.remaining_delta_v_m_s < self.cfg.completion_threshold_m_s {
            return Some(Completion::RemainingDeltaV {
                remaining_m_s: state.remaining_delta_v_m_s,
            });
        }
        debug!(
            "burning: {:.3} m/s remaining",
            state.remaining_delta_v_m_s
        );
        None
    }

    fn start_waiting<V: Vessel + ?Sized>(&mut self, vessel: &mut V) -> Result<(), ManeuverError> {
        let start_ut_s = self.session.plan.burn_start_ut_s;
        if let Some(lead) = self.cfg.warp_lead {
            let warp_ut_s = start_ut_s - lead.to_seconds();
            if self.ut(vessel)? < warp_ut_s {
                info!("Warping to {lead} before the burn");
                vessel.warp_to(warp_ut_s).context(ManeuverVesselSnafu {
                    action: "warping",
                })?;
            }
        }
        info!("Waiting until maneuver start...");
        self.session.phase = BurnPhase::Waiting;
        Ok(())
    }

    fn ignite<V: Vessel + ?Sized>(
        &mut self,
        vessel: &mut V,
        ut_s: f64,
    ) -> Result<(), ManeuverError> {
        // The reference vector is captured before any throttle command.
        let Some(state) = self.live_node(vessel)? else {
            warn!("Maneuver node vanished before ignition");
            return self.complete(vessel, Completion::NodeVanished);
        };
        self.session.reference_burn_vector = Some(state.burn_vector);
        vessel
            .set_throttle(self.cfg.burn_throttle.max(0.0).min(1.0))
            .context(ManeuverVesselSnafu {
                action: "opening the throttle",
            })?;
        self.ignition_ut_s = Some(ut_s);
        self.session.phase = BurnPhase::Burning;
        info!("Maneuver in progress...");
        Ok(())
    }

    fn complete<V: Vessel + ?Sized>(
        &mut self,
        vessel: &mut V,
        completion: Completion,
    ) -> Result<(), ManeuverError> {
        self.shut_down(vessel)?;
        if completion != Completion::NodeVanished {
            vessel.remove_node(self.node).context(ManeuverVesselSnafu {
                action: "removing the node",
            })?;
        }
        let cutoff_ut_s = self.ut(vessel)?;
        info!("Burn finished: {completion}");
        self.finish(completion, cutoff_ut_s);
        Ok(())
    }

    fn shut_down<V: Vessel + ?Sized>(&mut self, vessel: &mut V) -> Result<(), ManeuverError> {
        vessel.set_throttle(0.0).context(ManeuverVesselSnafu {
            action: "closing the throttle",
        })?;
        vessel.disengage_attitude().context(ManeuverVesselSnafu {
            action: "releasing attitude control",
        })
    }

    fn finish(&mut self, completion: Completion, cutoff_ut_s: f64) {
        self.session.phase = BurnPhase::Complete;
        self.outcome = Some(BurnOutcome {
            plan: self.session.plan,
            completion,
            ignition_ut_s: self.ignition_ut_s,
            cutoff_ut_s,
        });
    }

    fn live_node<V: Vessel + ?Sized>(
        &self,
        vessel: &mut V,
    ) -> Result<Option<NodeState>, ManeuverError> {
        vessel.node_state(self.node).context(ManeuverVesselSnafu {
            action: "reading the node",
        })
    }

    fn ut<V: Vessel + ?Sized>(&self, vessel: &mut V) -> Result<f64, ManeuverError> {
        vessel.ut().context(ManeuverVesselSnafu {
            action: "reading universal time",
        })
    }
}
