//! A scripted vessel and a simulated clock sharing the same universal time.
//!
//! Nothing here sleeps: the clock only advances the shared time, and the vessel evaluates its
//! telemetry model at the current time whenever it is polled.

use ascent_gnc::cosmic::{OrbitSnapshot, TelemetrySnapshot};
use ascent_gnc::linalg::Vector3;
use ascent_gnc::time::Duration;
use ascent_gnc::vessel::{
    Clock, Engine, NodeHandle, NodeState, ReferenceFrame, Vessel, VesselError,
};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Kerbin-like gravitational parameter, in m^3/s^2
pub const GM_M3_S2: f64 = 3.5316e12;
/// Kerbin-like equatorial radius, in meters
pub const BODY_RADIUS_M: f64 = 600_000.0;
pub const SURFACE_GRAVITY_M_S2: f64 = 9.81;

/// Every command the guidance sent to the vessel, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Throttle(f64),
    PointAlong(Vector3<f64>, ReferenceFrame),
    Roll(f64),
    Disengage,
    Stage,
    ActionGroup(u8),
    Sas(bool),
    Rcs(bool),
    StabilityAssist,
    AddNode { ut_s: f64, prograde_m_s: f64 },
    RemoveNode(NodeHandle),
    WarpTo(f64),
}

/// What the telemetry model may depend on, besides time.
#[derive(Copy, Clone, Debug, Default)]
pub struct Controls {
    pub throttle: f64,
    pub stages_activated: u32,
    /// Universal time of the first staging, i.e. lift off
    pub launch_ut_s: Option<f64>,
}

type TelemetryModel = Box<dyn FnMut(&mut TelemetrySnapshot, &Controls)>;

struct SimNode {
    ut_s: f64,
    delta_v_m_s: f64,
    ignition_ut_s: Option<f64>,
    cutoff_ut_s: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct SimClock {
    now: Rc<Cell<f64>>,
}

impl SimClock {
    pub fn now(&self) -> f64 {
        self.now.get()
    }
}

impl Clock for SimClock {
    fn sleep(&mut self, duration: Duration) {
        self.now.set(self.now.get() + duration.to_seconds());
    }
}

pub struct SimVessel {
    now: Rc<Cell<f64>>,
    snapshot: TelemetrySnapshot,
    model: TelemetryModel,
    controls: Controls,
    engines: Vec<Engine>,
    nodes: BTreeMap<u64, SimNode>,
    next_node_id: u64,
    /// Delta-v imparted per second of burn at full throttle, in m/s^2
    pub burn_accel_m_s2: f64,
    /// Number of polls before the attitude reports settled
    pub settle_polls: u32,
    /// Name of the vessel call that fails with a transport error
    pub failing: Option<&'static str>,
    pub commands: Vec<Command>,
}

/// A vessel in a 650 km SMA orbit with its apoapsis at 90 km, 60 s away.
pub fn orbiting_snapshot() -> TelemetrySnapshot {
    let apoapsis_radius_m = BODY_RADIUS_M + 90_000.0;
    let periapsis_radius_m = 2.0 * 650_000.0 - apoapsis_radius_m;
    TelemetrySnapshot {
        mean_altitude_m: 80_000.0,
        surface_altitude_m: 80_000.0,
        apoapsis_altitude_m: 90_000.0,
        vertical_speed_m_s: 50.0,
        heading_deg: 90.0,
        roll_deg: 0.0,
        mass_kg: 10_000.0,
        thrust_n: 0.0,
        available_thrust_n: 200_000.0,
        isp_s: 300.0,
        ut_s: 0.0,
        orbit: OrbitSnapshot {
            gm_m3_s2: GM_M3_S2,
            surface_gravity_m_s2: SURFACE_GRAVITY_M_S2,
            apoapsis_radius_m,
            periapsis_radius_m,
            periapsis_altitude_m: periapsis_radius_m - BODY_RADIUS_M,
            sma_m: 650_000.0,
            eccentricity: (apoapsis_radius_m - periapsis_radius_m)
                / (apoapsis_radius_m + periapsis_radius_m),
            inclination_deg: 0.1,
            time_to_apoapsis_s: 60.0,
            time_to_periapsis_s: 1_000.0,
        },
    }
}

/// A vessel sitting on the pad, with engines of 300 s Isp.
pub fn pad_snapshot() -> TelemetrySnapshot {
    let mut snapshot = orbiting_snapshot();
    snapshot.mean_altitude_m = 0.0;
    snapshot.surface_altitude_m = 0.0;
    snapshot.apoapsis_altitude_m = 0.0;
    snapshot.vertical_speed_m_s = 0.0;
    snapshot.heading_deg = 85.0;
    snapshot.roll_deg = 12.0;
    snapshot
}

/// Creates a vessel whose telemetry is `initial` updated by `model` at every poll, and the
/// clock that drives it. Time starts at `ut0_s`.
pub fn sim<F>(ut0_s: f64, initial: TelemetrySnapshot, model: F) -> (SimVessel, SimClock)
where
    F: FnMut(&mut TelemetrySnapshot, &Controls) + 'static,
{
    let now = Rc::new(Cell::new(ut0_s));
    let vessel = SimVessel {
        now: now.clone(),
        snapshot: initial,
        model: Box::new(model),
        controls: Controls::default(),
        engines: vec![Engine { isp_s: 300.0 }],
        nodes: BTreeMap::new(),
        next_node_id: 1,
        burn_accel_m_s2: 1.0,
        settle_polls: 2,
        failing: None,
        commands: Vec::new(),
    };
    (vessel, SimClock { now })
}

/// A vessel whose telemetry never changes, except for the time.
pub fn static_sim(ut0_s: f64, snapshot: TelemetrySnapshot) -> (SimVessel, SimClock) {
    sim(ut0_s, snapshot, |_, _| {})
}

impl SimVessel {
    pub fn with_engines(mut self, engines: Vec<Engine>) -> Self {
        self.engines = engines;
        self
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Removes a node behind the guidance's back, as a player deleting it would.
    pub fn delete_node(&mut self, node: NodeHandle) {
        self.nodes.remove(&node.0);
    }

    /// All the throttle commands, in order.
    pub fn throttles(&self) -> Vec<f64> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::Throttle(throttle) => Some(*throttle),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Command) -> usize {
        self.commands.iter().filter(|cmd| *cmd == wanted).count()
    }

    fn check(&self, action: &'static str) -> Result<(), VesselError> {
        if self.failing == Some(action) {
            Err(VesselError::Transport {
                action,
                details: "connection reset by peer".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl Vessel for SimVessel {
    fn telemetry(&mut self) -> Result<TelemetrySnapshot, VesselError> {
        self.check("telemetry")?;
        self.snapshot.ut_s = self.now.get();
        (self.model)(&mut self.snapshot, &self.controls);
        Ok(self.snapshot)
    }

    fn ut(&mut self) -> Result<f64, VesselError> {
        self.check("ut")?;
        Ok(self.now.get())
    }

    fn set_throttle(&mut self, throttle: f64) -> Result<(), VesselError> {
        self.check("set_throttle")?;
        let now = self.now.get();
        for node in self.nodes.values_mut() {
            if throttle > 0.0 && node.ignition_ut_s.is_none() {
                node.ignition_ut_s = Some(now);
            } else if throttle <= 0.0
                && node.ignition_ut_s.is_some()
                && node.cutoff_ut_s.is_none()
            {
                node.cutoff_ut_s = Some(now);
            }
        }
        self.controls.throttle = throttle;
        self.commands.push(Command::Throttle(throttle));
        Ok(())
    }

    fn point_along(
        &mut self,
        direction: Vector3<f64>,
        frame: ReferenceFrame,
    ) -> Result<(), VesselError> {
        self.check("point_along")?;
        self.commands.push(Command::PointAlong(direction, frame));
        Ok(())
    }

    fn target_roll(&mut self, roll_deg: f64) -> Result<(), VesselError> {
        self.check("target_roll")?;
        self.commands.push(Command::Roll(roll_deg));
        Ok(())
    }

    fn attitude_settled(&mut self) -> Result<bool, VesselError> {
        self.check("attitude_settled")?;
        if self.settle_polls == 0 {
            Ok(true)
        } else {
            self.settle_polls -= 1;
            Ok(false)
        }
    }

    fn disengage_attitude(&mut self) -> Result<(), VesselError> {
        self.check("disengage_attitude")?;
        self.commands.push(Command::Disengage);
        Ok(())
    }

    fn activate_next_stage(&mut self) -> Result<(), VesselError> {
        self.check("activate_next_stage")?;
        self.controls.stages_activated += 1;
        if self.controls.launch_ut_s.is_none() {
            self.controls.launch_ut_s = Some(self.now.get());
        }
        self.commands.push(Command::Stage);
        Ok(())
    }

    fn toggle_action_group(&mut self, group: u8) -> Result<(), VesselError> {
        self.check("toggle_action_group")?;
        self.commands.push(Command::ActionGroup(group));
        Ok(())
    }

    fn set_sas(&mut self, enabled: bool) -> Result<(), VesselError> {
        self.check("set_sas")?;
        self.commands.push(Command::Sas(enabled));
        Ok(())
    }

    fn set_rcs(&mut self, enabled: bool) -> Result<(), VesselError> {
        self.check("set_rcs")?;
        self.commands.push(Command::Rcs(enabled));
        Ok(())
    }

    fn engage_stability_assist(&mut self) -> Result<(), VesselError> {
        self.check("engage_stability_assist")?;
        self.commands.push(Command::StabilityAssist);
        Ok(())
    }

    fn active_engines(&mut self) -> Result<Vec<Engine>, VesselError> {
        self.check("active_engines")?;
        Ok(self.engines.clone())
    }

    fn add_node(&mut self, ut_s: f64, prograde_m_s: f64) -> Result<NodeHandle, VesselError> {
        self.check("add_node")?;
        let id = self.next_node_id;
        self.next_node_id += 1;
        self.nodes.insert(
            id,
            SimNode {
                ut_s,
                delta_v_m_s: prograde_m_s,
                ignition_ut_s: None,
                cutoff_ut_s: None,
            },
        );
        self.commands.push(Command::AddNode { ut_s, prograde_m_s });
        Ok(NodeHandle(id))
    }

    fn next_node(&mut self) -> Result<Option<NodeHandle>, VesselError> {
        self.check("next_node")?;
        Ok(self
            .nodes
            .iter()
            .min_by(|(_, a), (_, b)| a.ut_s.total_cmp(&b.ut_s))
            .map(|(id, _)| NodeHandle(*id)))
    }

    /// The burn vector lies along the prograde axis of the node frame and shrinks at
    /// `burn_accel_m_s2` while the throttle is open. Burning past the node flips it.
    fn node_state(&mut self, node: NodeHandle) -> Result<Option<NodeState>, VesselError> {
        self.check("node_state")?;
        let now = self.now.get();
        Ok(self.nodes.get(&node.0).map(|sim_node| {
            let burned_s = match sim_node.ignition_ut_s {
                Some(ignition) => sim_node.cutoff_ut_s.unwrap_or(now) - ignition,
                None => 0.0,
            };
            let remaining = sim_node.delta_v_m_s.signum()
                * (sim_node.delta_v_m_s.abs() - self.burn_accel_m_s2 * burned_s);
            NodeState {
                ut_s: sim_node.ut_s,
                delta_v_m_s: sim_node.delta_v_m_s,
                remaining_delta_v_m_s: remaining.abs(),
                burn_vector: Vector3::new(0.0, remaining, 0.0),
            }
        }))
    }

    fn remove_node(&mut self, node: NodeHandle) -> Result<(), VesselError> {
        self.check("remove_node")?;
        self.nodes.remove(&node.0);
        self.commands.push(Command::RemoveNode(node));
        Ok(())
    }

    fn warp_to(&mut self, ut_s: f64) -> Result<(), VesselError> {
        self.check("warp_to")?;
        if ut_s > self.now.get() {
            self.now.set(ut_s);
        }
        self.commands.push(Command::WarpTo(ut_s));
        Ok(())
    }
}
