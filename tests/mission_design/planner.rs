use crate::common::*;
use approx::assert_relative_eq;
use ascent_gnc::cosmic::Apsis;
use ascent_gnc::md::{ManeuverError, ManeuverPlan, ManeuverPlanner};
use ascent_gnc::mechanics::{burn_duration, circularization_delta_v, MechanicsError};
use ascent_gnc::vessel::{Engine, NodeHandle, ReferenceFrame, Vessel, VesselError};

#[test]
fn plan_is_centered_on_the_node() {
    let snapshot = orbiting_snapshot();
    let engines = [Engine { isp_s: 300.0 }];
    let r = snapshot.orbit.apoapsis_radius_m;

    let plan = ManeuverPlanner::plan(&snapshot, &engines, r, 1_060.0).unwrap();
    println!("{plan}");

    let dv = circularization_delta_v(GM_M3_S2, r, 650_000.0, r).unwrap();
    let duration = burn_duration(dv, 300.0, SURFACE_GRAVITY_M_S2, 200_000.0, 10_000.0).unwrap();
    assert_relative_eq!(plan.delta_v_m_s, dv);
    assert_relative_eq!(plan.burn_duration_s, duration);
    assert_relative_eq!(plan.burn_start_ut_s, 1_060.0 - duration / 2.0);
    assert_relative_eq!(plan.burn_end_ut_s(), 1_060.0 + duration / 2.0, epsilon = 1e-9);
    assert!(plan.node.is_none());
    assert!(plan.frame().is_none());
}

#[test]
fn no_engines_cannot_plan() {
    let snapshot = orbiting_snapshot();
    assert_eq!(
        ManeuverPlanner::plan(&snapshot, &[], 690_000.0, 0.0),
        Err(MechanicsError::NoActiveEngines)
    );
}

#[test]
fn circularize_adds_a_node() {
    let (mut vessel, _clock) = static_sim(1_000.0, orbiting_snapshot());

    let plan = ManeuverPlanner::circularize(&mut vessel, Apsis::Apoapsis).unwrap();

    assert_eq!(plan.node, Some(NodeHandle(1)));
    assert_eq!(plan.frame(), Some(ReferenceFrame::Maneuver(NodeHandle(1))));
    assert_relative_eq!(plan.node_ut_s, 1_060.0);
    assert!(plan.delta_v_m_s > 0.0);
    assert_eq!(
        vessel.commands,
        vec![Command::AddNode {
            ut_s: 1_060.0,
            prograde_m_s: plan.delta_v_m_s
        }]
    );
    assert_eq!(vessel.node_count(), 1);
}

#[test]
fn circularize_at_periapsis_is_retrograde() {
    let (mut vessel, _clock) = static_sim(0.0, orbiting_snapshot());
    let plan = ManeuverPlanner::circularize(&mut vessel, Apsis::Periapsis).unwrap();
    assert!(plan.delta_v_m_s < 0.0);
    assert_relative_eq!(plan.node_ut_s, 1_000.0);
    assert!(plan.burn_duration_s > 0.0);
}

#[test]
fn circularize_without_engines() {
    let (vessel, _clock) = static_sim(0.0, orbiting_snapshot());
    let mut vessel = vessel.with_engines(vec![]);
    assert_eq!(
        ManeuverPlanner::circularize(&mut vessel, Apsis::Apoapsis),
        Err(ManeuverError::Planning {
            source: MechanicsError::NoActiveEngines
        })
    );
    assert_eq!(vessel.node_count(), 0, "no node may be left behind");
}

#[test]
fn transport_failures_are_reported() {
    let (mut vessel, _clock) = static_sim(0.0, orbiting_snapshot());
    vessel.failing = Some("add_node");
    match ManeuverPlanner::circularize(&mut vessel, Apsis::Apoapsis) {
        Err(ManeuverError::ManeuverVessel { action, source }) => {
            assert_eq!(action, "adding maneuver node");
            assert!(matches!(source, VesselError::Transport { .. }));
        }
        other => panic!("expected a vessel error, got {other:?}"),
    }
}

#[test]
fn existing_node() {
    let (mut vessel, _clock) = static_sim(0.0, orbiting_snapshot());
    assert_eq!(ManeuverPlanner::plan_existing_node(&mut vessel), Ok(None));

    let late = vessel.add_node(500.0, 12.0).unwrap();
    let early = vessel.add_node(200.0, 30.0).unwrap();
    let plan = ManeuverPlanner::plan_existing_node(&mut vessel)
        .unwrap()
        .unwrap();
    assert_eq!(plan.node, Some(early));
    assert_ne!(plan.node, Some(late));
    assert_eq!(plan.delta_v_m_s, 30.0);
    assert_relative_eq!(plan.burn_start_ut_s, 200.0 - plan.burn_duration_s / 2.0);
}

#[test]
fn attaching_a_node_keeps_the_window() {
    let plan = ManeuverPlan::centered(50.0, 8.0, 100.0);
    let attached = plan.with_node(NodeHandle(7));
    assert_eq!(attached.burn_start_ut_s, 96.0);
    assert_eq!(attached.delta_v_m_s, plan.delta_v_m_s);
    assert_eq!(attached.node, Some(NodeHandle(7)));
    assert_eq!(
        format!("{attached}"),
        "50.000 m/s burn of 8.00 s from UT 96.00 s (node at UT 100.00 s, node #7)"
    );
}
