use approx::assert_relative_eq;
use ascent_gnc::linalg::Vector3;
use ascent_gnc::mechanics::*;
use ascent_gnc::vessel::Engine;
use rstest::*;

const KERBIN_GM: f64 = 3.5316e12;

#[test]
fn circularize_from_apoapsis() {
    let (r, a1) = (700_000.0, 650_000.0);
    let v1 = (KERBIN_GM * (2.0 / r - 1.0 / a1)).sqrt();
    let v2 = (KERBIN_GM / r).sqrt();

    let dv = circularization_delta_v(KERBIN_GM, r, a1, r).unwrap();
    println!("circularization at {r} m: {dv:.6} m/s");
    assert_relative_eq!(dv, v2 - v1, max_relative = 1e-6);
    assert!(dv > 0.0, "raising the periapsis is a prograde burn");
}

#[test]
fn circularize_from_periapsis_is_retrograde() {
    let (r, a1) = (650_000.0, 700_000.0);
    let dv = circularization_delta_v(KERBIN_GM, r, a1, r).unwrap();
    assert!(dv < 0.0);
    assert_relative_eq!(
        dv,
        (KERBIN_GM / r).sqrt() - (KERBIN_GM * (2.0 / r - 1.0 / a1)).sqrt(),
        max_relative = 1e-12
    );
}

#[rstest]
#[case(0.0, 700_000.0, 650_000.0, MechanicsError::NonPositiveGm { mu: 0.0 })]
#[case(KERBIN_GM, -1.0, 650_000.0, MechanicsError::NonPositiveRadius { radius_m: -1.0 })]
#[case(KERBIN_GM, 700_000.0, 0.0, MechanicsError::NonPositiveSma { sma_m: 0.0 })]
fn invalid_orbits_are_domain_errors(
    #[case] mu: f64,
    #[case] r: f64,
    #[case] a1: f64,
    #[case] expected: MechanicsError,
) {
    assert_eq!(
        circularization_delta_v(mu, r, a1, 700_000.0),
        Err(expected)
    );
}

#[test]
fn target_sma_is_validated() {
    assert_eq!(
        circularization_delta_v(KERBIN_GM, 700_000.0, 650_000.0, -5.0),
        Err(MechanicsError::NonPositiveSma { sma_m: -5.0 })
    );
}

#[rstest]
#[case(70.0, 300.0)]
#[case(1_250.0, 345.0)]
#[case(-42.0, 800.0)]
fn burn_duration_recovers_propellant_mass(#[case] dv: f64, #[case] isp: f64) {
    let (g0, thrust, m0) = (9.81, 215_000.0, 12_500.0);
    let ve = isp * g0;

    let duration = burn_duration(dv, isp, g0, thrust, m0).unwrap();
    let propellant = duration * mass_flow_rate(thrust, ve);

    assert_relative_eq!(
        propellant,
        m0 - m0 / (dv.abs() / ve).exp(),
        max_relative = 1e-9
    );
    assert_relative_eq!(m0 - propellant, final_mass(dv.abs(), ve, m0), max_relative = 1e-9);
}

#[test]
fn zero_delta_v_is_instant() {
    assert_eq!(burn_duration(0.0, 300.0, 9.81, 1e5, 1e4).unwrap(), 0.0);
}

#[rstest]
#[case(300.0, 9.81, 0.0, 1e4, MechanicsError::NoThrust { thrust_n: 0.0 })]
#[case(
    0.0,
    9.81,
    1e5,
    1e4,
    MechanicsError::NonPositiveExhaustVelocity { exhaust_velocity_m_s: 0.0 }
)]
#[case(300.0, 9.81, 1e5, -1.0, MechanicsError::NonPositiveMass { mass_kg: -1.0 })]
fn unplannable_burns(
    #[case] isp: f64,
    #[case] g0: f64,
    #[case] thrust: f64,
    #[case] mass: f64,
    #[case] expected: MechanicsError,
) {
    assert_eq!(burn_duration(50.0, isp, g0, thrust, mass), Err(expected));
}

#[rstest]
#[case(Vector3::new(1.0, 0.0, 0.0))]
#[case(Vector3::new(0.3, -12.0, 4.5))]
#[case(Vector3::new(1e-3, 2e-3, -7e-4))]
fn angle_to_self_and_opposite(#[case] v: Vector3<f64>) {
    assert_relative_eq!(vector_angle_deg(&v, &v), 0.0, epsilon = 1e-5);
    assert_relative_eq!(vector_angle_deg(&v, &-v), 180.0, epsilon = 1e-5);
}

#[test]
fn angle_past_perpendicular() {
    let reference = Vector3::new(0.0, 1.0, 0.0);
    let rotated = Vector3::new(1.0, -0.01, 0.0);
    let angle = vector_angle_deg(&reference, &rotated);
    assert!(angle > 90.0 && angle < 91.0, "got {angle}");
    assert_relative_eq!(
        vector_angle_deg(&reference, &Vector3::new(0.0, 0.0, 3.0)),
        90.0,
        epsilon = 1e-12
    );
}

#[test]
fn mean_isp_is_not_thrust_weighted() {
    let engines = [Engine { isp_s: 250.0 }, Engine { isp_s: 350.0 }];
    assert_relative_eq!(mean_isp(&engines).unwrap(), 300.0);
    assert_eq!(mean_isp(&[]), Err(MechanicsError::NoActiveEngines));
}

#[test]
fn twr() {
    assert_relative_eq!(thrust_to_weight(196_200.0, 10_000.0, 9.81), 2.0);
    assert_eq!(thrust_to_weight(1.0, 0.0, 9.81), 0.0);
}
