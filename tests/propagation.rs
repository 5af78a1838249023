//! SGP4/SDP4 against published reference vectors (WGS-72 constants).

use approx::assert_relative_eq;
use nalgebra::Vector3;
use satfield::sgp4lib::{build_context, PropagatorContext};
use satfield::{parse_tle, EngineConfig, SatfieldError};

fn context(line1: &str, line2: &str) -> PropagatorContext {
    let tle = parse_tle(line1, line2).expect("reference TLE parses");
    build_context(&tle, &EngineConfig::default()).expect("reference TLE builds")
}

fn assert_position(ctx: &PropagatorContext, minutes: f64, expected: [f64; 3], epsilon: f64) {
    let state = ctx
        .propagate_minutes(minutes)
        .unwrap_or_else(|e| panic!("t={} failed: {}", minutes, e));
    let expected = Vector3::from(expected);
    let miss = (state.position - expected).norm();
    assert!(
        miss < epsilon,
        "t={} min: got {:?}, expected {:?} (miss {:.6} km)",
        minutes,
        state.position,
        expected,
        miss
    );
}

#[test]
fn test_near_earth_vanguard() {
    let ctx = context(
        "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753",
        "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667",
    );
    assert!(!ctx.is_deep_space());

    let epoch = ctx.propagate_minutes(0.0).unwrap();
    assert_relative_eq!(
        epoch.position,
        Vector3::new(7022.465_292_66, -1400.082_967_55, 0.039_951_55),
        epsilon = 1e-3
    );
    assert_relative_eq!(
        epoch.velocity,
        Vector3::new(1.893_841_015, 6.405_893_759, 4.534_807_250),
        epsilon = 1e-6
    );

    assert_position(&ctx, 360.0, [-7154.031_202_02, -3783.176_825_04, -3536.194_122_94], 1e-3);
    assert_position(&ctx, 4320.0, [-9060.473_735_69, 4658.709_525_02, 813.686_731_53], 1e-3);
}

#[test]
fn test_deep_space_without_resonance() {
    let ctx = context(
        "1 11801U          80230.29629788  .01431103  00000-0  14311-1      13",
        "2 11801  46.7916 230.4354 7318036  47.4722  10.4117  2.28537848    13",
    );
    assert!(ctx.is_deep_space());

    assert_position(&ctx, 0.0, [7473.370_666_50, 428.952_617_65, 5828.747_863_77], 0.01);
    assert_position(&ctx, 720.0, [14271.287_597_39, 24110.464_119_99, -4725.768_372_78], 0.1);
}

#[test]
fn test_molniya_half_day_resonance() {
    let ctx = context(
        "1 08195U 75081A   06176.33215444  .00000099  00000-0  11873-3 0   813",
        "2 08195  64.1586 279.0717 6877146 264.7651  20.2257  2.00491383225656",
    );
    assert!(ctx.is_deep_space());

    let epoch = ctx.propagate_minutes(0.0).unwrap();
    assert_relative_eq!(
        epoch.position,
        Vector3::new(2349.894_833_50, -14785.938_115_62, 0.021_193_78),
        epsilon = 1e-3
    );
    assert_relative_eq!(
        epoch.velocity,
        Vector3::new(2.721_488_096, -3.256_811_655, 4.498_416_672),
        epsilon = 1e-6
    );

    assert_position(&ctx, 120.0, [15223.917_136_58, -17852.958_817_13, 25280.395_582_24], 0.01);
    assert_position(&ctx, 2880.0, [3417.2093, -16038.7951, 1894.7493], 0.05);
}

#[test]
fn test_geosynchronous_resonance() {
    let ctx = context(
        "1 28626U 05008A   06176.46683397 -.00000205  00000-0  10000-3 0  2190",
        "2 28626   0.0019 286.9433 0000335  13.7918  55.6504  1.00270176  4891",
    );
    assert!(ctx.is_deep_space());

    let epoch = ctx.propagate_minutes(0.0).unwrap();
    assert_relative_eq!(
        epoch.position,
        Vector3::new(42080.718_522_13, -2646.863_874_36, 0.818_512_94),
        epsilon = 1e-3
    );
    assert_relative_eq!(
        epoch.velocity,
        Vector3::new(0.193_105_177, 3.068_688_251, 0.000_438_449),
        epsilon = 1e-6
    );

    assert_position(&ctx, 120.0, [37740.000_855_93, 18802.768_728_02, 3.455_125_84], 0.01);
    assert_position(&ctx, 1440.0, [42119.9626, -1925.7757, -0.1983], 0.05);
}

#[test]
fn test_resonant_orbits_propagate_backwards() {
    let geo = context(
        "1 28626U 05008A   06176.46683397 -.00000205  00000-0  10000-3 0  2190",
        "2 28626   0.0019 286.9433 0000335  13.7918  55.6504  1.00270176  4891",
    );
    for minutes in [-60.0, -720.0, -1440.0, -4320.0] {
        let r = geo.propagate_minutes(minutes).unwrap().radius();
        assert!((r - 42_164.0).abs() < 100.0, "GEO radius {} km at t={}", r, minutes);
    }

    let molniya = context(
        "1 08195U 75081A   06176.33215444  .00000099  00000-0  11873-3 0   813",
        "2 08195  64.1586 279.0717 6877146 264.7651  20.2257  2.00491383225656",
    );
    for minutes in [-120.0, -720.0, -2880.0] {
        let r = molniya.propagate_minutes(minutes).unwrap().radius();
        assert!(r > 6_500.0 && r < 47_000.0, "Molniya radius {} km at t={}", r, minutes);
    }

    // The resonance integrator restarts from epoch on every call
    let there = molniya.propagate_minutes(-1000.0).unwrap();
    let again = molniya.propagate_minutes(-1000.0).unwrap();
    assert_eq!(there.position, again.position);
}

#[test]
fn test_sub_surface_orbit_is_rejected() {
    let mut tle = parse_tle(
        "1 25544U 98067A   25229.18034946  .00009619  00000-0  17645-3 0  9996",
        "2 25544  51.6356   4.7550 0003499 229.5075 130.5609 15.49975761524621",
    )
    .unwrap();
    tle.mean_motion = 18.0;

    let err = build_context(&tle, &EngineConfig::default()).unwrap_err();
    assert!(matches!(err, SatfieldError::InvalidElements(_)), "got {:?}", err);
}
