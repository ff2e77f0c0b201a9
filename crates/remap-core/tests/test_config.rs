use std::path::PathBuf;

use remap_core::error::RemapError;
use remap_core::remap::config::{BackendPreference, RemapConfig, SwathBounds};

#[test]
fn test_defaults() {
    let config = RemapConfig::default();
    assert_eq!(config.num_procs, 1);
    assert_eq!(config.fill_value, -999.0);
    assert_eq!(config.work_dir, PathBuf::from("."));
    assert_eq!(config.backend, BackendPreference::Auto);
    assert_eq!(config.ms2gt.fornav, PathBuf::from("fornav"));
    assert!(config.forced_gpd.is_none());
    assert!(config.bounds.is_unbounded());
    config.validate().unwrap();
}

#[test]
fn test_partial_toml_uses_defaults() {
    let config: RemapConfig = toml::from_str(
        r#"
num_procs = 4
backend = "in_process"
weight_delta_max = 5.0

[bounds]
lat_south = 20.0
lat_north = 60.0

[ms2gt]
ll2cr = "/opt/ms2gt/bin/ll2cr"
fornav = "/opt/ms2gt/bin/fornav"
"#,
    )
    .unwrap();

    assert_eq!(config.num_procs, 4);
    assert_eq!(config.backend, BackendPreference::InProcess);
    assert_eq!(config.weight_delta_max, Some(5.0));
    assert_eq!(config.weight_distance_max, None);
    assert_eq!(config.fill_value, -999.0);
    assert_eq!(config.bounds.lat_north, Some(60.0));
    assert_eq!(config.ms2gt.ll2cr, PathBuf::from("/opt/ms2gt/bin/ll2cr"));
}

#[test]
fn test_toml_round_trip_of_defaults() {
    let text = toml::to_string_pretty(&RemapConfig::default()).unwrap();
    let parsed: RemapConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed, RemapConfig::default());
}

#[test]
fn test_validation() {
    let invalid = [
        RemapConfig {
            num_procs: 0,
            ..Default::default()
        },
        RemapConfig {
            weight_distance_max: Some(0.0),
            ..Default::default()
        },
        RemapConfig {
            weight_delta_max: Some(f64::NAN),
            ..Default::default()
        },
        RemapConfig {
            bounds: SwathBounds {
                lat_south: Some(10.0),
                lat_north: Some(-10.0),
                ..Default::default()
            },
            ..Default::default()
        },
    ];
    for config in invalid {
        assert!(
            matches!(config.validate(), Err(RemapError::InvalidConfig(_))),
            "{config:?}"
        );
    }
}

#[test]
fn test_bounds_contains() {
    let bounds = SwathBounds {
        lat_south: Some(-10.0),
        lat_north: Some(10.0),
        lon_west: Some(20.0),
        lon_east: Some(40.0),
    };
    assert!(bounds.contains(30.0, 0.0));
    assert!(!bounds.contains(30.0, 11.0));
    assert!(!bounds.contains(19.9, 0.0));
    assert!(!bounds.contains(-30.0, 0.0));
}

#[test]
fn test_bounds_across_antimeridian() {
    let bounds = SwathBounds {
        lon_west: Some(170.0),
        lon_east: Some(-170.0),
        ..Default::default()
    };
    assert!(!bounds.is_unbounded());
    assert!(bounds.contains(175.0, 0.0));
    assert!(bounds.contains(-175.0, 0.0));
    assert!(!bounds.contains(0.0, 0.0));
}
