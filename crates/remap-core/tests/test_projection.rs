use approx::assert_relative_eq;
use remap_core::error::RemapError;
use remap_core::projection::Projection;

const R: f64 = 6_378_137.0;

#[test]
fn test_parse_latlong_aliases() {
    for def in [
        "+proj=latlong +datum=WGS84",
        "+proj=longlat +ellps=WGS84 +no_defs",
        "+proj=lonlat",
        "+proj=latlon",
    ] {
        assert_eq!(Projection::parse(def).unwrap(), Projection::LatLong, "{def}");
    }
}

#[test]
fn test_parse_mercator_parameters() {
    assert_eq!(
        Projection::parse("+proj=merc +R=6371000 +lon_0=10").unwrap(),
        Projection::Mercator {
            radius: 6_371_000.0,
            lon_0: 10.0
        }
    );
    assert_eq!(
        Projection::parse("+proj=merc +a=6378137").unwrap(),
        Projection::Mercator {
            radius: R,
            lon_0: 0.0
        }
    );
    assert_eq!(
        Projection::parse("+proj=merc").unwrap(),
        Projection::Mercator {
            radius: R,
            lon_0: 0.0
        }
    );
}

#[test]
fn test_parse_rejects_unsupported() {
    for def in ["+proj=lcc +lat_1=25", "+datum=WGS84", "+proj=merc +R=abc", "+proj=merc +R"] {
        assert!(
            matches!(Projection::parse(def), Err(RemapError::UnsupportedProjection(_))),
            "{def}"
        );
    }
}

#[test]
fn test_latlong_is_identity() {
    assert_eq!(
        Projection::LatLong.forward(-120.5, 45.25),
        Some((-120.5, 45.25))
    );
    assert_eq!(Projection::LatLong.forward(0.0, 91.0), None);
    assert_eq!(Projection::LatLong.forward(f64::NAN, 0.0), None);
}

#[test]
fn test_mercator_forward() {
    let merc = Projection::Mercator {
        radius: R,
        lon_0: 0.0,
    };
    let (x, y) = merc.forward(0.0, 0.0).unwrap();
    assert_relative_eq!(x, 0.0);
    assert_relative_eq!(y, 0.0, epsilon = 1e-9);

    let (x, _) = merc.forward(180.0, 0.0).unwrap();
    assert_relative_eq!(x, std::f64::consts::PI * R, max_relative = 1e-12);

    // Web Mercator's square extent at its latitude limit.
    let (_, y) = merc.forward(0.0, 85.051_128_779_806_6).unwrap();
    assert_relative_eq!(y, std::f64::consts::PI * R, max_relative = 1e-9);

    assert_eq!(merc.forward(0.0, 89.0), None);
}

#[test]
fn test_mercator_central_meridian_wraps() {
    let merc = Projection::Mercator {
        radius: R,
        lon_0: 170.0,
    };
    let (east, _) = merc.forward(175.0, 10.0).unwrap();
    let (across, _) = merc.forward(-175.0, 10.0).unwrap();
    assert!(east > 0.0);
    assert!(across > east, "crossing the antimeridian keeps increasing x");
    assert_relative_eq!(across, (15.0f64).to_radians() * R, max_relative = 1e-12);
}
