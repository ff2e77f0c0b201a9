//! Closed-form forward projections used by the in-process coordinate mapper.
//!
//! Only the projections needed for the built-in and common user grids are
//! supported: geographic lat/lon and spherical Mercator.

use std::collections::HashMap;
use std::f64::consts::FRAC_PI_4;

use crate::consts::{EARTH_RADIUS_M, MERCATOR_MAX_LAT};
use crate::error::{RemapError, Result};

#[derive(Clone, Debug, PartialEq)]
pub enum Projection {
    /// Identity: x = longitude, y = latitude, in degrees.
    LatLong,
    /// Spherical Mercator in meters.
    Mercator { radius: f64, lon_0: f64 },
}

impl Projection {
    /// Parse a PROJ.4 style definition such as `+proj=merc +R=6371000`.
    pub fn parse(proj4: &str) -> Result<Self> {
        let params = parse_params(proj4);
        let proj = params
            .get("proj")
            .and_then(|v| v.as_deref())
            .ok_or_else(|| RemapError::UnsupportedProjection(format!("no +proj in '{proj4}'")))?;

        match proj {
            "latlong" | "longlat" | "lonlat" | "latlon" => Ok(Self::LatLong),
            "merc" => {
                let radius = match numeric(&params, "R", proj4)? {
                    Some(r) => r,
                    None => numeric(&params, "a", proj4)?.unwrap_or(EARTH_RADIUS_M),
                };
                if radius <= 0.0 {
                    return Err(RemapError::UnsupportedProjection(format!(
                        "non-positive radius in '{proj4}'"
                    )));
                }
                let lon_0 = numeric(&params, "lon_0", proj4)?.unwrap_or(0.0);
                Ok(Self::Mercator { radius, lon_0 })
            }
            other => Err(RemapError::UnsupportedProjection(format!(
                "+proj={other} is not available in-process"
            ))),
        }
    }

    /// Project a lon/lat pair (degrees). Returns `None` when the point is
    /// outside the projection's domain.
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        match *self {
            Self::LatLong => Some((lon, lat)),
            Self::Mercator { radius, lon_0 } => {
                if lat.abs() > MERCATOR_MAX_LAT {
                    return None;
                }
                let dlon = wrap_longitude(lon - lon_0).to_radians();
                let x = radius * dlon;
                let y = radius * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
                Some((x, y))
            }
        }
    }
}

/// Wrap a longitude difference into [-180, 180).
fn wrap_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid keeps +180 as -180; keep the antimeridian on the east edge
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}

fn parse_params(proj4: &str) -> HashMap<&str, Option<String>> {
    proj4
        .split_whitespace()
        .filter_map(|tok| tok.strip_prefix('+'))
        .map(|tok| match tok.split_once('=') {
            Some((k, v)) => (k, Some(v.to_string())),
            None => (tok, None),
        })
        .collect()
}

fn numeric(params: &HashMap<&str, Option<String>>, key: &str, proj4: &str) -> Result<Option<f64>> {
    match params.get(key) {
        Some(Some(v)) => v.parse::<f64>().map(Some).map_err(|_| {
            RemapError::UnsupportedProjection(format!("bad +{key} value '{v}' in '{proj4}'"))
        }),
        Some(None) => Err(RemapError::UnsupportedProjection(format!(
            "+{key} needs a value in '{proj4}'"
        ))),
        None => Ok(None),
    }
}
