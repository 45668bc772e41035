// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

const ARCSEC_PER_DEGREE: f64 = 3600.0;

/// Convert ra/dec (radians) to x/y/z on unit sphere.
pub fn to_unit_vector(ra: f64, dec: f64) -> [f64; 3] {
    [
        (ra.cos() * dec.cos()), // x
        (ra.sin() * dec.cos()), // y
        dec.sin(),
    ] // z
}

/// Return the Euclidean distance between the given vectors.
pub fn distance(v1: &[f64; 3], v2: &[f64; 3]) -> f64 {
    ((v1[0] - v2[0]) * (v1[0] - v2[0])
        + (v1[1] - v2[1]) * (v1[1] - v2[1])
        + (v1[2] - v2[2]) * (v1[2] - v2[2]))
        .sqrt()
}

/// Converts distance between two unit vectors the the angle between them.
pub fn angle_from_distance(distance: f64) -> f64 {
    2.0 * (0.5 * distance).asin()
}

/// Returns the separation, in radians, between the given celestial coordinates
/// (in radians). Uses the chord length, which stays accurate down to
/// sub-arcsecond separations.
pub fn angular_separation(
    p0_ra: f64,
    p0_dec: f64,
    p1_ra: f64,
    p1_dec: f64,
) -> f64 {
    let v0 = to_unit_vector(p0_ra, p0_dec);
    let v1 = to_unit_vector(p1_ra, p1_dec);
    angle_from_distance(distance(&v0, &v1))
}

/// Returns the separation, in arcseconds, between the given celestial
/// coordinates (in degrees).
pub fn separation_arcsec(
    p0_ra_deg: f64,
    p0_dec_deg: f64,
    p1_ra_deg: f64,
    p1_dec_deg: f64,
) -> f64 {
    let sep = angular_separation(p0_ra_deg.to_radians(), p0_dec_deg.to_radians(),
                                 p1_ra_deg.to_radians(), p1_dec_deg.to_radians());
    sep.to_degrees() * ARCSEC_PER_DEGREE
}

pub fn degrees_from_arcsec(arcsec: f64) -> f64 {
    arcsec / ARCSEC_PER_DEGREE
}
