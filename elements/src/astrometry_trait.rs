// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use canonical_error::CanonicalError;

/// Where a star falls on the detectors during one sector. Camera and CCD are
/// reported as given by the astrometry provider; they are validated by the
/// caller.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorPosition {
    pub tic_id: u64,
    // Degrees.
    pub ra: f64,
    pub dec: f64,
    pub sector: u32,
    pub camera: i32,
    pub ccd: i32,
    // Pixels, in the CCD's own frame.
    pub col_pix: f64,
    pub row_pix: f64,
}

pub trait AstrometryTrait {
    /// Returns one DetectorPosition for every (sector, camera, ccd) the star
    /// at `ra`/`dec` (degrees) lands on, including sectors that are only
    /// planned. An empty result means the star never falls on a detector.
    fn stars_to_pixels(&self, tic_id: u64, ra: f64, dec: f64)
                       -> Result<Vec<DetectorPosition>, CanonicalError>;
}
