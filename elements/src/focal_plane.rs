// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! Geometry of the TESS focal plane as drawn on a camera diagram.
//!
//! Each camera has four CCDs arranged as a 2x2 mosaic. A CCD's local pixel
//! frame is placed onto one quadrant of a `2S x 2S` mosaic (S = `CCD_SIZE`)
//! by an additive offset plus an optional reflection per axis, so that all
//! four CCDs of a camera share the orientation of the sensor readout.

use canonical_error::{invalid_argument_error, CanonicalError};

/// Edge length of one CCD, in pixels.
pub const CCD_SIZE: f64 = 2048.0;

/// Edge length of the full 2x2 mosaic, in pixels.
pub const MOSAIC_SIZE: f64 = 2.0 * CCD_SIZE;

/// Distance from the CCD corner of the readout arrows' anchor, and the length
/// of each arrow, in pixels.
pub const ARROW_ANCHOR: f64 = 128.0;

pub const NUM_CAMERAS: i32 = 4;
pub const NUM_CCDS: i32 = 4;

/// Cameras 1 and 2 share one orientation of their CCDs; cameras 3 and 4
/// share the mirrored one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraGroup {
    Cameras12,
    Cameras34,
}

impl CameraGroup {
    pub fn for_camera(camera: i32) -> Result<Self, CanonicalError> {
        match camera {
            1 | 2 => Ok(CameraGroup::Cameras12),
            3 | 4 => Ok(CameraGroup::Cameras34),
            _ => Err(invalid_argument_error(
                format!("Camera {} not in 1..={}", camera, NUM_CAMERAS).as_str())),
        }
    }
}

/// How one pixel axis of a CCD maps onto the mosaic:
/// `mosaic = offset * CCD_SIZE + (reflected ? -pixel : pixel)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisTransform {
    // In units of CCD_SIZE: 0, 1 or 2.
    pub offset: u8,
    pub reflected: bool,
}

impl AxisTransform {
    const fn direct(offset: u8) -> Self {
        AxisTransform{offset, reflected: false}
    }
    const fn reflected(offset: u8) -> Self {
        AxisTransform{offset, reflected: true}
    }

    pub fn apply(&self, pixel: f64) -> f64 {
        self.offset as f64 * CCD_SIZE + self.sign() * pixel
    }

    /// +1 if increasing pixel value moves rightward/upward on the mosaic, -1
    /// otherwise.
    pub fn sign(&self) -> f64 {
        if self.reflected { -1.0 } else { 1.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CcdTransform {
    pub column: AxisTransform,
    pub row: AxisTransform,
}

const fn ccd_transform(column: AxisTransform, row: AxisTransform) -> CcdTransform {
    CcdTransform{column, row}
}

// Indexed by ccd - 1.
const CAMERAS_12_TABLE: [CcdTransform; 4] = [
    ccd_transform(AxisTransform::reflected(2), AxisTransform::direct(0)),
    ccd_transform(AxisTransform::reflected(1), AxisTransform::direct(0)),
    ccd_transform(AxisTransform::direct(0), AxisTransform::reflected(2)),
    ccd_transform(AxisTransform::direct(1), AxisTransform::reflected(2)),
];

const CAMERAS_34_TABLE: [CcdTransform; 4] = [
    ccd_transform(AxisTransform::direct(0), AxisTransform::reflected(2)),
    ccd_transform(AxisTransform::direct(1), AxisTransform::reflected(2)),
    ccd_transform(AxisTransform::reflected(2), AxisTransform::direct(0)),
    ccd_transform(AxisTransform::reflected(1), AxisTransform::direct(0)),
];

/// Returns the transform descriptor for the given camera and CCD (both
/// 1-based).
pub fn ccd_transform_for(camera: i32, ccd: i32) -> Result<CcdTransform, CanonicalError> {
    let group = CameraGroup::for_camera(camera)?;
    if !(1..=NUM_CCDS).contains(&ccd) {
        return Err(invalid_argument_error(
            format!("CCD {} not in 1..={}", ccd, NUM_CCDS).as_str()));
    }
    let table = match group {
        CameraGroup::Cameras12 => &CAMERAS_12_TABLE,
        CameraGroup::Cameras34 => &CAMERAS_34_TABLE,
    };
    Ok(table[(ccd - 1) as usize])
}

/// Maps a CCD-local pixel position onto the camera mosaic. Returns
/// (mosaic_x, mosaic_y).
pub fn to_mosaic(camera: i32, ccd: i32, col_pix: f64, row_pix: f64)
                 -> Result<(f64, f64), CanonicalError> {
    let transform = ccd_transform_for(camera, ccd)?;
    Ok((transform.column.apply(col_pix), transform.row.apply(row_pix)))
}

/// An arrow on the mosaic diagram: start point and offset vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arrow {
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
}

/// The pair of arrows showing in which direction a CCD's columns and rows
/// increase, i.e. the readout direction of the sensor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReadoutArrows {
    // Horizontal arrow, along increasing column.
    pub column: Arrow,
    // Vertical arrow, along increasing row.
    pub row: Arrow,
}

/// Both arrows start at the mosaic position of pixel
/// (ARROW_ANCHOR, ARROW_ANCHOR) of the CCD.
pub fn readout_arrows(camera: i32, ccd: i32) -> Result<ReadoutArrows, CanonicalError> {
    let transform = ccd_transform_for(camera, ccd)?;
    let x = transform.column.apply(ARROW_ANCHOR);
    let y = transform.row.apply(ARROW_ANCHOR);
    Ok(ReadoutArrows{
        column: Arrow{x, y, dx: transform.column.sign() * ARROW_ANCHOR, dy: 0.0},
        row: Arrow{x, y, dx: 0.0, dy: transform.row.sign() * ARROW_ANCHOR},
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use canonical_error::CanonicalErrorCode;

    use super::*;

    #[test]
    fn test_table_sample_points() {
        let s = CCD_SIZE;
        let (col, row) = (100.0, 300.0);
        // (camera, ccd, expected_x, expected_y)
        let expected = [
            (1, 1, 2.0 * s - col, row),
            (1, 2, s - col, row),
            (1, 3, col, 2.0 * s - row),
            (1, 4, s + col, 2.0 * s - row),
            (3, 1, col, 2.0 * s - row),
            (3, 2, s + col, 2.0 * s - row),
            (3, 3, 2.0 * s - col, row),
            (3, 4, s - col, row),
        ];
        for (camera, ccd, ex, ey) in expected {
            let (x, y) = to_mosaic(camera, ccd, col, row).unwrap();
            assert_abs_diff_eq!(x, ex);
            assert_abs_diff_eq!(y, ey);
            // Cameras in the same group share the table.
            let (x2, y2) = to_mosaic(camera + 1, ccd, col, row).unwrap();
            assert_eq!((x, y), (x2, y2));
        }
    }

    #[test]
    fn test_origin_corners() {
        assert_eq!(to_mosaic(1, 1, 0.0, 0.0).unwrap(), (4096.0, 0.0));
        assert_eq!(to_mosaic(3, 2, 0.0, 0.0).unwrap(), (2048.0, 4096.0));
        assert_eq!(to_mosaic(2, 3, 0.0, 0.0).unwrap(), (0.0, 4096.0));
        assert_eq!(to_mosaic(4, 4, 0.0, 0.0).unwrap(), (2048.0, 0.0));
    }

    #[test]
    fn test_mapping_stays_on_mosaic() {
        let samples = [0.0, 1.0, 511.5, 1024.0, 2047.0, 2048.0];
        for camera in 1..=NUM_CAMERAS {
            for ccd in 1..=NUM_CCDS {
                for col in samples {
                    for row in samples {
                        let (x, y) = to_mosaic(camera, ccd, col, row).unwrap();
                        assert!((0.0..=MOSAIC_SIZE).contains(&x), "x={}", x);
                        assert!((0.0..=MOSAIC_SIZE).contains(&y), "y={}", y);
                    }
                }
            }
        }
    }

    #[test]
    fn test_mapping_is_injective_per_ccd() {
        let samples = [0.0, 3.0, 700.25, 2048.0];
        for camera in 1..=2 {
            for ccd in 1..=NUM_CCDS {
                let mut seen: Vec<(f64, f64)> = Vec::new();
                for col in samples {
                    for row in samples {
                        let mapped = to_mosaic(camera, ccd, col, row).unwrap();
                        assert!(!seen.contains(&mapped),
                                "camera {} ccd {} collides at {:?}", camera, ccd, mapped);
                        seen.push(mapped);
                    }
                }
            }
        }
    }

    #[test]
    fn test_ccds_fill_distinct_quadrants() {
        for camera in 1..=NUM_CAMERAS {
            let mut centers: Vec<(f64, f64)> = (1..=NUM_CCDS)
                .map(|ccd| to_mosaic(camera, ccd, CCD_SIZE / 2.0, CCD_SIZE / 2.0).unwrap())
                .collect();
            centers.sort_by(|a, b| a.partial_cmp(b).unwrap());
            assert_eq!(centers, vec![(1024.0, 1024.0), (1024.0, 3072.0),
                                     (3072.0, 1024.0), (3072.0, 3072.0)]);
        }
    }

    #[test]
    fn test_bad_indices() {
        assert!(to_mosaic(0, 1, 0.0, 0.0).is_err());
        assert!(to_mosaic(5, 1, 0.0, 0.0).is_err());
        assert!(to_mosaic(1, 0, 0.0, 0.0).is_err());
        let err = to_mosaic(1, 5, 0.0, 0.0).unwrap_err();
        assert!(err.code == CanonicalErrorCode::InvalidArgument);
        assert!(readout_arrows(7, 1).is_err());
    }

    #[test]
    fn test_readout_arrows() {
        let s = CCD_SIZE;
        let a = ARROW_ANCHOR;
        // (camera, ccd, x, y, column dx, row dy)
        let expected = [
            (1, 1, 2.0 * s - a, a, -a, a),
            (1, 2, s - a, a, -a, a),
            (1, 3, a, 2.0 * s - a, a, -a),
            (1, 4, s + a, 2.0 * s - a, a, -a),
            (4, 1, a, 2.0 * s - a, a, -a),
            (4, 2, s + a, 2.0 * s - a, a, -a),
            (4, 3, 2.0 * s - a, a, -a, a),
            (4, 4, s - a, a, -a, a),
        ];
        for (camera, ccd, x, y, col_dx, row_dy) in expected {
            let arrows = readout_arrows(camera, ccd).unwrap();
            assert_eq!(arrows.column, Arrow{x, y, dx: col_dx, dy: 0.0});
            assert_eq!(arrows.row, Arrow{x, y, dx: 0.0, dy: row_dy});
        }
    }
}
