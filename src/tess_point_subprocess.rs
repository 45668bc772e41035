// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::ffi::{OsStr, OsString};
use std::process::{Command, Stdio};

use canonical_error::{CanonicalError, data_loss_error, failed_precondition_error,
                      internal_error};
use log::{debug, info, warn};

use waldo_elements::astrometry_trait::{AstrometryTrait, DetectorPosition};

// Column order of the tess_stars2px table:
// TIC | RA | Dec | EclipticLong | EclipticLat | Sector | Camera | Ccd |
// ColPix | RowPix | EdgeWarn
const SECTOR_COLUMN: usize = 5;
const CAMERA_COLUMN: usize = 6;
const CCD_COLUMN: usize = 7;
const COL_PIX_COLUMN: usize = 8;
const ROW_PIX_COLUMN: usize = 9;

/// Parses the table printed by `python -m tess_stars2px`. Lines that are not
/// table rows (header comments, "No Target/s were found ..." notices) are
/// skipped. The TIC column is replaced by `tic_id`, as coordinate queries
/// report it as zero.
pub fn parse_stars2px_output(output: &str, tic_id: u64)
                             -> Result<Vec<DetectorPosition>, CanonicalError> {
    let mut positions = Vec::new();
    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || !line.contains('|') {
            if !line.is_empty() {
                debug!("tess_stars2px: {}", line);
            }
            continue;
        }
        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        if fields.len() <= ROW_PIX_COLUMN {
            return Err(data_loss_error(
                format!("Too few columns in tess_stars2px row {:?}", line).as_str()));
        }
        let bad_row = || data_loss_error(
            format!("Could not parse tess_stars2px row {:?}", line).as_str());
        positions.push(DetectorPosition {
            tic_id,
            ra: fields[1].parse().map_err(|_| bad_row())?,
            dec: fields[2].parse().map_err(|_| bad_row())?,
            sector: fields[SECTOR_COLUMN].parse().map_err(|_| bad_row())?,
            camera: fields[CAMERA_COLUMN].parse().map_err(|_| bad_row())?,
            ccd: fields[CCD_COLUMN].parse().map_err(|_| bad_row())?,
            col_pix: fields[COL_PIX_COLUMN].parse().map_err(|_| bad_row())?,
            row_pix: fields[ROW_PIX_COLUMN].parse().map_err(|_| bad_row())?,
        });
    }
    Ok(positions)
}

/// Runs the tess-point command line tool to convert sky coordinates to TESS
/// detector pixels. Requires a python interpreter with the `tess-point`
/// package installed.
pub struct TessPointSubprocess {
    python: OsString,
}

impl TessPointSubprocess {
    pub fn new(python: impl AsRef<OsStr>) -> Self {
        TessPointSubprocess{python: python.as_ref().to_os_string()}
    }

    fn make_command(&self, ra: f64, dec: f64) -> Command {
        let mut command = Command::new(&self.python);
        command.arg("-m")
            .arg("tess_stars2px")
            .arg("-c")
            .arg(format!("{}", ra))
            .arg(format!("{}", dec))
            .stdin(Stdio::null());
        command
    }
}

impl AstrometryTrait for TessPointSubprocess {
    fn stars_to_pixels(&self, tic_id: u64, ra: f64, dec: f64)
                       -> Result<Vec<DetectorPosition>, CanonicalError> {
        let output = match self.make_command(ra, dec).output() {
            Err(e) => {
                return Err(failed_precondition_error(
                    format!("Could not run tess_stars2px with {:?}: {:?}",
                            self.python, e).as_str()));
            },
            Ok(output) => output,
        };
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            warn!("tess_stars2px: {}", line);
        }
        if !output.status.success() {
            return Err(internal_error(
                format!("tess_stars2px exited with status={:?}", output.status).as_str()));
        }
        let positions = parse_stars2px_output(&String::from_utf8_lossy(&output.stdout),
                                              tic_id)?;
        info!("TIC {} falls on detectors in {} sector(s)", tic_id, positions.len());
        Ok(positions)
    }
}

#[cfg(test)]
mod tests {
    use canonical_error::CanonicalErrorCode;

    use super::*;

    const PI_MEN_OUTPUT: &str = "\
# TIC     |    RA      |   Dec      | EclipticLong | EclipticLat | Sector | Camera | Ccd | ColPix | RowPix | EdgeWarn
000000000 |  84.291188 | -80.469119 |  17.643418 | -80.394783 |  1 | 4 | 2 | 1543.112304 | 1006.230212 | 0
000000000 |  84.291188 | -80.469119 |  17.643418 | -80.394783 |  4 | 4 | 3 |  312.003817 | 1710.517344 | 0
000000000 |  84.291188 | -80.469119 |  17.643418 | -80.394783 | 13 | 4 | 1 |  101.500000 |   45.000000 | 1
";

    #[test]
    fn test_parse_output() {
        let positions = parse_stars2px_output(PI_MEN_OUTPUT, 261136679).unwrap();
        assert_eq!(positions.len(), 3);
        assert_eq!(positions[0], DetectorPosition {
            tic_id: 261136679,
            ra: 84.291188,
            dec: -80.469119,
            sector: 1,
            camera: 4,
            ccd: 2,
            col_pix: 1543.112304,
            row_pix: 1006.230212,
        });
        assert_eq!(positions[2].sector, 13);
        assert_eq!(positions[2].ccd, 1);
    }

    #[test]
    fn test_parse_not_on_detector() {
        let output = "No Target/s were found to be on detectors\n";
        assert!(parse_stars2px_output(output, 1).unwrap().is_empty());
        assert!(parse_stars2px_output("", 1).unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_rows() {
        let short = "0 | 1.0 | 2.0 | 3.0 | 4.0 | 1 | 1\n";
        let err = parse_stars2px_output(short, 1).unwrap_err();
        assert!(err.code == CanonicalErrorCode::DataLoss);

        let garbled = "0 | 1.0 | 2.0 | 3.0 | 4.0 | one | 1 | 1 | 5.0 | 6.0 | 0\n";
        let err = parse_stars2px_output(garbled, 1).unwrap_err();
        assert!(err.code == CanonicalErrorCode::DataLoss);
    }

    #[test]
    fn test_missing_interpreter() {
        let subprocess = TessPointSubprocess::new("/nonexistent/python-for-waldo");
        let err = subprocess.stars_to_pixels(1, 10.0, -20.0).unwrap_err();
        assert!(err.code == CanonicalErrorCode::FailedPrecondition);
    }
}
