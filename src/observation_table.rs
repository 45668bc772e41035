// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use canonical_error::{CanonicalError, internal_error};
use serde::Serialize;

use crate::target_locator::TargetLocation;

/// One row per observation, with the column names used by tess-point.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObservationRow {
    #[serde(rename = "TIC")]
    pub tic: u64,
    #[serde(rename = "RA")]
    pub ra: f64,
    pub dec: f64,
    pub sector: u32,
    pub camera: u8,
    pub ccd: u8,
    pub col_pix: f64,
    pub row_pix: f64,
}

pub fn to_table(location: &TargetLocation) -> Vec<ObservationRow> {
    location.observations().iter().map(|obs| ObservationRow {
        tic: obs.tic_id,
        ra: obs.ra,
        dec: obs.dec,
        sector: obs.sector,
        camera: obs.camera,
        ccd: obs.ccd,
        col_pix: obs.col_pix,
        row_pix: obs.row_pix,
    }).collect()
}

pub fn to_json(location: &TargetLocation) -> Result<String, CanonicalError> {
    serde_json::to_string_pretty(&to_table(location)).map_err(|e| internal_error(
        format!("Could not encode observation table: {:?}", e).as_str()))
}
