// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::collections::BTreeSet;

use canonical_error::{CanonicalError, not_found_error, out_of_range_error};
use log::{debug, info, warn};

use waldo_elements::astrometry_trait::{AstrometryTrait, DetectorPosition};
use waldo_elements::availability_trait::AvailabilityTrait;
use waldo_elements::catalog_trait::{CatalogRecord, CatalogTrait};
use waldo_elements::focal_plane::to_mosaic;

use crate::availability::{Availability, classify};

#[derive(Clone, Debug)]
pub struct LocatorSettings {
    // Sectors beyond this are not supported (the mosaic orientation used for
    // drawing is only valid for the southern-hemisphere pointings).
    pub max_sector: u32,

    // A resolved catalog entry farther than this from the requested target
    // yields a warning.
    pub max_match_distance_arcsec: f64,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        LocatorSettings {
            max_sector: 13,
            max_match_distance_arcsec: 0.2,
        }
    }
}

/// The target's position on one CCD during one sector.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub tic_id: u64,
    pub ra: f64,
    pub dec: f64,
    pub sector: u32,
    // 1..=4.
    pub camera: u8,
    // 1..=4.
    pub ccd: u8,
    pub col_pix: f64,
    pub row_pix: f64,

    // Position on the camera's 2x2 CCD mosaic.
    pub mosaic_x: f64,
    pub mosaic_y: f64,
}

impl Observation {
    // Fails with InvalidArgument if the camera or CCD index is not 1..=4.
    fn from_detector_position(pos: &DetectorPosition) -> Result<Self, CanonicalError> {
        let (mosaic_x, mosaic_y) = to_mosaic(pos.camera, pos.ccd, pos.col_pix, pos.row_pix)?;
        Ok(Observation {
            tic_id: pos.tic_id,
            ra: pos.ra,
            dec: pos.dec,
            sector: pos.sector,
            camera: pos.camera as u8,
            ccd: pos.ccd as u8,
            col_pix: pos.col_pix,
            row_pix: pos.row_pix,
            mosaic_x,
            mosaic_y,
        })
    }
}

/// Everything known about where a target lands on the cameras. Built once by
/// `locate()` and read-only thereafter.
#[derive(Clone, Debug)]
pub struct TargetLocation {
    target: String,
    catalog_record: CatalogRecord,
    observations: Vec<Observation>,
    observed_sectors: BTreeSet<u32>,
    available_sectors: BTreeSet<u32>,
}

impl TargetLocation {
    /// Resolves `target` in the catalog, finds its pixel positions for every
    /// sector it falls in, and determines which sectors have cutouts.
    /// Errors:
    ///   OutOfRange: a sector beyond `settings.max_sector` has cutouts.
    ///   InvalidArgument: the astrometry returned a camera or CCD index
    ///     outside 1..=4.
    ///   NotFound: the target falls on no detector.
    /// Errors from the collaborators are passed through unchanged.
    pub fn locate(target: &str,
                  catalog: &dyn CatalogTrait,
                  astrometry: &dyn AstrometryTrait,
                  availability: &dyn AvailabilityTrait,
                  settings: &LocatorSettings) -> Result<Self, CanonicalError> {
        let catalog_record = catalog.query_object(target)?;
        info!("Resolved {} to TIC {} at ra {:.6} dec {:.6}",
              target, catalog_record.tic_id, catalog_record.ra, catalog_record.dec);

        let positions = astrometry.stars_to_pixels(
            catalog_record.tic_id, catalog_record.ra, catalog_record.dec)?;

        if catalog_record.distance_arcsec > settings.max_match_distance_arcsec {
            warn!("Returned target is far ({} arcsec) from the requested one",
                  catalog_record.distance_arcsec);
        }

        let available_sectors: BTreeSet<u32> =
            availability.available_sectors(target)?.into_iter().collect();
        if let Some(max_available) = available_sectors.last() {
            if *max_available > settings.max_sector {
                return Err(out_of_range_error(
                    format!("Sector {} is not in the southern hemisphere (max {})",
                            max_available, settings.max_sector).as_str()));
            }
        }

        let observations = positions.iter()
            .map(Observation::from_detector_position)
            .collect::<Result<Vec<_>, _>>()?;
        if observations.is_empty() {
            return Err(not_found_error(
                format!("{} does not fall on any camera", target).as_str()));
        }
        for obs in &observations {
            debug!("Sector {} camera {} ccd {} at col {:.2} row {:.2}",
                   obs.sector, obs.camera, obs.ccd, obs.col_pix, obs.row_pix);
        }
        let observed_sectors = observations.iter().map(|o| o.sector).collect();

        Ok(TargetLocation {
            target: target.to_string(),
            catalog_record,
            observations,
            observed_sectors,
            available_sectors,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn catalog_record(&self) -> &CatalogRecord {
        &self.catalog_record
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn observed_sectors(&self) -> &BTreeSet<u32> {
        &self.observed_sectors
    }

    pub fn available_sectors(&self) -> &BTreeSet<u32> {
        &self.available_sectors
    }

    /// The distinct cameras the target falls on, ascending.
    pub fn cameras(&self) -> Vec<u8> {
        let cameras: BTreeSet<u8> = self.observations.iter().map(|o| o.camera).collect();
        cameras.into_iter().collect()
    }

    pub fn availability(&self, sector: u32) -> Availability {
        classify(sector, &self.available_sectors, &self.observed_sectors)
    }
}
