// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use canonical_error::CanonicalError;

/// The catalog entry that best matches a target name.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogRecord {
    // TESS Input Catalog identifier.
    pub tic_id: u64,

    // Degrees.
    pub ra: f64,
    pub dec: f64,

    // Angular distance, in arcseconds, between the position the target name
    // resolved to and this catalog entry.
    pub distance_arcsec: f64,
}

pub trait CatalogTrait {
    /// Resolves `target` (a star name, or a "TIC nnnn" designation) and
    /// returns the nearest catalog entry.
    /// Errors:
    ///   NotFound: the name could not be resolved, or no catalog entry lies
    ///     near the resolved position.
    ///   Unavailable: the catalog service could not be reached.
    fn query_object(&self, target: &str) -> Result<CatalogRecord, CanonicalError>;
}
