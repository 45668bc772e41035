// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! Catalog and cutout-availability lookups against the MAST web services.

use std::time::Duration;

use canonical_error::{CanonicalError, data_loss_error, internal_error,
                      not_found_error, unavailable_error};
use log::{debug, info};
use serde::Deserialize;
use serde_json::{json, Value};

use waldo_elements::astro_util::separation_arcsec;
use waldo_elements::availability_trait::AvailabilityTrait;
use waldo_elements::catalog_trait::{CatalogRecord, CatalogTrait};

pub const DEFAULT_MAST_URL: &str = "https://mast.stsci.edu";

// Cone radius (degrees) searched around a resolved name.
const TIC_SEARCH_RADIUS: f64 = 0.2;
const TIC_PAGE_SIZE: u32 = 2000;

#[derive(Deserialize)]
struct NameLookupResponse {
    #[serde(rename = "resolvedCoordinate", default)]
    resolved_coordinate: Vec<ResolvedCoordinate>,
}

#[derive(Deserialize)]
struct ResolvedCoordinate {
    ra: f64,
    decl: f64,
    #[serde(rename = "canonicalName", default)]
    canonical_name: Option<String>,
}

#[derive(Deserialize)]
struct TicConeResponse {
    #[serde(default)]
    data: Vec<TicRow>,
}

#[derive(Deserialize)]
#[allow(non_snake_case)]
struct TicRow {
    // MAST sends the identifier as a string; accept a number too.
    ID: Value,
    ra: Option<f64>,
    dec: Option<f64>,
    dstArcSec: Option<f64>,
}

#[derive(Deserialize)]
struct SectorResponse {
    #[serde(default)]
    results: Vec<SectorEntry>,
}

#[derive(Deserialize)]
struct SectorEntry {
    // Zero-padded string such as "0013".
    sector: Value,
}

fn parse_json<'a, T: Deserialize<'a>>(body: &'a str, what: &str) -> Result<T, CanonicalError> {
    serde_json::from_str(body).map_err(|e| data_loss_error(
        format!("Could not parse {} response: {:?}", what, e).as_str()))
}

// Accepts 261136679, "261136679" or " 0013 ".
fn parse_integer(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Returns (ra, dec) in degrees of the first resolution of a name lookup.
pub fn parse_name_lookup(body: &str, target: &str) -> Result<(f64, f64), CanonicalError> {
    let response: NameLookupResponse = parse_json(body, "name lookup")?;
    match response.resolved_coordinate.first() {
        Some(coord) => {
            debug!("{} resolved as {:?}", target, coord.canonical_name);
            Ok((coord.ra, coord.decl))
        },
        None => Err(not_found_error(
            format!("Could not resolve {} to a sky position", target).as_str())),
    }
}

/// Returns the catalog row nearest the resolved position (`ra`, `dec`). When
/// the service did not compute distances they are computed here.
pub fn parse_tic_cone(body: &str, ra: f64, dec: f64) -> Result<CatalogRecord, CanonicalError> {
    let response: TicConeResponse = parse_json(body, "TIC cone search")?;
    let mut best: Option<CatalogRecord> = None;
    for row in &response.data {
        let (Some(row_ra), Some(row_dec)) = (row.ra, row.dec) else {
            continue;
        };
        let Some(tic_id) = parse_integer(&row.ID) else {
            return Err(data_loss_error(
                format!("Bad TIC identifier {}", row.ID).as_str()));
        };
        let distance_arcsec = row.dstArcSec.unwrap_or_else(
            || separation_arcsec(ra, dec, row_ra, row_dec));
        if best.as_ref().map_or(true, |b| distance_arcsec < b.distance_arcsec) {
            best = Some(CatalogRecord{tic_id, ra: row_ra, dec: row_dec, distance_arcsec});
        }
    }
    best.ok_or_else(|| not_found_error(
        format!("No TIC entry within {} degrees of ra {} dec {}",
                TIC_SEARCH_RADIUS, ra, dec).as_str()))
}

/// Returns the sector numbers listed in a TESScut sector response, ascending
/// and without duplicates (a target near a CCD edge is listed once per CCD).
pub fn parse_sectors(body: &str) -> Result<Vec<u32>, CanonicalError> {
    let response: SectorResponse = parse_json(body, "TESScut sector")?;
    let mut sectors = Vec::with_capacity(response.results.len());
    for entry in &response.results {
        match parse_integer(&entry.sector).and_then(|s| u32::try_from(s).ok()) {
            Some(sector) => sectors.push(sector),
            None => {
                return Err(data_loss_error(
                    format!("Bad sector value {}", entry.sector).as_str()));
            }
        }
    }
    sectors.sort_unstable();
    sectors.dedup();
    Ok(sectors)
}

/// Blocking client for the MAST name resolver, the TIC catalog and the TESScut
/// sector listing.
pub struct MastClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl MastClient {
    // `base_url` Normally DEFAULT_MAST_URL.
    // `timeout` Per-request timeout; None waits indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, CanonicalError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("tess-waldo/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| internal_error(
                format!("Could not create HTTP client: {:?}", e).as_str()))?;
        Ok(MastClient{client, base_url: base_url.trim_end_matches('/').to_string()})
    }

    fn read_body(response: reqwest::Result<reqwest::blocking::Response>, what: &str)
                 -> Result<String, CanonicalError> {
        let response = response.map_err(|e| unavailable_error(
            format!("{} request failed: {:?}", what, e).as_str()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(unavailable_error(
                format!("{} request failed: {}", what, status).as_str()));
        }
        response.text().map_err(|e| unavailable_error(
            format!("Could not read {} response: {:?}", what, e).as_str()))
    }

    // Calls a service of the MAST portal API.
    fn invoke(&self, request: &Value, what: &str) -> Result<String, CanonicalError> {
        let url = format!("{}/api/v0/invoke", self.base_url);
        let response = self.client.post(&url)
            .form(&[("request", request.to_string())])
            .send();
        Self::read_body(response, what)
    }

    /// Returns (ra, dec) in degrees for a target name.
    pub fn resolve_name(&self, target: &str) -> Result<(f64, f64), CanonicalError> {
        let request = json!({
            "service": "Mast.Name.Lookup",
            "params": {"input": target, "format": "json"},
            "format": "json",
        });
        let body = self.invoke(&request, "name lookup")?;
        parse_name_lookup(&body, target)
    }

    fn query_tic_cone(&self, ra: f64, dec: f64) -> Result<CatalogRecord, CanonicalError> {
        let request = json!({
            "service": "Mast.Catalogs.Tic.Cone",
            "params": {"ra": ra, "dec": dec, "radius": TIC_SEARCH_RADIUS},
            "format": "json",
            "pagesize": TIC_PAGE_SIZE,
            "page": 1,
        });
        let body = self.invoke(&request, "TIC cone search")?;
        parse_tic_cone(&body, ra, dec)
    }

    fn query_sectors(&self, ra: f64, dec: f64) -> Result<Vec<u32>, CanonicalError> {
        let url = format!("{}/tesscut/api/v0.1/sector", self.base_url);
        let response = self.client.get(&url)
            .query(&[("ra", ra.to_string()), ("dec", dec.to_string())])
            .send();
        let body = Self::read_body(response, "TESScut sector")?;
        parse_sectors(&body)
    }
}

impl CatalogTrait for MastClient {
    fn query_object(&self, target: &str) -> Result<CatalogRecord, CanonicalError> {
        let (ra, dec) = self.resolve_name(target)?;
        let record = self.query_tic_cone(ra, dec)?;
        info!("TIC {} is {:.3} arcsec from {}", record.tic_id, record.distance_arcsec, target);
        Ok(record)
    }
}

impl AvailabilityTrait for MastClient {
    fn available_sectors(&self, target: &str) -> Result<Vec<u32>, CanonicalError> {
        let (ra, dec) = self.resolve_name(target)?;
        let sectors = self.query_sectors(ra, dec)?;
        info!("Cutouts of {} available for sectors {:?}", target, sectors);
        Ok(sectors)
    }
}
