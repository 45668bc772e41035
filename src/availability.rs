// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::collections::BTreeSet;
use std::fmt;

/// Whether cutout imagery exists for a sector of a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Availability {
    // Cutouts can be retrieved now.
    Available,
    // The target is (or will be) observed in the sector, but no cutouts are
    // served yet.
    Planned,
    // The target is not observed in the sector.
    OutOfRange,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Availability::Available => "available",
            Availability::Planned => "planned",
            Availability::OutOfRange => "out of range",
        };
        write!(f, "{}", label)
    }
}

pub fn classify(sector: u32,
                available_sectors: &BTreeSet<u32>,
                observed_sectors: &BTreeSet<u32>) -> Availability {
    if available_sectors.contains(&sector) {
        Availability::Available
    } else if observed_sectors.contains(&sector) {
        Availability::Planned
    } else {
        Availability::OutOfRange
    }
}
