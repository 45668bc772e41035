// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use canonical_error::CanonicalError;

pub trait AvailabilityTrait {
    /// Returns the sector numbers, in ascending order, for which cutout
    /// imagery of `target` can be retrieved.
    fn available_sectors(&self, target: &str) -> Result<Vec<u32>, CanonicalError>;
}
