// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

pub mod astro_util;
pub mod astrometry_trait;
pub mod availability_trait;
pub mod catalog_trait;
pub mod focal_plane;
