// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

pub mod availability;
pub mod mast_client;
pub mod mosaic_plot;
pub mod observation_table;
pub mod target_locator;
pub mod tess_point_subprocess;
