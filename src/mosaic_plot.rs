// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! Draws where a target lands on the CCD mosaic of each camera it falls on.
//!
//! `MosaicLayout` decides what goes where; `draw()` puts it on any plotters
//! drawing area, and `render_image()` draws into a bitmap of its own.

use std::fmt::Debug;
use std::path::Path;

use canonical_error::{CanonicalError, internal_error, invalid_argument_error};
use image::RgbImage;
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use waldo_elements::focal_plane::{Arrow, CCD_SIZE, MOSAIC_SIZE, NUM_CCDS,
                                  ReadoutArrows, readout_arrows};

use crate::availability::Availability;
use crate::target_locator::TargetLocation;

// Extra room above the top panel for the target name, and below the bottom
// panel for the x axis.
const TOP_HEADROOM: f64 = 256.0;
const BOTTOM_FOOTROOM: f64 = 128.0;

// Offset of a sector label from its marker.
const LABEL_OFFSET: f64 = 16.0;
// Inset of the "Camera N" label from the top right corner.
const CAMERA_LABEL_INSET: f64 = 64.0;

const ARROW_HEAD_WIDTH: f64 = 8.0;
const ARROW_HEAD_LENGTH: f64 = 1.5 * ARROW_HEAD_WIDTH;

#[derive(Clone, Debug)]
pub struct PlotSettings {
    // Width of the image and height of each panel, in pixels.
    pub panel_size: u32,

    // Camera whose readout arrows are drawn on every panel.
    pub arrow_camera: i32,
}

impl Default for PlotSettings {
    fn default() -> Self {
        PlotSettings {
            panel_size: 600,
            arrow_camera: 4,
        }
    }
}

pub fn marker_color(availability: Availability) -> RGBColor {
    match availability {
        Availability::Available => BLUE,
        Availability::Planned => MAGENTA,
        Availability::OutOfRange => RED,
    }
}

/// One observation, placed on its camera's mosaic.
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    pub sector: u32,
    pub availability: Availability,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    pub camera: u8,
    pub markers: Vec<Marker>,
    // Vertical extent in mosaic pixels. The horizontal extent is always
    // 0..MOSAIC_SIZE.
    pub y_min: f64,
    pub y_max: f64,
    // Only the bottom panel carries the x axis.
    pub show_x_axis: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MosaicLayout {
    pub target: String,
    // Top to bottom, ascending camera number.
    pub panels: Vec<Panel>,
    // One pair per CCD, drawn on every panel.
    pub arrows: Vec<ReadoutArrows>,
}

impl MosaicLayout {
    pub fn new(location: &TargetLocation, settings: &PlotSettings)
               -> Result<Self, CanonicalError> {
        let cameras = location.cameras();
        if cameras.is_empty() {
            return Err(invalid_argument_error("No observations to plot"));
        }
        let last = cameras.len() - 1;
        let panels = cameras.iter().enumerate().map(|(index, &camera)| {
            let markers = location.observations().iter()
                .filter(|obs| obs.camera == camera)
                .map(|obs| Marker {
                    x: obs.mosaic_x,
                    y: obs.mosaic_y,
                    sector: obs.sector,
                    availability: location.availability(obs.sector),
                })
                .collect();
            Panel {
                camera,
                markers,
                y_min: if index == last { -BOTTOM_FOOTROOM } else { 0.0 },
                y_max: if index == 0 { MOSAIC_SIZE + TOP_HEADROOM } else { MOSAIC_SIZE },
                show_x_axis: index == last,
            }
        }).collect();
        let arrows = (1..=NUM_CCDS)
            .map(|ccd| readout_arrows(settings.arrow_camera, ccd))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MosaicLayout {
            target: location.target().to_string(),
            panels,
            arrows,
        })
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.panels.iter().flat_map(|p| p.markers.iter())
    }
}

// Returns the triangle of an arrow's head, the tip lying beyond the end of
// the shaft.
fn arrow_head(arrow: &Arrow) -> Vec<(f64, f64)> {
    let length = (arrow.dx * arrow.dx + arrow.dy * arrow.dy).sqrt();
    let (ux, uy) = (arrow.dx / length, arrow.dy / length);
    let (end_x, end_y) = (arrow.x + arrow.dx, arrow.y + arrow.dy);
    let half_width = ARROW_HEAD_WIDTH / 2.0;
    vec![
        (end_x + ux * ARROW_HEAD_LENGTH, end_y + uy * ARROW_HEAD_LENGTH),
        (end_x - uy * half_width, end_y + ux * half_width),
        (end_x + uy * half_width, end_y - ux * half_width),
    ]
}

fn draw_error<E: Debug>(e: E) -> CanonicalError {
    internal_error(format!("Could not draw mosaic: {:?}", e).as_str())
}

fn draw_panel<DB: DrawingBackend>(layout: &MosaicLayout,
                                  panel: &Panel,
                                  is_top: bool,
                                  area: &DrawingArea<DB, Shift>)
                                  -> Result<(), CanonicalError> {
    let mut chart = ChartBuilder::on(area)
        .margin_top(0)
        .margin_bottom(0)
        .margin_left(10)
        .margin_right(20)
        .x_label_area_size(if panel.show_x_axis { 40 } else { 0 })
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..MOSAIC_SIZE, panel.y_min..panel.y_max)
        .map_err(draw_error)?;

    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh().y_desc("y position, px");
    if panel.show_x_axis {
        mesh.x_desc("x position, px");
    }
    mesh.draw().map_err(draw_error)?;

    // Camera outline and CCD boundaries.
    let frame = vec![(0.0, MOSAIC_SIZE), (MOSAIC_SIZE, MOSAIC_SIZE),
                     (MOSAIC_SIZE, 0.0), (0.0, 0.0), (0.0, MOSAIC_SIZE)];
    chart.draw_series(LineSeries::new(frame, BLACK.stroke_width(4)))
        .map_err(draw_error)?;
    chart.draw_series(LineSeries::new(vec![(CCD_SIZE, 0.0), (CCD_SIZE, MOSAIC_SIZE)],
                                      BLACK.stroke_width(3)))
        .map_err(draw_error)?;
    chart.draw_series(LineSeries::new(vec![(0.0, CCD_SIZE), (MOSAIC_SIZE, CCD_SIZE)],
                                      BLACK.stroke_width(3)))
        .map_err(draw_error)?;

    // Readout direction of each CCD.
    let arrows: Vec<&Arrow> = layout.arrows.iter()
        .flat_map(|a| [&a.column, &a.row])
        .collect();
    chart.draw_series(arrows.iter().map(|a| PathElement::new(
        vec![(a.x, a.y), (a.x + a.dx, a.y + a.dy)], BLACK)))
        .map_err(draw_error)?;
    chart.draw_series(arrows.iter().map(|a| Polygon::new(arrow_head(a), BLACK.filled())))
        .map_err(draw_error)?;

    // The target, once per sector.
    chart.draw_series(panel.markers.iter().map(|m| Circle::new(
        (m.x, m.y), 2, marker_color(m.availability).filled())))
        .map_err(draw_error)?;
    chart.draw_series(panel.markers.iter().map(|m| Text::new(
        format!("{}", m.sector),
        (m.x + LABEL_OFFSET, m.y - LABEL_OFFSET),
        ("sans-serif", 14).into_font().color(&marker_color(m.availability)))))
        .map_err(draw_error)?;

    chart.draw_series(std::iter::once(Text::new(
        format!("Camera {}", panel.camera),
        (MOSAIC_SIZE - CAMERA_LABEL_INSET, MOSAIC_SIZE - CAMERA_LABEL_INSET),
        ("sans-serif", 16).into_font().color(&BLACK)
            .pos(Pos::new(HPos::Right, VPos::Top)))))
        .map_err(draw_error)?;

    if is_top {
        chart.draw_series(std::iter::once(Text::new(
            layout.target.clone(),
            (CCD_SIZE, MOSAIC_SIZE + CAMERA_LABEL_INSET),
            ("sans-serif", 18).into_font().color(&BLUE)
                .pos(Pos::new(HPos::Center, VPos::Bottom)))))
            .map_err(draw_error)?;
    }
    Ok(())
}

/// Draws the layout onto `root`, which is split into one panel per camera,
/// stacked top to bottom without gaps.
pub fn draw<DB: DrawingBackend>(layout: &MosaicLayout, root: &DrawingArea<DB, Shift>)
                                -> Result<(), CanonicalError> {
    root.fill(&WHITE).map_err(draw_error)?;
    let areas = root.split_evenly((layout.panels.len(), 1));
    for (index, (panel, area)) in layout.panels.iter().zip(areas.iter()).enumerate() {
        draw_panel(layout, panel, index == 0, area)?;
    }
    Ok(())
}

/// Draws the layout into a new image `settings.panel_size` wide and
/// `settings.panel_size` high per panel.
pub fn render_image(layout: &MosaicLayout, settings: &PlotSettings)
                    -> Result<RgbImage, CanonicalError> {
    let width = settings.panel_size;
    // The whole RGB buffer must be addressable with u32 sizes.
    let size = u32::try_from(layout.panels.len()).ok()
        .and_then(|panels| width.checked_mul(panels))
        .and_then(|height| width.checked_mul(height)?.checked_mul(3).map(|len| (height, len)));
    let (height, len) = match size {
        Some(size) => size,
        None => {
            return Err(invalid_argument_error(
                format!("Panel size {} too large for {} panels",
                        width, layout.panels.len()).as_str()));
        }
    };
    if width == 0 || height == 0 {
        return Err(invalid_argument_error(
            format!("Cannot render a {}x{} image", width, height).as_str()));
    }
    let mut buffer = vec![0_u8; len as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height))
            .into_drawing_area();
        draw(layout, &root)?;
        root.present().map_err(draw_error)?;
    }
    RgbImage::from_raw(width, height, buffer).ok_or_else(
        || internal_error("Mosaic buffer does not match image size"))
}

pub fn save_png(image: &RgbImage, path: &Path) -> Result<(), CanonicalError> {
    image.save(path).map_err(|e| internal_error(
        format!("Could not write {:?}: {:?}", path, e).as_str()))?;
    info!("Wrote {}x{} mosaic to {:?}", image.width(), image.height(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use canonical_error::CanonicalErrorCode;

    use super::*;
    use crate::target_locator::tests::pi_men_location;

    #[test]
    fn test_layout_panels_and_colors() {
        let layout = MosaicLayout::new(&pi_men_location(), &PlotSettings::default()).unwrap();
        assert_eq!(layout.target, "Pi Men");
        assert_eq!(layout.panels.len(), 2);
        assert_eq!(layout.panels[0].camera, 3);
        assert_eq!(layout.panels[1].camera, 4);

        let available: Vec<u32> = layout.markers()
            .filter(|m| m.availability == Availability::Available)
            .map(|m| m.sector)
            .collect();
        let planned: Vec<u32> = layout.markers()
            .filter(|m| m.availability == Availability::Planned)
            .map(|m| m.sector)
            .collect();
        assert_eq!(available, vec![1]);
        assert_eq!(planned.len(), 2);
        assert_eq!(layout.markers().count(), 3);
        assert_eq!(marker_color(Availability::Available), BLUE);
        assert_eq!(marker_color(Availability::Planned), MAGENTA);
    }

    #[test]
    fn test_layout_positions() {
        let layout = MosaicLayout::new(&pi_men_location(), &PlotSettings::default()).unwrap();
        // Sector 8: camera 3, CCD 1 at (1900, 55.25) -> (col, 2S - row).
        let marker = &layout.panels[0].markers[0];
        assert_eq!(marker.sector, 8);
        assert_abs_diff_eq!(marker.x, 1900.0);
        assert_abs_diff_eq!(marker.y, 4096.0 - 55.25);
    }

    #[test]
    fn test_layout_extents() {
        let layout = MosaicLayout::new(&pi_men_location(), &PlotSettings::default()).unwrap();
        let top = &layout.panels[0];
        let bottom = &layout.panels[1];
        assert_eq!((top.y_min, top.y_max), (0.0, MOSAIC_SIZE + TOP_HEADROOM));
        assert_eq!((bottom.y_min, bottom.y_max), (-BOTTOM_FOOTROOM, MOSAIC_SIZE));
        assert!(!top.show_x_axis);
        assert!(bottom.show_x_axis);
    }

    #[test]
    fn test_layout_arrows_use_reference_camera() {
        let layout = MosaicLayout::new(&pi_men_location(), &PlotSettings::default()).unwrap();
        assert_eq!(layout.arrows.len(), 4);
        for (index, arrows) in layout.arrows.iter().enumerate() {
            assert_eq!(*arrows, readout_arrows(4, index as i32 + 1).unwrap());
        }

        let bad = PlotSettings{arrow_camera: 9, ..Default::default()};
        assert!(MosaicLayout::new(&pi_men_location(), &bad).is_err());
    }

    #[test]
    fn test_render_image() {
        let layout = MosaicLayout::new(&pi_men_location(), &PlotSettings::default()).unwrap();
        let image = render_image(&layout, &PlotSettings::default()).unwrap();
        assert_eq!((image.width(), image.height()), (600, 1200));

        let count = |rgb: [u8; 3]| image.pixels().filter(|p| p.0 == rgb).count();
        assert!(count([0, 0, 255]) > 0);
        assert!(count([255, 0, 255]) > 0);
        assert_eq!(count([255, 0, 0]), 0);
    }

    #[test]
    fn test_render_image_bad_size() {
        let layout = MosaicLayout::new(&pi_men_location(), &PlotSettings::default()).unwrap();
        let empty = PlotSettings{panel_size: 0, ..Default::default()};
        let err = render_image(&layout, &empty).unwrap_err();
        assert!(err.code == CanonicalErrorCode::InvalidArgument);

        let huge = PlotSettings{panel_size: 40000, ..Default::default()};
        let err = render_image(&layout, &huge).unwrap_err();
        assert!(err.code == CanonicalErrorCode::InvalidArgument);
    }

    #[test]
    fn test_arrow_head() {
        let head = arrow_head(&Arrow{x: 128.0, y: 3968.0, dx: 0.0, dy: -128.0});
        assert_eq!(head[0], (128.0, 3840.0 - ARROW_HEAD_LENGTH));
        assert_eq!(head[1], (132.0, 3840.0));
        assert_eq!(head[2], (124.0, 3840.0));
    }
}
