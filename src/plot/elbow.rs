use plotters::prelude::*;
use std::path::Path;

use super::error::{PlotError, render_failed};
use crate::clusterer::ElbowCurve;

const SIZE: (u32, u32) = (1200, 700);

/// Line chart of inertia against cluster count, one tick per k
pub fn render_elbow(curve: &ElbowCurve, path: &Path) -> Result<(), PlotError> {
    let (min_k, max_k) = curve.k_range().ok_or(PlotError::EmptyInput("inertia curve"))?;
    let (min_k, max_k) = (min_k as i32, max_k as i32);

    let y_max = curve.inertias().into_iter().fold(0.0, f64::max) * 1.05;
    let y_max = if y_max > 0.0 { y_max } else { 1.0 };

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_failed)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d((min_k - 1)..(max_k + 1), 0.0..y_max)
        .map_err(render_failed)?;

    let tick = |k: &i32| {
        if (min_k..=max_k).contains(k) {
            k.to_string()
        } else {
            String::new()
        }
    };

    chart
        .configure_mesh()
        .x_labels((max_k - min_k + 3) as usize)
        .x_label_formatter(&tick)
        .x_desc("Number of clusters")
        .y_desc("Inertia")
        .axis_desc_style(("sans-serif", 18))
        .label_style(("sans-serif", 14))
        .draw()
        .map_err(render_failed)?;

    let color = RGBColor(31, 119, 180);
    chart
        .draw_series(LineSeries::new(
            curve.points.iter().map(|p| (p.k as i32, p.inertia)),
            color.stroke_width(2),
        ))
        .map_err(render_failed)?;
    chart
        .draw_series(
            curve
                .points
                .iter()
                .map(|p| Circle::new((p.k as i32, p.inertia), 5, color.filled())),
        )
        .map_err(render_failed)?;

    root.present().map_err(render_failed)?;
    Ok(())
}
