use plotters::prelude::*;
use std::path::Path;

use super::error::{PlotError, render_failed};
use super::palette::pastel1;
use crate::manifold::Embedding;

const SIZE: (u32, u32) = (2000, 1000);
const MARKER_RADIUS: i32 = 12;

/// Scatter of the 2-D embedding coloured by cluster label.
///
/// Every `annotate_every`-th sample also gets its label drawn next to it;
/// zero disables annotations.
pub fn render_embedding(
    embedding: &Embedding,
    labels: &[usize],
    annotate_every: usize,
    path: &Path,
) -> Result<(), PlotError> {
    if embedding.len() != labels.len() {
        return Err(PlotError::LengthMismatch {
            points: embedding.len(),
            labels: labels.len(),
        });
    }
    let (x0, x1, y0, y1) = embedding
        .bounds()
        .ok_or(PlotError::EmptyInput("embedding"))?;
    let pad_x = ((x1 - x0) * 0.05).max(1e-6);
    let pad_y = ((y1 - y0) * 0.05).max(1e-6);

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_failed)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d((x0 - pad_x)..(x1 + pad_x), (y0 - pad_y)..(y1 + pad_y))
        .map_err(render_failed)?;

    chart
        .configure_mesh()
        .x_desc("x0")
        .y_desc("x1")
        .axis_desc_style(("sans-serif", 18))
        .label_style(("sans-serif", 16))
        .draw()
        .map_err(render_failed)?;

    chart
        .draw_series(
            embedding
                .points
                .iter()
                .zip(labels.iter())
                .map(|(p, &label)| Circle::new((p[0], p[1]), MARKER_RADIUS, pastel1(label).filled())),
        )
        .map_err(render_failed)?;

    if annotate_every > 0 {
        chart
            .draw_series(
                embedding
                    .points
                    .iter()
                    .zip(labels.iter())
                    .step_by(annotate_every)
                    .map(|(p, label)| {
                        Text::new(label.to_string(), (p[0], p[1]), ("sans-serif", 18))
                    }),
            )
            .map_err(render_failed)?;
    }

    root.present().map_err(render_failed)?;
    Ok(())
}
