use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Nothing to plot: {0} is empty")]
    EmptyInput(&'static str),

    #[error("Got {points} points but {labels} labels")]
    LengthMismatch { points: usize, labels: usize },

    #[error("Centroid {index} has {found} values, expected {expected}")]
    CentroidShape {
        index: usize,
        found: usize,
        expected: usize,
    },

    #[error("Failed to render chart: {0}")]
    Render(String),

    #[error("Failed to encode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Flatten a drawing backend error into `PlotError::Render`
pub(crate) fn render_failed<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Render(e.to_string())
}
