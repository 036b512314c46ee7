//! Output artifacts: the elbow chart, the centroid image strip and the
//! embedding scatter plot.

mod centroids;
mod elbow;
mod error;
mod palette;
mod scatter;


pub use centroids::{centroid_strip, render_centroids, tile_intensities};
pub use elbow::render_elbow;
pub use error::PlotError;
pub use palette::{PASTEL1, pastel1};
pub use scatter::render_embedding;
