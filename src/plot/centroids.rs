use image::{GrayImage, Luma};
use std::path::Path;

use super::error::PlotError;

/// Pixels per centroid cell
const SCALE: u32 = 24;
/// White border between tiles
const GAP: u32 = 8;

/// Min-max scale one centroid to 0..=255 grey levels.
///
/// A flat centroid maps to black.
pub fn tile_intensities(centroid: &[f32]) -> Vec<u8> {
    let lo = centroid.iter().copied().fold(f32::INFINITY, f32::min);
    let hi = centroid.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = hi - lo;

    centroid
        .iter()
        .map(|&v| {
            if range > 0.0 {
                ((v - lo) / range * 255.0).round().clamp(0.0, 255.0) as u8
            } else {
                0
            }
        })
        .collect()
}

/// Strip of `side` x `side` grayscale tiles, one per centroid, left to right
pub fn centroid_strip(centroids: &[&[f32]], side: usize) -> Result<GrayImage, PlotError> {
    if centroids.is_empty() {
        return Err(PlotError::EmptyInput("centroid list"));
    }

    let side_u = side as u32;
    let k = centroids.len() as u32;
    let width = k * side_u * SCALE + (k + 1) * GAP;
    let height = side_u * SCALE + 2 * GAP;
    let mut img = GrayImage::from_pixel(width, height, Luma([255]));

    for (index, centroid) in centroids.iter().enumerate() {
        if centroid.len() != side * side {
            return Err(PlotError::CentroidShape {
                index,
                found: centroid.len(),
                expected: side * side,
            });
        }

        let left = GAP + index as u32 * (side_u * SCALE + GAP);
        for (cell, &level) in tile_intensities(centroid).iter().enumerate() {
            let row = (cell / side) as u32;
            let col = (cell % side) as u32;
            for dy in 0..SCALE {
                for dx in 0..SCALE {
                    img.put_pixel(
                        left + col * SCALE + dx,
                        GAP + row * SCALE + dy,
                        Luma([level]),
                    );
                }
            }
        }
    }

    Ok(img)
}

pub fn render_centroids(centroids: &[&[f32]], side: usize, path: &Path) -> Result<(), PlotError> {
    centroid_strip(centroids, side)?.save(path)?;
    Ok(())
}
