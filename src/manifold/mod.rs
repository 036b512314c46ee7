mod affinity;
mod error;
mod pca;
mod tsne;


pub use affinity::{conditional_probabilities, joint_probabilities, squared_distances};
pub use error::TsneError;
pub use pca::pca_project;
pub use tsne::{Embedding, TsneInit, TsneParams, tsne};

pub(crate) fn check_data(data: &[Vec<f32>]) -> Result<usize, TsneError> {
    let Some(first) = data.first() else {
        return Err(TsneError::EmptyData);
    };
    let dim = first.len();
    for (row, x) in data.iter().enumerate() {
        if x.len() != dim {
            return Err(TsneError::RaggedRows {
                row,
                found: x.len(),
                expected: dim,
            });
        }
    }
    Ok(dim)
}
