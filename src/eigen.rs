//! Eigenspace of the point cloud's covariance structure.

use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// Orthonormal eigenbasis of a point cloud's covariance matrix.
#[derive(Debug, Clone)]
pub struct Eigenbasis {
    /// Unit eigenvectors as columns, ordered by descending eigenvalue.
    pub vectors: DMatrix<f64>,
    /// Eigenvalues (variance along each eigenvector), descending, ≥ 0.
    pub values: DVector<f64>,
}

/// Compute the principal components of an N×n point cloud.
///
/// The cloud is centered on its own mean, the population covariance matrix
/// (divide by N) is eigendecomposed, and the eigenpairs are sorted by
/// descending eigenvalue. Symmetric-solver roundoff can yield tiny negative
/// eigenvalues for rank-deficient input; those are clamped to zero here and
/// rejected by the epsilon guard when the transform is composed.
#[must_use]
pub fn principal_components(cloud: &DMatrix<f64>) -> Eigenbasis {
    let n = cloud.ncols();
    #[allow(clippy::cast_precision_loss)]
    let pixels = cloud.nrows() as f64;

    let mean = cloud.row_mean();
    let mut centered = cloud.clone();
    for mut row in centered.row_iter_mut() {
        row -= &mean;
    }
    let covariance = centered.transpose() * &centered / pixels;

    let eigen = SymmetricEigen::new(covariance);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[b]
            .partial_cmp(&eigen.eigenvalues[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let values = DVector::from_iterator(n, order.iter().map(|&i| eigen.eigenvalues[i].max(0.0)));
    let columns: Vec<_> = order
        .iter()
        .map(|&i| eigen.eigenvectors.column(i).into_owned())
        .collect();
    let vectors = DMatrix::from_columns(&columns);

    Eigenbasis { vectors, values }
}
