//! Principal component reduction

use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use tracing::debug;

use crate::linalg::leading_eigen;
use crate::ClassifierError;

/// Eigenvalues below this fraction of the largest are treated as zero
const RANK_TOLERANCE: f64 = 1e-12;

/// Linear projection onto the leading principal components
#[derive(Debug, Clone)]
pub struct Pca {
    mean: Array1<f64>,
    /// `[component, dimension]`, unit rows
    components: Array2<f64>,
    /// Variance of the training data along each component (n - 1 denominator)
    explained_variance: Array1<f64>,
    whiten: bool,
}

impl Pca {
    /// Fit on `data` (`[sample, dimension]`).
    ///
    /// `n_components` is capped at `min(samples, dimensions)`. The
    /// eigenproblem is solved on whichever of the covariance or Gram matrix is
    /// smaller, and only its leading `n_components` eigenpairs are computed.
    pub fn fit(data: ArrayView2<f64>, n_components: usize, whiten: bool) -> Result<Self, ClassifierError> {
        let (n, d) = data.dim();
        let mean = data.mean_axis(Axis(0)).ok_or(ClassifierError::EmptyData("fit PCA"))?;
        if d == 0 {
            return Err(ClassifierError::EmptyData("fit PCA"));
        }
        let centered = &data - &mean;
        let k = n_components.min(n).min(d);
        let dof = n.saturating_sub(1).max(1) as f64;

        let (eigenvalues, components) = if d <= n {
            let covariance = centered.t().dot(&centered);
            let (values, vectors) = leading_eigen(&covariance, k);
            (values, vectors.t().to_owned())
        } else {
            let gram = centered.dot(&centered.t());
            let (values, vectors) = leading_eigen(&gram, k);
            let largest = values.get(0).copied().unwrap_or(0.0).max(0.0);
            let mut components = Array2::zeros((k, d));
            for i in 0..k {
                let value = values[i];
                if value > RANK_TOLERANCE * largest && value > 0.0 {
                    let axis = centered.t().dot(&vectors.column(i)) / value.sqrt();
                    components.row_mut(i).assign(&axis);
                }
            }
            (values, components)
        };

        let explained_variance = eigenvalues.mapv(|v| v.max(0.0) / dof);
        debug!(
            "PCA fitted: {} samples, {} -> {} dimensions, leading variance {:?}",
            n,
            d,
            k,
            explained_variance.get(0)
        );

        Ok(Self {
            mean,
            components,
            explained_variance,
            whiten,
        })
    }

    /// Project `data` onto the fitted components
    pub fn transform(&self, data: ArrayView2<f64>) -> Result<Array2<f64>, ClassifierError> {
        if data.ncols() != self.mean.len() {
            return Err(ClassifierError::InvalidInputShape {
                expected: format!("{} columns", self.mean.len()),
                actual: format!("{} columns", data.ncols()),
            });
        }
        let mut projected = (&data - &self.mean).dot(&self.components.t());
        if self.whiten {
            let largest = self.explained_variance.get(0).copied().unwrap_or(0.0);
            for (mut column, &variance) in projected.columns_mut().into_iter().zip(self.explained_variance.iter()) {
                if variance > RANK_TOLERANCE * largest && variance > 0.0 {
                    column /= variance.sqrt();
                } else {
                    column.fill(0.0);
                }
            }
        }
        Ok(projected)
    }

    /// Number of output components
    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    pub fn explained_variance(&self) -> &Array1<f64> {
        &self.explained_variance
    }
}

/// Independent PCA per channel of an interleaved feature row.
///
/// Input column `i * channels + c` belongs to channel `c`; output column
/// `component * channels + c` likewise.
#[derive(Debug, Clone)]
pub struct ChannelReducer {
    channels: usize,
    reducers: Vec<Pca>,
}

impl ChannelReducer {
    pub fn fit(
        features: ArrayView2<f64>,
        channels: usize,
        n_components: usize,
        whiten: bool,
    ) -> Result<Self, ClassifierError> {
        check_channels(features.ncols(), channels)?;
        let reducers = (0..channels)
            .map(|c| Pca::fit(features.slice(s![.., c..;channels]), n_components, whiten))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { channels, reducers })
    }

    pub fn transform(&self, features: ArrayView2<f64>) -> Result<Array2<f64>, ClassifierError> {
        check_channels(features.ncols(), self.channels)?;
        let components = self.output_components();
        let mut reduced = Array2::zeros((features.nrows(), components * self.channels));
        for (c, pca) in self.reducers.iter().enumerate() {
            let projected = pca.transform(features.slice(s![.., c..;self.channels]))?;
            reduced.slice_mut(s![.., c..;self.channels]).assign(&projected);
        }
        Ok(reduced)
    }

    /// Components kept per channel
    pub fn output_components(&self) -> usize {
        self.reducers.first().map(Pca::n_components).unwrap_or(0)
    }

    /// Width of a reduced row
    pub fn output_width(&self) -> usize {
        self.output_components() * self.channels
    }
}

fn check_channels(width: usize, channels: usize) -> Result<(), ClassifierError> {
    if channels == 0 || width % channels != 0 {
        return Err(ClassifierError::InvalidInputShape {
            expected: format!("a multiple of {} columns", channels),
            actual: format!("{} columns", width),
        });
    }
    Ok(())
}
