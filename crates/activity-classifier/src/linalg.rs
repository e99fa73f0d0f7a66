//! Dense symmetric eigendecomposition

use ndarray::{s, Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MAX_SWEEPS: usize = 64;

/// Minimum extra vectors carried by subspace iteration; at least `k / 2` are
/// carried so the convergence ratio stays away from one
const MIN_OVERSAMPLING: usize = 10;
const MAX_SUBSPACE_ITERATIONS: usize = 200;
/// Relative change of the leading Ritz values that ends subspace iteration
const SUBSPACE_TOLERANCE: f64 = 1e-10;
const SUBSPACE_SEED: u64 = 0x5eed;

/// Eigendecomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// Returns eigenvalues in descending order and the matching unit
/// eigenvectors as columns.
pub fn symmetric_eigen(matrix: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = matrix.nrows();
    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);

    let scale: f64 = a.iter().map(|x| x * x).sum::<f64>().max(f64::MIN_POSITIVE);
    for _ in 0..MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| (0..n).filter(move |&q| q != p).map(move |q| (p, q)))
            .map(|(p, q)| a[[p, q]] * a[[p, q]])
            .sum();
        if off <= 1e-22 * scale {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq.abs() <= f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[[j, j]].total_cmp(&a[[i, i]]));

    let values = Array1::from_iter(order.iter().map(|&i| a[[i, i]]));
    let mut vectors = Array2::zeros((n, n));
    for (dst, &src) in order.iter().enumerate() {
        vectors.column_mut(dst).assign(&v.column(src));
    }
    (values, vectors)
}

/// The `k` largest eigenpairs of a symmetric positive semi-definite matrix.
///
/// Falls back to the full Jacobi solve when `k` is close to the matrix size;
/// otherwise runs orthogonal subspace iteration and a Rayleigh-Ritz solve on
/// the small projected matrix. Same output layout as [`symmetric_eigen`],
/// truncated to `k` columns.
pub fn leading_eigen(matrix: &Array2<f64>, k: usize) -> (Array1<f64>, Array2<f64>) {
    let m = matrix.nrows();
    let k = k.min(m);
    let block = (k + MIN_OVERSAMPLING.max(k / 2)).min(m);
    if 2 * block >= m {
        let (values, vectors) = symmetric_eigen(matrix);
        return (values.slice(s![..k]).to_owned(), vectors.slice(s![.., ..k]).to_owned());
    }

    let mut rng = StdRng::seed_from_u64(SUBSPACE_SEED);
    let mut basis = Array2::from_shape_fn((m, block), |_| rng.gen_range(-1.0..1.0));
    orthonormalize(&mut basis);

    let mut previous: Option<Array1<f64>> = None;
    for _ in 0..MAX_SUBSPACE_ITERATIONS {
        let image = matrix.dot(&basis);
        let (ritz, _) = symmetric_eigen(&symmetrize(basis.t().dot(&image)));
        let leading = ritz.slice(s![..k]).to_owned();

        basis = image;
        orthonormalize(&mut basis);

        let scale = leading.get(0).copied().unwrap_or(0.0).abs().max(f64::MIN_POSITIVE);
        let converged = previous.as_ref().is_some_and(|prev| {
            prev.iter()
                .zip(leading.iter())
                .all(|(a, b)| (a - b).abs() <= SUBSPACE_TOLERANCE * scale)
        });
        if converged {
            break;
        }
        previous = Some(leading);
    }

    let (values, rotation) = symmetric_eigen(&symmetrize(basis.t().dot(&matrix.dot(&basis))));
    let vectors = basis.dot(&rotation.slice(s![.., ..k]));
    (values.slice(s![..k]).to_owned(), vectors)
}

fn symmetrize(matrix: Array2<f64>) -> Array2<f64> {
    (&matrix + &matrix.t()) * 0.5
}

/// Modified Gram-Schmidt on the columns; dependent columns become zero
fn orthonormalize(basis: &mut Array2<f64>) {
    for j in 0..basis.ncols() {
        for i in 0..j {
            let projection = basis.column(i).dot(&basis.column(j));
            let previous = basis.column(i).to_owned();
            basis.column_mut(j).scaled_add(-projection, &previous);
        }
        let norm = basis.column(j).dot(&basis.column(j)).sqrt();
        if norm > 1e-10 {
            basis.column_mut(j).mapv_inplace(|x| x / norm);
        } else {
            basis.column_mut(j).fill(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_diagonal_matrix() {
        let m = array![[1.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 2.0]];
        let (values, vectors) = symmetric_eigen(&m);
        assert_eq!(values.to_vec(), vec![3.0, 2.0, 1.0]);
        assert_eq!(vectors[[1, 0]].abs(), 1.0);
    }

    #[test]
    fn test_reconstructs_matrix() {
        let m = array![[4.0, 1.0, -2.0], [1.0, 2.0, 0.5], [-2.0, 0.5, 3.0]];
        let (values, vectors) = symmetric_eigen(&m);

        for i in 0..3 {
            let v = vectors.column(i);
            let mv = m.dot(&v);
            for k in 0..3 {
                assert!((mv[k] - values[i] * v[k]).abs() < 1e-9);
            }
            assert!((v.dot(&v) - 1.0).abs() < 1e-9);
        }
        assert!(values[0] >= values[1] && values[1] >= values[2]);
        assert!((values.sum() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_leading_eigen_recovers_known_spectrum() {
        // Householder rotation of diag(40, 39, ..., 1)
        let n = 40;
        let u = Array1::from_shape_fn(n, |i| 1.0 + (i as f64 * 0.7).sin());
        let householder = Array2::<f64>::eye(n) - &(u.view().insert_axis(ndarray::Axis(1)).dot(&u.view().insert_axis(ndarray::Axis(0))) * (2.0 / u.dot(&u)));
        let diag = Array2::from_diag(&Array1::from_shape_fn(n, |i| (n - i) as f64));
        let a = householder.dot(&diag).dot(&householder);

        let (values, vectors) = leading_eigen(&a, 5);
        assert_eq!(vectors.dim(), (n, 5));
        for i in 0..5 {
            assert!((values[i] - (n - i) as f64).abs() < 1e-8);
            let alignment = vectors.column(i).dot(&householder.column(i)).abs();
            assert!((alignment - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_leading_eigen_small_matrix_uses_full_solve() {
        let m = array![[4.0, 1.0, -2.0], [1.0, 2.0, 0.5], [-2.0, 0.5, 3.0]];
        let (values, vectors) = leading_eigen(&m, 2);
        let (full_values, _) = symmetric_eigen(&m);
        assert_eq!(values.len(), 2);
        assert_eq!(vectors.dim(), (3, 2));
        assert_eq!(values[0], full_values[0]);
    }
}
