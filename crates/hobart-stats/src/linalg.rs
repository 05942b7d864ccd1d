//! Dense linear algebra for small regression problems
//!
//! Householder QR for least squares and Cholesky for the symmetric positive
//! definite systems that appear in the GRS statistic. Problem sizes here are a
//! few hundred rows by at most six columns, so straightforward loops over
//! `ndarray` storage are sufficient.

use ndarray::{Array1, Array2, ArrayView1};

/// Relative pivot tolerance below which a matrix is treated as singular.
pub const SINGULAR_TOLERANCE: f64 = 1e-10;

/// Householder QR factorization of a tall matrix (n ≥ p)
#[derive(Debug, Clone)]
pub struct QrDecomposition {
    /// Upper triangular factor (p x p)
    r: Array2<f64>,
    /// Householder vectors, `reflectors[k]` acts on rows k..n
    reflectors: Vec<Array1<f64>>,
    rows: usize,
}

impl QrDecomposition {
    /// Factor `a`. Returns `None` when `a` has more columns than rows.
    pub fn new(a: &Array2<f64>) -> Option<Self> {
        let (n, p) = a.dim();
        if n < p {
            return None;
        }

        let mut work = a.clone();
        let mut reflectors = Vec::with_capacity(p);

        for k in 0..p {
            let mut v: Array1<f64> = work.slice(ndarray::s![k.., k]).to_owned();
            let norm = v.dot(&v).sqrt();

            if norm == 0.0 {
                reflectors.push(Array1::zeros(n - k));
                continue;
            }

            let alpha = if v[0] > 0.0 { -norm } else { norm };
            v[0] -= alpha;
            let v_norm2 = v.dot(&v);

            if v_norm2 > 0.0 {
                for j in k..p {
                    let mut column = work.slice_mut(ndarray::s![k.., j]);
                    let scale = 2.0 * v.dot(&column) / v_norm2;
                    column.scaled_add(-scale, &v);
                }
            }

            work[[k, k]] = alpha;
            for i in k + 1..n {
                work[[i, k]] = 0.0;
            }
            reflectors.push(v);
        }

        let r = work.slice(ndarray::s![..p, ..]).to_owned();
        Some(Self {
            r,
            reflectors,
            rows: n,
        })
    }

    /// The upper triangular factor R.
    pub const fn r(&self) -> &Array2<f64> {
        &self.r
    }

    /// Whether every pivot of R exceeds the relative tolerance.
    pub fn is_full_rank(&self) -> bool {
        let diag: Vec<f64> = self.r.diag().iter().map(|d| d.abs()).collect();
        let max = diag.iter().copied().fold(0.0, f64::max);
        max > 0.0 && diag.iter().all(|&d| d > SINGULAR_TOLERANCE * max)
    }

    /// Compute Qᵀ·y.
    pub fn apply_qt(&self, y: ArrayView1<'_, f64>) -> Array1<f64> {
        assert_eq!(y.len(), self.rows, "vector length must match factored rows");
        let mut out = y.to_owned();
        for (k, v) in self.reflectors.iter().enumerate() {
            let v_norm2 = v.dot(v);
            if v_norm2 == 0.0 {
                continue;
            }
            let mut tail = out.slice_mut(ndarray::s![k..]);
            let scale = 2.0 * v.dot(&tail) / v_norm2;
            tail.scaled_add(-scale, v);
        }
        out
    }

    /// Least-squares solution of min ‖a·x − y‖. `None` if rank deficient.
    pub fn solve(&self, y: ArrayView1<'_, f64>) -> Option<Array1<f64>> {
        if !self.is_full_rank() {
            return None;
        }
        let p = self.r.ncols();
        let qty = self.apply_qt(y);
        Some(back_substitute(&self.r, qty.slice(ndarray::s![..p])))
    }

    /// (AᵀA)⁻¹ = R⁻¹R⁻ᵀ. `None` if rank deficient.
    pub fn gram_inverse(&self) -> Option<Array2<f64>> {
        if !self.is_full_rank() {
            return None;
        }
        let r_inv = upper_triangular_inverse(&self.r);
        Some(r_inv.dot(&r_inv.t()))
    }
}

/// Solve R·x = b for upper triangular R.
fn back_substitute(r: &Array2<f64>, b: ArrayView1<'_, f64>) -> Array1<f64> {
    let p = r.ncols();
    let mut x = Array1::<f64>::zeros(p);
    for i in (0..p).rev() {
        let mut sum = b[i];
        for j in i + 1..p {
            sum -= r[[i, j]] * x[j];
        }
        x[i] = sum / r[[i, i]];
    }
    x
}

fn upper_triangular_inverse(r: &Array2<f64>) -> Array2<f64> {
    let p = r.ncols();
    let mut inv = Array2::<f64>::zeros((p, p));
    for col in 0..p {
        let mut e = Array1::<f64>::zeros(p);
        e[col] = 1.0;
        let x = back_substitute(r, e.view());
        inv.column_mut(col).assign(&x);
    }
    inv
}

/// Cholesky factor L (lower triangular, A = L·Lᵀ) of a symmetric matrix.
///
/// Returns `None` when the matrix is not square or a pivot falls below the
/// relative tolerance, i.e. the matrix is not numerically positive definite.
pub fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n == 0 {
        return None;
    }

    let scale = a.diag().iter().copied().fold(0.0, f64::max);
    if !(scale > 0.0) {
        return None;
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut diag = a[[j, j]];
        for k in 0..j {
            diag -= l[[j, k]] * l[[j, k]];
        }
        if !(diag > SINGULAR_TOLERANCE * scale) {
            return None;
        }
        let pivot = diag.sqrt();
        l[[j, j]] = pivot;

        for i in j + 1..n {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = sum / pivot;
        }
    }
    Some(l)
}

/// Quadratic form xᵀA⁻¹x for symmetric positive definite A.
///
/// Returns `None` when A is not positive definite.
pub fn inverse_quadratic_form(a: &Array2<f64>, x: ArrayView1<'_, f64>) -> Option<f64> {
    let l = cholesky(a)?;
    let n = l.nrows();
    if x.len() != n {
        return None;
    }
    // Solve L·z = x; then xᵀA⁻¹x = zᵀz.
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = x[i];
        for k in 0..i {
            sum -= l[[i, k]] * z[k];
        }
        z[i] = sum / l[[i, i]];
    }
    Some(z.dot(&z))
}

/// Sample covariance of the columns of `data` (T x k) with divisor `divisor`.
pub fn covariance(data: &Array2<f64>, divisor: f64) -> Array2<f64> {
    let (t, k) = data.dim();
    let means: Vec<f64> = (0..k).map(|j| data.column(j).sum() / t as f64).collect();
    let mut cov = Array2::<f64>::zeros((k, k));
    for row in 0..t {
        for i in 0..k {
            let di = data[[row, i]] - means[i];
            for j in i..k {
                cov[[i, j]] += di * (data[[row, j]] - means[j]);
            }
        }
    }
    for i in 0..k {
        for j in i..k {
            cov[[i, j]] /= divisor;
            cov[[j, i]] = cov[[i, j]];
        }
    }
    cov
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_qr_reproduces_matrix() {
        let a = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0], [7.0, 9.0]];
        let qr = QrDecomposition::new(&a).unwrap();
        assert!(qr.is_full_rank());

        // RᵀR = AᵀA
        let rtr = qr.r().t().dot(qr.r());
        let ata = a.t().dot(&a);
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(rtr[[i, j]], ata[[i, j]], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_solve_exact_system() {
        // y = 1 + 2x
        let a = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let y = array![1.0, 3.0, 5.0, 7.0];
        let qr = QrDecomposition::new(&a).unwrap();
        let beta = qr.solve(y.view()).unwrap();
        assert_relative_eq!(beta[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(beta[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gram_inverse() {
        let a = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0]];
        let qr = QrDecomposition::new(&a).unwrap();
        let inv = qr.gram_inverse().unwrap();
        let identity = a.t().dot(&a).dot(&inv);
        assert_relative_eq!(identity[[0, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(identity[[0, 1]], 0.0, epsilon = 1e-12);
        assert_relative_eq!(identity[[1, 1]], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_collinear_columns_are_rank_deficient() {
        let a = array![[1.0, 2.0], [1.0, 2.0], [1.0, 2.0]];
        let qr = QrDecomposition::new(&a).unwrap();
        assert!(!qr.is_full_rank());
        assert!(qr.solve(array![1.0, 2.0, 3.0].view()).is_none());
        assert!(qr.gram_inverse().is_none());
    }

    #[test]
    fn test_wide_matrix_rejected() {
        let a = array![[1.0, 2.0, 3.0]];
        assert!(QrDecomposition::new(&a).is_none());
    }

    #[test]
    fn test_cholesky_and_quadratic_form() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let l = cholesky(&a).unwrap();
        let back = l.dot(&l.t());
        assert_relative_eq!(back[[0, 1]], 2.0, epsilon = 1e-12);

        // A⁻¹ = 1/8 [[3, -2], [-2, 4]]; x = (1, 1) -> (3 - 4 + 4) / 8
        let q = inverse_quadratic_form(&a, array![1.0, 1.0].view()).unwrap();
        assert_relative_eq!(q, 3.0 / 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cholesky_rejects_singular() {
        let a = array![[1.0, 1.0], [1.0, 1.0]];
        assert!(cholesky(&a).is_none());
        let zero = Array2::<f64>::zeros((2, 2));
        assert!(cholesky(&zero).is_none());
    }

    #[test]
    fn test_covariance() {
        let data = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        let cov = covariance(&data, 2.0);
        assert_relative_eq!(cov[[0, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(cov[[0, 1]], 2.0, epsilon = 1e-12);
        assert_relative_eq!(cov[[1, 1]], 4.0, epsilon = 1e-12);
    }
}
