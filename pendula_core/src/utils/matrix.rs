// pendula_core/src/utils/matrix.rs

//! Small dense-matrix helpers shared by the models and the filter.

use nalgebra::SMatrix;

use crate::error::{EstimationError, EstimationResult};

/// Returns `(A + Aᵀ) / 2`, removing the skew part floating-point drift leaves
/// behind in covariance products.
pub fn symmetrize<const D: usize>(m: &SMatrix<f64, D, D>) -> SMatrix<f64, D, D> {
    (m + m.transpose()) * 0.5
}

/// Induced 1-norm: the largest absolute column sum.
pub fn one_norm<const R: usize, const C: usize>(m: &SMatrix<f64, R, C>) -> f64 {
    m.column_iter()
        .map(|col| col.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

pub fn is_finite<const R: usize, const C: usize>(m: &SMatrix<f64, R, C>) -> bool {
    m.iter().all(|v| v.is_finite())
}

/// Fails with `NumericalDegeneracy` if any entry of `m` is NaN or infinite.
pub fn ensure_finite<const R: usize, const C: usize>(
    m: SMatrix<f64, R, C>,
    what: &str,
) -> EstimationResult<SMatrix<f64, R, C>> {
    if is_finite(&m) {
        Ok(m)
    } else {
        Err(EstimationError::NumericalDegeneracy(format!(
            "{what} contains non-finite values"
        )))
    }
}

/// Inverts `s`, refusing when the 1-norm condition number
/// `κ₁(S) = ‖S‖₁ · ‖S⁻¹‖₁` is non-finite or above `limit`.
pub fn invert_well_conditioned<const D: usize>(
    s: &SMatrix<f64, D, D>,
    limit: f64,
) -> EstimationResult<SMatrix<f64, D, D>> {
    let singular = |condition: f64| EstimationError::SingularInnovationCovariance {
        condition,
        limit,
    };

    if !is_finite(s) {
        return Err(singular(f64::INFINITY));
    }
    let inverse = s.try_inverse().ok_or_else(|| singular(f64::INFINITY))?;

    let condition = one_norm(s) * one_norm(&inverse);
    if !condition.is_finite() || condition > limit {
        return Err(singular(condition));
    }
    Ok(inverse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix2, Matrix3};

    #[test]
    fn test_symmetrize_removes_skew_part() {
        let m = Matrix2::new(1.0, 2.0, 4.0, 3.0);
        let s = symmetrize(&m);
        assert_eq!(s, Matrix2::new(1.0, 3.0, 3.0, 3.0));
        assert_eq!(s, s.transpose());
    }

    #[test]
    fn test_one_norm_is_max_column_sum() {
        let m = Matrix3::new(1.0, -7.0, 0.0, -2.0, 1.0, 0.5, 3.0, 0.0, -0.5);
        assert_eq!(one_norm(&m), 8.0);
    }

    #[test]
    fn test_invert_identity_has_unit_condition() {
        let inv = invert_well_conditioned(&Matrix2::identity(), 1e12).unwrap();
        assert_relative_eq!(inv, Matrix2::identity());
    }

    #[test]
    fn test_invert_rejects_exactly_singular() {
        let s = Matrix2::new(1.0, 2.0, 2.0, 4.0);
        assert!(matches!(
            invert_well_conditioned(&s, 1e12),
            Err(EstimationError::SingularInnovationCovariance { .. })
        ));
    }

    #[test]
    fn test_invert_rejects_ill_conditioned() {
        let s = Matrix2::new(1.0, 0.0, 0.0, 1e-9);
        match invert_well_conditioned(&s, 1e6) {
            Err(EstimationError::SingularInnovationCovariance { condition, limit }) => {
                assert_relative_eq!(condition, 1e9, max_relative = 1e-9);
                assert_eq!(limit, 1e6);
            }
            other => panic!("expected a singular-covariance error, got {other:?}"),
        }
        // The same matrix passes a looser limit.
        assert!(invert_well_conditioned(&s, 1e12).is_ok());
    }

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite(Matrix2::<f64>::identity(), "m").is_ok());
        let bad = Matrix2::new(1.0, f64::NAN, 0.0, 1.0);
        assert!(matches!(
            ensure_finite(bad, "m"),
            Err(EstimationError::NumericalDegeneracy(_))
        ));
    }
}
