//! Tail probabilities for test statistics.

use crate::error::StatsError;
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

/// Two-sided p-value of a t statistic with `df` degrees of freedom.
pub fn student_t_two_sided(t: f64, df: f64) -> Result<f64, StatsError> {
    if t.is_nan() {
        return Ok(f64::NAN);
    }
    if t.is_infinite() {
        return Ok(0.0);
    }
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| StatsError::Distribution(format!("Student-t with {df} df: {e}")))?;
    Ok((2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
}

/// Upper-tail probability of an F statistic with (`d1`, `d2`) degrees of freedom.
pub fn f_survival(f: f64, d1: f64, d2: f64) -> Result<f64, StatsError> {
    if f.is_nan() {
        return Ok(f64::NAN);
    }
    if f == f64::INFINITY {
        return Ok(0.0);
    }
    let dist = FisherSnedecor::new(d1, d2)
        .map_err(|e| StatsError::Distribution(format!("F({d1}, {d2}): {e}")))?;
    Ok(dist.sf(f.max(0.0)).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_t_p_values() {
        assert_relative_eq!(student_t_two_sided(0.0, 10.0).unwrap(), 1.0, epsilon = 1e-12);
        // t_{0.975, 30} = 2.0423
        assert_relative_eq!(student_t_two_sided(2.0423, 30.0).unwrap(), 0.05, epsilon = 1e-3);
        assert_relative_eq!(
            student_t_two_sided(-2.0423, 30.0).unwrap(),
            student_t_two_sided(2.0423, 30.0).unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_f_survival() {
        // F_{0.95}(3, 60) = 2.758
        assert_relative_eq!(f_survival(2.758, 3.0, 60.0).unwrap(), 0.05, epsilon = 1e-3);
        assert_relative_eq!(f_survival(0.0, 3.0, 60.0).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_degrees_of_freedom() {
        assert!(student_t_two_sided(1.0, 0.0).is_err());
        assert!(f_survival(1.0, 0.0, 10.0).is_err());
    }
}
