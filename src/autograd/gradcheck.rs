//! Gradient checking utilities for validating automatic differentiation

use crate::error::TensorResult;
use crate::tensor::{FloatType, Tensor};

/// Gradient checking configuration
#[derive(Debug, Clone)]
pub struct GradCheckConfig {
    /// Epsilon for finite differences
    pub epsilon: f32,

    /// Relative error tolerance
    pub relative_tolerance: f32,

    /// Absolute error tolerance
    pub absolute_tolerance: f32,

    /// Use central difference (vs forward difference)
    pub use_central_difference: bool,
}

impl Default for GradCheckConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-3,
            relative_tolerance: 1e-3,
            absolute_tolerance: 1e-4,
            use_central_difference: true,
        }
    }
}

/// Gradient checking result for a single tensor
#[derive(Debug, Clone)]
pub struct GradCheckResult {
    /// Tensor name/identifier
    pub name: String,

    /// Maximum relative error
    pub max_relative_error: f32,

    /// Maximum absolute error
    pub max_absolute_error: f32,

    /// Number of elements checked
    pub num_elements: usize,

    /// Number of elements that passed
    pub num_passed: usize,

    /// Whether all gradients passed tolerance
    pub passed: bool,
}

/// Gradient checker comparing analytical gradients against finite
/// differences
pub struct GradientChecker {
    config: GradCheckConfig,
}

impl GradientChecker {
    /// Create a new gradient checker with default configuration
    pub fn new() -> Self {
        Self {
            config: GradCheckConfig::default(),
        }
    }

    /// Create a gradient checker with custom configuration
    pub fn with_config(config: GradCheckConfig) -> Self {
        Self { config }
    }

    /// Compute the numerical gradient of a scalar-valued function using
    /// finite differences. Non-scalar outputs are summed first.
    pub fn compute_numerical_gradient<T, F>(
        &self,
        f: F,
        input: &Tensor<T>,
    ) -> TensorResult<Tensor<T>>
    where
        T: FloatType,
        F: Fn(&Tensor<T>) -> TensorResult<Tensor<T>>,
    {
        let num_elements = input.numel();
        let mut numerical_grad = vec![T::zero(); num_elements];

        for (i, slot) in numerical_grad.iter_mut().enumerate() {
            let grad = if self.config.use_central_difference {
                // [f(x+ε) - f(x-ε)] / 2ε
                self.central_difference(&f, input, i)?
            } else {
                // [f(x+ε) - f(x)] / ε
                self.forward_difference(&f, input, i)?
            };
            *slot = T::from_f32(grad);
        }

        Tensor::from_vec(numerical_grad, input.dims().to_vec())
    }

    fn central_difference<T, F>(&self, f: &F, input: &Tensor<T>, index: usize) -> TensorResult<f32>
    where
        T: FloatType,
        F: Fn(&Tensor<T>) -> TensorResult<Tensor<T>>,
    {
        let epsilon = self.config.epsilon;

        let f_plus = self.eval_scalar(f, input, index, epsilon)?;
        let f_minus = self.eval_scalar(f, input, index, -epsilon)?;

        Ok((f_plus - f_minus) / (2.0 * epsilon))
    }

    fn forward_difference<T, F>(&self, f: &F, input: &Tensor<T>, index: usize) -> TensorResult<f32>
    where
        T: FloatType,
        F: Fn(&Tensor<T>) -> TensorResult<Tensor<T>>,
    {
        let epsilon = self.config.epsilon;

        let f_x = self.eval_scalar(f, input, index, 0.0)?;
        let f_plus = self.eval_scalar(f, input, index, epsilon)?;

        Ok((f_plus - f_x) / epsilon)
    }

    fn eval_scalar<T, F>(
        &self,
        f: &F,
        input: &Tensor<T>,
        index: usize,
        delta: f32,
    ) -> TensorResult<f32>
    where
        T: FloatType,
        F: Fn(&Tensor<T>) -> TensorResult<Tensor<T>>,
    {
        let mut perturbed = input.to_vec();
        perturbed[index] = T::from_f32(perturbed[index].to_f32() + delta);

        let x = Tensor::from_vec(perturbed, input.dims().to_vec())?;
        let output = f(&x)?;

        Ok(output.data().iter().map(|v| v.to_f32()).sum())
    }

    /// Check gradient correctness by comparing analytical and numerical
    /// gradients
    pub fn check_gradient<T, F>(
        &self,
        f: F,
        input: &Tensor<T>,
        analytical_grad: &Tensor<T>,
        name: &str,
    ) -> TensorResult<GradCheckResult>
    where
        T: FloatType,
        F: Fn(&Tensor<T>) -> TensorResult<Tensor<T>>,
    {
        let numerical_grad = self.compute_numerical_gradient(f, input)?;

        let mut max_relative_error = 0.0f32;
        let mut max_absolute_error = 0.0f32;
        let mut num_passed = 0;

        for (analytical, numerical) in analytical_grad
            .data()
            .iter()
            .zip(numerical_grad.data().iter())
        {
            let analytical = analytical.to_f32();
            let numerical = numerical.to_f32();

            let absolute_error = (analytical - numerical).abs();
            let denominator = analytical.abs().max(numerical.abs()).max(1e-8);
            let relative_error = absolute_error / denominator;

            max_relative_error = max_relative_error.max(relative_error);
            max_absolute_error = max_absolute_error.max(absolute_error);

            if relative_error <= self.config.relative_tolerance
                || absolute_error <= self.config.absolute_tolerance
            {
                num_passed += 1;
            }
        }

        let num_elements = analytical_grad.numel();

        Ok(GradCheckResult {
            name: name.to_string(),
            max_relative_error,
            max_absolute_error,
            num_elements,
            num_passed,
            passed: num_passed == num_elements,
        })
    }
}

impl Default for GradientChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = GradCheckConfig::default();
        assert_eq!(config.epsilon, 1e-3);
        assert!(config.use_central_difference);
    }

    #[test]
    fn test_numerical_gradient_square() {
        let checker = GradientChecker::new();

        // f(x) = sum(x²), so ∂f/∂x_i = 2 x_i
        let x = Tensor::from_vec(vec![2.0f32, -1.0], vec![2]).unwrap();
        let numerical = checker
            .compute_numerical_gradient(|x: &Tensor<f32>| x.mul(x), &x)
            .unwrap();

        let values = numerical.to_vec();
        assert!((values[0] - 4.0).abs() < 1e-2);
        assert!((values[1] + 2.0).abs() < 1e-2);
    }

    #[test]
    fn test_check_gradient_passes() {
        let checker = GradientChecker::new();

        let x = Tensor::from_vec(vec![3.0f32], vec![1]).unwrap();
        let analytical = Tensor::from_vec(vec![6.0f32], vec![1]).unwrap();

        let result = checker
            .check_gradient(|x: &Tensor<f32>| x.mul(x), &x, &analytical, "square")
            .unwrap();

        assert!(result.passed, "max rel err {}", result.max_relative_error);
    }

    #[test]
    fn test_check_gradient_detects_wrong_gradient() {
        let checker = GradientChecker::new();

        let x = Tensor::from_vec(vec![3.0f32], vec![1]).unwrap();
        let wrong = Tensor::from_vec(vec![1.0f32], vec![1]).unwrap();

        let result = checker
            .check_gradient(|x: &Tensor<f32>| x.mul(x), &x, &wrong, "square")
            .unwrap();

        assert!(!result.passed);
    }
}
