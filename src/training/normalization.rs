//! Z-score feature normalization

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Per-column mean and standard deviation of a training matrix
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureNormalization {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl FeatureNormalization {
    /// Floor for the standard deviation; constant columns would otherwise divide by 0
    pub const MIN_STD: f32 = 0.001;

    /// Compute from row-major feature rows of width `dim`
    pub fn from_rows(rows: &[Vec<f32>], dim: usize) -> Self {
        let mut sum = vec![0.0f32; dim];
        let mut sum_sq = vec![0.0f32; dim];

        for row in rows {
            for (j, &v) in row.iter().take(dim).enumerate() {
                sum[j] += v;
                sum_sq[j] += v * v;
            }
        }

        let n = rows.len().max(1) as f32;
        let mean: Vec<f32> = sum.iter().map(|s| s / n).collect();
        let std: Vec<f32> = sum_sq
            .iter()
            .zip(mean.iter())
            .map(|(sq, m)| ((sq / n - m * m).max(0.0).sqrt()).max(Self::MIN_STD))
            .collect();

        FeatureNormalization { mean, std }
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Normalize a [batch, dim] tensor: (x - mean) / std
    pub fn normalize<B: Backend>(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = features.device();
        let mean = Tensor::<B, 1>::from_floats(self.mean.as_slice(), &device).unsqueeze_dim(0);
        let std = Tensor::<B, 1>::from_floats(self.std.as_slice(), &device).unsqueeze_dim(0);

        (features - mean) / std
    }

    /// Map weights learned on normalized inputs back to raw inputs.
    ///
    /// w·((x - m) / s) + b = (w / s)·x + (b - Σ w·m / s)
    pub fn denormalize_weights(&self, weights: &[f32], bias: f32) -> (Vec<f32>, f32) {
        let coefficients: Vec<f32> = weights
            .iter()
            .zip(self.std.iter())
            .map(|(w, s)| w / s)
            .collect();
        let shift: f32 = coefficients
            .iter()
            .zip(self.mean.iter())
            .map(|(c, m)| c * m)
            .sum();
        (coefficients, bias - shift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_from_rows() {
        let rows = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
        let norm = FeatureNormalization::from_rows(&rows, 2);
        assert_eq!(norm.mean, vec![2.0, 5.0]);
        assert!((norm.std[0] - 1.0).abs() < 1e-6);
        // Constant column hits the floor
        assert_eq!(norm.std[1], FeatureNormalization::MIN_STD);
    }

    #[test]
    fn test_normalize_tensor() {
        let norm = FeatureNormalization {
            mean: vec![2.0, 0.0],
            std: vec![1.0, 2.0],
        };
        let device = Default::default();
        let x = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![1.0f32, 4.0, 3.0, -2.0], [2, 2]),
            &device,
        );
        let out = norm.normalize(x).into_data().to_vec::<f32>().unwrap();
        assert_eq!(out, vec![-1.0, 2.0, 1.0, -1.0]);
    }

    #[test]
    fn test_denormalized_weights_give_same_logit() {
        let norm = FeatureNormalization {
            mean: vec![3.0, -1.0],
            std: vec![2.0, 0.5],
        };
        let weights = [0.8f32, -1.2];
        let bias = 0.3f32;
        let raw = [5.0f32, 0.0];

        let normalized_logit: f32 = raw
            .iter()
            .enumerate()
            .map(|(j, x)| weights[j] * (x - norm.mean[j]) / norm.std[j])
            .sum::<f32>()
            + bias;

        let (coef, intercept) = norm.denormalize_weights(&weights, bias);
        let raw_logit: f32 = coef.iter().zip(raw.iter()).map(|(c, x)| c * x).sum::<f32>() + intercept;

        assert!((normalized_logit - raw_logit).abs() < 1e-5);
    }
}
