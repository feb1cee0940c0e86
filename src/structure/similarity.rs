//! Cosine self-similarity matrix

const EPSILON: f32 = 1e-10;

/// Square, symmetric similarity matrix over sync frames
#[derive(Debug, Clone)]
pub struct SelfSimilarityMatrix {
    n: usize,
    values: Vec<f32>,
}

impl SelfSimilarityMatrix {
    /// Pairwise cosine similarity of feature rows
    ///
    /// Rows are L2-normalised first; a zero row has similarity 0 with every
    /// row except itself (the diagonal is always 1).
    pub fn from_features(features: &[Vec<f32>]) -> Self {
        let n = features.len();
        let unit: Vec<Vec<f32>> = features
            .iter()
            .map(|row| {
                let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
                if norm > EPSILON {
                    row.iter().map(|v| v / norm).collect()
                } else {
                    vec![0.0; row.len()]
                }
            })
            .collect();

        let mut values = vec![0.0f32; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let s: f32 = unit[i].iter().zip(unit[j].iter()).map(|(a, b)| a * b).sum();
                values[i * n + j] = s;
                values[j * n + i] = s;
            }
        }

        log::debug!("Self-similarity matrix: {}x{}", n, n);
        Self { n, values }
    }

    /// Matrix dimension
    pub fn len(&self) -> usize {
        self.n
    }

    /// True for a 0x0 matrix
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Entry `(i, j)`
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.values[i * self.n + j]
    }

    /// Entry `(i, j)` with zero outside the matrix
    #[inline]
    pub fn get_padded(&self, i: isize, j: isize) -> f32 {
        if i < 0 || j < 0 || i as usize >= self.n || j as usize >= self.n {
            0.0
        } else {
            self.get(i as usize, j as usize)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssm_is_symmetric_with_unit_diagonal() {
        let features = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];
        let ssm = SelfSimilarityMatrix::from_features(&features);
        assert_eq!(ssm.len(), 3);
        for i in 0..3 {
            assert_eq!(ssm.get(i, i), 1.0);
            for j in 0..3 {
                assert_eq!(ssm.get(i, j), ssm.get(j, i));
            }
        }
        assert!(ssm.get(0, 1).abs() < 1e-6);
        assert!((ssm.get(0, 2) - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn test_padding_is_zero() {
        let ssm = SelfSimilarityMatrix::from_features(&[vec![1.0]]);
        assert_eq!(ssm.get_padded(-1, 0), 0.0);
        assert_eq!(ssm.get_padded(0, 1), 0.0);
        assert_eq!(ssm.get_padded(0, 0), 1.0);
    }
}
