//! Style Context - Value Objects

use serde::{Deserialize, Serialize};

use super::StyleError;

/// 风格嵌入向量
///
/// 由外部的文本/音频联合嵌入模型产生，此处只做加权平均运算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleEmbedding(Vec<f32>);

impl StyleEmbedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn into_values(self) -> Vec<f32> {
        self.0
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    /// 张量形状（一维）
    pub fn shape(&self) -> Vec<usize> {
        vec![self.0.len()]
    }
}

impl From<Vec<f32>> for StyleEmbedding {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// 风格权重，非负且有限
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleWeight(f32);

impl StyleWeight {
    /// 单个请求字段可接受的最大权重
    pub const MAX: f32 = 10.0;

    pub fn new(value: f32) -> Result<Self, StyleError> {
        if !value.is_finite() || value < 0.0 {
            return Err(StyleError::InvalidWeight(value.to_string()));
        }
        Ok(Self(value))
    }

    /// 带上限校验（表单中的单个权重字段）
    pub fn bounded(value: f32) -> Result<Self, StyleError> {
        let weight = Self::new(value)?;
        if weight.0 > Self::MAX {
            return Err(StyleError::WeightOutOfRange {
                value,
                max: Self::MAX,
            });
        }
        Ok(weight)
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for StyleWeight {
    fn default() -> Self {
        Self(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_shape() {
        let embedding = StyleEmbedding::new(vec![0.0; 768]);
        assert_eq!(embedding.shape(), vec![768]);
        assert_eq!(embedding.dim(), 768);
    }

    #[test]
    fn test_embedding_serializes_as_plain_array() {
        let embedding = StyleEmbedding::new(vec![0.5, -1.0]);
        let json = serde_json::to_string(&embedding).unwrap();
        assert_eq!(json, "[0.5,-1.0]");
    }

    #[test]
    fn test_weight_validation() {
        assert!(StyleWeight::new(0.0).is_ok());
        assert!(StyleWeight::new(-0.1).is_err());
        assert!(StyleWeight::new(f32::NAN).is_err());
        assert!(StyleWeight::bounded(10.0).is_ok());
        assert!(StyleWeight::bounded(10.5).is_err());
    }
}
