//! 风格混合
//!
//! 多个风格嵌入按权重混合：权重先归一化为和为 1，再求加权平均。

use super::{StyleEmbedding, StyleError, StyleWeight};

/// 将权重归一化，使其和为 1
pub fn normalize_weights(weights: &[f32]) -> Result<Vec<f32>, StyleError> {
    if weights.is_empty() {
        return Err(StyleError::NoStyles);
    }

    // f64 累加，避免大权重在 f32 下溢出为 inf
    let mut total = 0.0f64;
    for &w in weights {
        total += StyleWeight::new(w)?.value() as f64;
    }

    if !total.is_finite() {
        return Err(StyleError::InvalidWeight(format!("total weight {} is not finite", total)));
    }
    if total <= 0.0 {
        return Err(StyleError::ZeroTotalWeight);
    }

    Ok(weights.iter().map(|&w| (w as f64 / total) as f32).collect())
}

/// 加权混合多个风格嵌入
///
/// 结果为 Σ ŵᵢ·eᵢ，其中 ŵ 为归一化后的权重。
pub fn blend_styles(weighted: &[(f32, StyleEmbedding)]) -> Result<StyleEmbedding, StyleError> {
    let (_, first) = weighted.first().ok_or(StyleError::NoStyles)?;
    let dim = first.dim();

    if let Some((_, other)) = weighted.iter().find(|(_, e)| e.dim() != dim) {
        return Err(StyleError::DimensionMismatch {
            expected: dim,
            actual: other.dim(),
        });
    }

    let weights: Vec<f32> = weighted.iter().map(|(w, _)| *w).collect();
    let normalized = normalize_weights(&weights)?;

    let mut blended = vec![0.0f32; dim];
    for (w, (_, embedding)) in normalized.iter().zip(weighted) {
        for (acc, v) in blended.iter_mut().zip(embedding.values()) {
            *acc += w * v;
        }
    }

    Ok(StyleEmbedding::new(blended))
}

/// 解析逗号分隔的文本提示列表
pub fn parse_prompt_list(raw: &str) -> Result<Vec<String>, StyleError> {
    raw.split(',')
        .enumerate()
        .map(|(i, p)| {
            let prompt = p.trim();
            if prompt.is_empty() {
                Err(StyleError::EmptyPrompt(i + 1))
            } else {
                Ok(prompt.to_string())
            }
        })
        .collect()
}

/// 解析逗号分隔的权重列表
pub fn parse_weight_list(raw: &str) -> Result<Vec<f32>, StyleError> {
    raw.split(',')
        .map(|w| {
            let token = w.trim();
            let value: f32 = token
                .parse()
                .map_err(|_| StyleError::InvalidWeight(token.to_string()))?;
            StyleWeight::new(value).map(|w| w.value())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_normalize_sums_to_one() {
        let normalized = normalize_weights(&[2.0, 1.0, 1.0]).unwrap();
        assert!(approx(normalized.iter().sum(), 1.0));
        assert!(approx(normalized[0], 0.5));
        assert!(approx(normalized[1], 0.25));
    }

    #[test]
    fn test_normalize_rejects_zero_total() {
        assert!(matches!(
            normalize_weights(&[0.0, 0.0]),
            Err(StyleError::ZeroTotalWeight)
        ));
    }

    #[test]
    fn test_normalize_rejects_negative() {
        assert!(matches!(
            normalize_weights(&[1.0, -1.0]),
            Err(StyleError::InvalidWeight(_))
        ));
    }

    #[test]
    fn test_blend_is_weighted_mean() {
        let a = StyleEmbedding::new(vec![1.0, 0.0, 4.0]);
        let b = StyleEmbedding::new(vec![0.0, 1.0, 0.0]);
        let blended = blend_styles(&[(3.0, a), (1.0, b)]).unwrap();
        let v = blended.values();
        assert!(approx(v[0], 0.75));
        assert!(approx(v[1], 0.25));
        assert!(approx(v[2], 3.0));
    }

    #[test]
    fn test_normalize_large_weights_without_overflow() {
        let normalized = normalize_weights(&[3e38, 3e38]).unwrap();
        assert_eq!(normalized, vec![0.5, 0.5]);

        let blended = blend_styles(&[
            (3e38, StyleEmbedding::new(vec![1.0, 2.0])),
            (3e38, StyleEmbedding::new(vec![3.0, 4.0])),
        ])
        .unwrap();
        assert_eq!(blended.values(), &[2.0, 3.0]);
    }

    #[test]
    fn test_blend_single_input_is_identity() {
        let a = StyleEmbedding::new(vec![0.3, -0.7]);
        let blended = blend_styles(&[(5.0, a.clone())]).unwrap();
        assert_eq!(blended, a);
    }

    #[test]
    fn test_blend_rejects_empty() {
        assert!(matches!(blend_styles(&[]), Err(StyleError::NoStyles)));
    }

    #[test]
    fn test_blend_rejects_dimension_mismatch() {
        let a = StyleEmbedding::new(vec![1.0, 2.0]);
        let b = StyleEmbedding::new(vec![1.0]);
        assert!(matches!(
            blend_styles(&[(1.0, a), (1.0, b)]),
            Err(StyleError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_parse_prompt_list_trims() {
        let prompts = parse_prompt_list("funk, ambient synth ,jazz").unwrap();
        assert_eq!(prompts, vec!["funk", "ambient synth", "jazz"]);
    }

    #[test]
    fn test_parse_prompt_list_rejects_empty_entry() {
        assert!(matches!(
            parse_prompt_list("funk,,jazz"),
            Err(StyleError::EmptyPrompt(2))
        ));
    }

    #[test]
    fn test_parse_weight_list() {
        assert_eq!(parse_weight_list("2.0, 1").unwrap(), vec![2.0, 1.0]);
        assert!(matches!(
            parse_weight_list("2.0,abc"),
            Err(StyleError::InvalidWeight(t)) if t == "abc"
        ));
        assert!(parse_weight_list("-1").is_err());
    }
}
