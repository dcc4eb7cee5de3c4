use crate::domain::model::Decision;
use crate::utils::error::{LabelError, Result};

/// 機率總和允許的誤差
pub const SUM_TOLERANCE: f64 = 1e-6;

/// 將每列機率分佈轉成單一類別；最大值並列時一律輸出設定的 tie-break 類別。
///
/// 預設以精確相等判斷並列（浮點誤差造成的「近似並列」不算並列），
/// 只有在明確設定 `tolerance` 時才改用絕對誤差比較。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TieBreakPolicy {
    pub tie_break_class: usize,
    pub tolerance: Option<f64>,
}

impl TieBreakPolicy {
    pub fn new(tie_break_class: usize) -> Self {
        Self {
            tie_break_class,
            tolerance: None,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn decide(&self, distribution: &[f64]) -> Decision {
        let Some(max) = distribution.iter().copied().reduce(f64::max) else {
            return Decision {
                class_id: self.tie_break_class,
                tied: true,
            };
        };

        let is_max = |p: f64| match self.tolerance {
            Some(eps) => (max - p).abs() <= eps,
            None => p == max,
        };

        let mut winners = distribution
            .iter()
            .enumerate()
            .filter(|(_, p)| is_max(**p))
            .map(|(class_id, _)| class_id);

        match (winners.next(), winners.next()) {
            (Some(class_id), None) => Decision {
                class_id,
                tied: false,
            },
            _ => Decision {
                class_id: self.tie_break_class,
                tied: true,
            },
        }
    }
}

pub fn validate_distribution(row: usize, distribution: &[f64], cardinality: usize) -> Result<()> {
    if distribution.len() != cardinality {
        return Err(LabelError::MalformedDistributionError {
            row,
            reason: format!(
                "expected {} probabilities, got {}",
                cardinality,
                distribution.len()
            ),
        });
    }

    if let Some(p) = distribution.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(LabelError::MalformedDistributionError {
            row,
            reason: format!("invalid probability {}", p),
        });
    }

    let sum: f64 = distribution.iter().sum();
    if (sum - 1.0).abs() > SUM_TOLERANCE {
        return Err(LabelError::MalformedDistributionError {
            row,
            reason: format!("probabilities sum to {}", sum),
        });
    }

    Ok(())
}
