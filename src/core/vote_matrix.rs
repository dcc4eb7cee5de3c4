use crate::core::rules::RuleSet;
use crate::domain::model::{Record, VoteMatrix};
use crate::utils::error::{LabelError, Result};

/// 對每筆記錄套用所有規則，產生 N × R 投票矩陣。
///
/// 任一規則失敗即中止，不回傳部分矩陣。
pub fn build_vote_matrix(rules: &RuleSet, records: &[Record]) -> Result<VoteMatrix> {
    let mut rows = Vec::with_capacity(records.len());

    for (row, record) in records.iter().enumerate() {
        let votes = rules
            .rules()
            .iter()
            .map(|rule| {
                rule.evaluate(record).map_err(|e| match e {
                    LabelError::RuleApplicationError { rule, message, .. } => {
                        LabelError::RuleApplicationError { rule, row, message }
                    }
                    other => LabelError::RuleApplicationError {
                        rule: rule.name().to_string(),
                        row,
                        message: other.to_string(),
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(votes);
    }

    tracing::debug!(
        "Built vote matrix: {} records x {} rules",
        rows.len(),
        rules.len()
    );

    VoteMatrix::new(rules.names(), rows)
}
