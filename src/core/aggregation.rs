use crate::domain::model::{Distribution, Vote, VoteMatrix};
use crate::domain::ports::AggregationModel;
use crate::utils::error::{LabelError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn model_error(message: impl Into<String>) -> LabelError {
    LabelError::AggregationModelError {
        message: message.into(),
    }
}

fn check_votes(matrix: &VoteMatrix, cardinality: usize) -> Result<()> {
    for (row, votes) in matrix.rows().iter().enumerate() {
        if let Some(vote) = votes
            .iter()
            .find(|vote| vote.class_id().is_some_and(|id| id >= cardinality))
        {
            return Err(model_error(format!(
                "record {} has vote {} outside of {} classes",
                row,
                vote.as_i64(),
                cardinality
            )));
        }
    }
    Ok(())
}

/// 序列化的模型檔內容
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedVoteArtifact {
    pub cardinality: usize,
    pub rules: Vec<String>,
    pub class_balance: Vec<f64>,
    pub accuracies: Vec<f64>,
}

/// 已訓練的加權投票模型：每條規則一個準確率，加上類別先驗，
/// 假設規則在給定真實類別下條件獨立。
#[derive(Debug, Clone)]
pub struct WeightedVoteModel {
    artifact: WeightedVoteArtifact,
    log_prior: Vec<f64>,
    log_hit: Vec<f64>,
    log_miss: Vec<f64>,
}

impl WeightedVoteModel {
    pub fn from_artifact(artifact: WeightedVoteArtifact) -> Result<Self> {
        let k = artifact.cardinality;
        if k < 2 {
            return Err(model_error(format!("cardinality must be at least 2, got {}", k)));
        }
        if artifact.class_balance.len() != k {
            return Err(model_error(format!(
                "class_balance has {} entries, expected {}",
                artifact.class_balance.len(),
                k
            )));
        }
        if artifact.accuracies.len() != artifact.rules.len() {
            return Err(model_error(format!(
                "{} accuracies for {} rules",
                artifact.accuracies.len(),
                artifact.rules.len()
            )));
        }
        if artifact
            .class_balance
            .iter()
            .any(|p| !p.is_finite() || *p <= 0.0)
        {
            return Err(model_error("class_balance entries must be positive"));
        }
        if let Some((name, acc)) = artifact
            .rules
            .iter()
            .zip(&artifact.accuracies)
            .find(|(_, acc)| !(**acc > 0.0 && **acc < 1.0))
        {
            return Err(model_error(format!(
                "accuracy of rule '{}' must be in (0, 1), got {}",
                name, acc
            )));
        }

        let balance_sum: f64 = artifact.class_balance.iter().sum();
        let log_prior = artifact
            .class_balance
            .iter()
            .map(|p| (p / balance_sum).ln())
            .collect();
        let log_hit = artifact.accuracies.iter().map(|a| a.ln()).collect();
        let log_miss = artifact
            .accuracies
            .iter()
            .map(|a| ((1.0 - a) / (k - 1) as f64).ln())
            .collect();

        Ok(Self {
            artifact,
            log_prior,
            log_hit,
            log_miss,
        })
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let artifact: WeightedVoteArtifact = serde_json::from_str(content)
            .map_err(|e| model_error(format!("invalid model artifact: {}", e)))?;
        Self::from_artifact(artifact)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            model_error(format!(
                "failed to read model '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    fn predict_row(&self, votes: &[Vote]) -> Distribution {
        let mut scores = self.log_prior.clone();
        for (j, vote) in votes.iter().enumerate() {
            let Some(voted) = vote.class_id() else {
                continue;
            };
            for (class, score) in scores.iter_mut().enumerate() {
                *score += if class == voted {
                    self.log_hit[j]
                } else {
                    self.log_miss[j]
                };
            }
        }
        softmax(&scores)
    }
}

fn softmax(scores: &[f64]) -> Distribution {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl AggregationModel for WeightedVoteModel {
    fn cardinality(&self) -> usize {
        self.artifact.cardinality
    }

    fn rule_names(&self) -> Option<&[String]> {
        Some(&self.artifact.rules)
    }

    fn predict_distribution(&self, matrix: &VoteMatrix) -> Result<Vec<Distribution>> {
        if matrix.num_rules() != self.artifact.rules.len() {
            return Err(model_error(format!(
                "model expects {} rules, vote matrix has {}",
                self.artifact.rules.len(),
                matrix.num_rules()
            )));
        }
        check_votes(matrix, self.cardinality())?;

        Ok(matrix
            .rows()
            .iter()
            .map(|votes| self.predict_row(votes))
            .collect())
    }
}

/// 未訓練的多數決基準：票數正規化即為分佈，全數棄權時為均勻分佈
#[derive(Debug, Clone, Copy)]
pub struct MajorityVoteModel {
    cardinality: usize,
}

impl MajorityVoteModel {
    pub fn new(cardinality: usize) -> Self {
        Self { cardinality }
    }
}

impl AggregationModel for MajorityVoteModel {
    fn cardinality(&self) -> usize {
        self.cardinality
    }

    fn predict_distribution(&self, matrix: &VoteMatrix) -> Result<Vec<Distribution>> {
        if self.cardinality == 0 {
            return Err(model_error("cardinality must be positive"));
        }
        check_votes(matrix, self.cardinality)?;

        Ok(matrix
            .rows()
            .iter()
            .map(|votes| {
                let mut counts = vec![0.0; self.cardinality];
                for id in votes.iter().filter_map(|vote| vote.class_id()) {
                    counts[id] += 1.0;
                }
                let total: f64 = counts.iter().sum();
                if total == 0.0 {
                    vec![1.0 / self.cardinality as f64; self.cardinality]
                } else {
                    counts.into_iter().map(|c| c / total).collect()
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: Vec<Vec<Vote>>) -> VoteMatrix {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let names = (0..width).map(|j| format!("lf_{}", j)).collect();
        VoteMatrix::new(names, rows).unwrap()
    }

    fn artifact(accuracies: Vec<f64>) -> WeightedVoteArtifact {
        WeightedVoteArtifact {
            cardinality: 3,
            rules: (0..accuracies.len()).map(|j| format!("lf_{}", j)).collect(),
            class_balance: vec![1.0 / 3.0; 3],
            accuracies,
        }
    }

    #[test]
    fn test_weighted_all_abstain_returns_class_balance() {
        let model = WeightedVoteModel::from_artifact(artifact(vec![0.9, 0.8])).unwrap();
        let probs = model
            .predict_distribution(&matrix(vec![vec![Vote::Abstain, Vote::Abstain]]))
            .unwrap();

        assert_eq!(probs.len(), 1);
        assert_eq!(probs[0][0], probs[0][1]);
        assert_eq!(probs[0][1], probs[0][2]);
    }

    #[test]
    fn test_weighted_more_accurate_rule_wins_conflict() {
        let model = WeightedVoteModel::from_artifact(artifact(vec![0.95, 0.6])).unwrap();
        let probs = model
            .predict_distribution(&matrix(vec![vec![Vote::Class(2), Vote::Class(0)]]))
            .unwrap();

        let sum: f64 = probs[0].iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(probs[0][2] > probs[0][0]);
        assert!(probs[0][0] > probs[0][1]);
    }

    #[test]
    fn test_weighted_rejects_shape_mismatch() {
        let model = WeightedVoteModel::from_artifact(artifact(vec![0.9])).unwrap();
        let err = model
            .predict_distribution(&matrix(vec![vec![Vote::Abstain, Vote::Abstain]]))
            .unwrap_err();
        assert!(matches!(err, LabelError::AggregationModelError { .. }));
    }

    #[test]
    fn test_weighted_rejects_out_of_range_vote() {
        let model = WeightedVoteModel::from_artifact(artifact(vec![0.9])).unwrap();
        assert!(model
            .predict_distribution(&matrix(vec![vec![Vote::Class(5)]]))
            .is_err());
    }

    #[test]
    fn test_invalid_artifacts() {
        assert!(WeightedVoteModel::from_artifact(artifact(vec![1.0])).is_err());
        assert!(WeightedVoteModel::from_artifact(artifact(vec![0.0])).is_err());

        let mut bad_balance = artifact(vec![0.9]);
        bad_balance.class_balance = vec![0.5, 0.5];
        assert!(WeightedVoteModel::from_artifact(bad_balance).is_err());

        assert!(WeightedVoteModel::from_json("{not json").is_err());
        assert!(WeightedVoteModel::from_file("/nonexistent/model.json").is_err());
    }

    #[test]
    fn test_weighted_from_json() {
        let json = r#"{
            "cardinality": 3,
            "rules": ["lf_a", "lf_b"],
            "class_balance": [0.6, 0.2, 0.2],
            "accuracies": [0.8, 0.7]
        }"#;
        let model = WeightedVoteModel::from_json(json).unwrap();
        assert_eq!(model.cardinality(), 3);
        assert_eq!(
            model.rule_names().unwrap(),
            &["lf_a".to_string(), "lf_b".to_string()]
        );
    }

    #[test]
    fn test_majority_vote() {
        let model = MajorityVoteModel::new(3);
        let probs = model
            .predict_distribution(&matrix(vec![
                vec![Vote::Class(0), Vote::Class(0), Vote::Class(2)],
                vec![Vote::Class(1), Vote::Class(2), Vote::Abstain],
                vec![Vote::Abstain, Vote::Abstain, Vote::Abstain],
            ]))
            .unwrap();

        assert_eq!(probs[0], vec![2.0 / 3.0, 0.0, 1.0 / 3.0]);
        assert_eq!(probs[1], vec![0.0, 0.5, 0.5]);
        assert_eq!(probs[2], vec![1.0 / 3.0; 3]);
    }
}
