use crate::core::analysis::summarize_rules;
use crate::core::decision::{validate_distribution, TieBreakPolicy};
use crate::core::label_mapper::{ClassEnumeration, UNKNOWN_LABEL};
use crate::core::rules::RuleSet;
use crate::core::vote_matrix::build_vote_matrix;
use crate::domain::model::{LabelResult, LabeledRecord, Record};
use crate::domain::ports::AggregationModel;
use crate::utils::error::{LabelError, Result};

/// 記錄 → 投票矩陣 → 機率分佈 → 決策 → 類別名稱
pub struct Labeler<M: AggregationModel> {
    rules: RuleSet,
    model: M,
    classes: ClassEnumeration,
    policy: TieBreakPolicy,
    strict_distributions: bool,
}

impl<M: AggregationModel> Labeler<M> {
    pub fn new(
        rules: RuleSet,
        model: M,
        classes: ClassEnumeration,
        policy: TieBreakPolicy,
    ) -> Result<Self> {
        if model.cardinality() != classes.len() {
            return Err(LabelError::AggregationModelError {
                message: format!(
                    "model was trained for {} classes but {} are configured",
                    model.cardinality(),
                    classes.len()
                ),
            });
        }

        if let Some(model_rules) = model.rule_names() {
            let names = rules.names();
            if model_rules != names.as_slice() {
                let first_mismatch = model_rules
                    .iter()
                    .zip(&names)
                    .position(|(a, b)| a != b)
                    .unwrap_or_else(|| model_rules.len().min(names.len()));
                return Err(LabelError::AggregationModelError {
                    message: format!(
                        "model rule ordering does not match the rule set ({} vs {} rules, first difference at column {})",
                        model_rules.len(),
                        names.len(),
                        first_mismatch
                    ),
                });
            }
        }

        Ok(Self {
            rules,
            model,
            classes,
            policy,
            strict_distributions: true,
        })
    }

    pub fn with_strict_distributions(mut self, strict: bool) -> Self {
        self.strict_distributions = strict;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn classes(&self) -> &ClassEnumeration {
        &self.classes
    }

    pub fn policy(&self) -> TieBreakPolicy {
        self.policy
    }

    pub fn label(&self, records: &[Record]) -> Result<LabelResult> {
        let matrix = build_vote_matrix(&self.rules, records)?;
        let rule_summaries = summarize_rules(&matrix);
        for summary in &rule_summaries {
            tracing::debug!(
                "Rule {}: coverage {:.3}, overlaps {:.3}, conflicts {:.3}",
                summary.name,
                summary.coverage,
                summary.overlaps,
                summary.conflicts
            );
        }

        let distributions = self.model.predict_distribution(&matrix)?;
        if distributions.len() != records.len() {
            return Err(LabelError::AggregationModelError {
                message: format!(
                    "model returned {} distributions for {} records",
                    distributions.len(),
                    records.len()
                ),
            });
        }

        let mut decisions = Vec::with_capacity(records.len());
        for (row, distribution) in distributions.iter().enumerate() {
            if self.strict_distributions {
                validate_distribution(row, distribution, self.model.cardinality())?;
            }
            decisions.push(self.policy.decide(distribution));
        }

        let labeled: Vec<LabeledRecord> = records
            .iter()
            .zip(&decisions)
            .map(|(record, decision)| LabeledRecord {
                uid: record.uid.clone(),
                label: self.classes.name_of(decision.class_id).to_string(),
            })
            .collect();

        let unknown = labeled.iter().filter(|r| r.label == UNKNOWN_LABEL).count();
        if unknown > 0 {
            tracing::warn!("⚠️ {} records resolved to a class id outside the enumeration", unknown);
        }

        let mut label_counts: Vec<(String, usize)> = self
            .classes
            .entries()
            .iter()
            .map(|entry| {
                let count = labeled.iter().filter(|r| r.label == entry.name).count();
                (entry.name.clone(), count)
            })
            .collect();
        if unknown > 0 {
            label_counts.push((UNKNOWN_LABEL.to_string(), unknown));
        }

        Ok(LabelResult {
            labeled,
            decisions,
            rule_summaries,
            label_counts,
        })
    }
}
