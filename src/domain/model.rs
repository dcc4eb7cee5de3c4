use crate::utils::error::{LabelError, Result};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// 一筆輸入的 URL 記錄；`uid` 保留原始 JSON 文字，輸出時逐位元組寫回
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub uid: Box<RawValue>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Record {
    pub fn new(uid: Box<RawValue>, url: impl Into<String>) -> Self {
        Self {
            uid,
            url: Some(url.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vote {
    Abstain,
    Class(usize),
}

impl Vote {
    pub const ABSTAIN: i64 = -1;

    /// `-1` 表示棄權，`0..k` 表示類別
    pub fn as_i64(self) -> i64 {
        match self {
            Vote::Abstain => Self::ABSTAIN,
            Vote::Class(id) => id as i64,
        }
    }

    pub fn class_id(self) -> Option<usize> {
        match self {
            Vote::Abstain => None,
            Vote::Class(id) => Some(id),
        }
    }

    pub fn is_abstain(self) -> bool {
        matches!(self, Vote::Abstain)
    }
}

/// N × R 的投票矩陣，列順序與輸入記錄一致
#[derive(Debug, Clone, PartialEq)]
pub struct VoteMatrix {
    rule_names: Vec<String>,
    rows: Vec<Vec<Vote>>,
}

impl VoteMatrix {
    /// 每列長度必須等於規則數
    pub fn new(rule_names: Vec<String>, rows: Vec<Vec<Vote>>) -> Result<Self> {
        if let Some((row, votes)) = rows
            .iter()
            .enumerate()
            .find(|(_, votes)| votes.len() != rule_names.len())
        {
            return Err(LabelError::VoteMatrixShapeError {
                row,
                expected: rule_names.len(),
                found: votes.len(),
            });
        }
        Ok(Self { rule_names, rows })
    }

    pub fn rule_names(&self) -> &[String] {
        &self.rule_names
    }

    pub fn rows(&self) -> &[Vec<Vote>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Vote]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = Vote> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index).copied())
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_rules(&self) -> usize {
        self.rule_names.len()
    }
}

pub type Distribution = Vec<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub class_id: usize,
    pub tied: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabeledRecord {
    pub uid: Box<RawValue>,
    pub label: String,
}

/// 單一規則在整批資料上的覆蓋率統計
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSummary {
    pub name: String,
    pub polarity: Vec<usize>,
    pub coverage: f64,
    pub overlaps: f64,
    pub conflicts: f64,
}

#[derive(Debug, Clone)]
pub struct LabelResult {
    pub labeled: Vec<LabeledRecord>,
    pub decisions: Vec<Decision>,
    pub rule_summaries: Vec<RuleSummary>,
    pub label_counts: Vec<(String, usize)>,
}

impl LabelResult {
    pub fn tie_count(&self) -> usize {
        self.decisions.iter().filter(|d| d.tied).count()
    }
}
