use crate::domain::model::{Distribution, LabelResult, Record, Vote, VoteMatrix};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Csv,
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_format(&self) -> OutputFormat;
    fn summary_path(&self) -> Option<&str>;
}

/// 單一啟發式規則：對一筆記錄投票或棄權
pub trait LabelingRule: Send + Sync {
    fn name(&self) -> &str;
    fn evaluate(&self, record: &Record) -> Result<Vote>;
}

/// 已訓練好的聚合模型，只負責把投票矩陣轉成每列的機率分佈。
///
/// 呼叫端必須保證模型與規則順序、類別列舉一致；若模型有記錄規則名稱，
/// `rule_names` 會回傳它們以便檢查。
pub trait AggregationModel: Send + Sync {
    fn cardinality(&self) -> usize;

    fn rule_names(&self) -> Option<&[String]> {
        None
    }

    fn predict_distribution(&self, matrix: &VoteMatrix) -> Result<Vec<Distribution>>;
}

impl<M: AggregationModel + ?Sized> AggregationModel for Box<M> {
    fn cardinality(&self) -> usize {
        (**self).cardinality()
    }

    fn rule_names(&self) -> Option<&[String]> {
        (**self).rule_names()
    }

    fn predict_distribution(&self, matrix: &VoteMatrix) -> Result<Vec<Distribution>> {
        (**self).predict_distribution(matrix)
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<LabelResult>;
    async fn load(&self, result: LabelResult) -> Result<String>;
}
