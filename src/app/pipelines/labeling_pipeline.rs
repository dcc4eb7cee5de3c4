use crate::core::labeler::Labeler;
use crate::core::{ConfigProvider, LabelResult, Pipeline, Record, Storage};
use crate::domain::model::{LabeledRecord, RuleSummary};
use crate::domain::ports::{AggregationModel, OutputFormat};
use crate::utils::error::{LabelError, Result};
use serde::Serialize;

/// 讀取 JSONL 記錄、標註後寫出 `(uid, label)` 的管道
pub struct LabelingPipeline<S: Storage, C: ConfigProvider, M: AggregationModel> {
    storage: S,
    config: C,
    labeler: Labeler<M>,
}

impl<S: Storage, C: ConfigProvider, M: AggregationModel> LabelingPipeline<S, C, M> {
    pub fn new(storage: S, config: C, labeler: Labeler<M>) -> Self {
        Self {
            storage,
            config,
            labeler,
        }
    }
}

#[derive(Debug, Serialize)]
struct LabelCount<'a> {
    label: &'a str,
    count: usize,
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    generated_at: String,
    input: &'a str,
    output: &'a str,
    records: usize,
    ties: usize,
    tie_break_label: &'a str,
    label_counts: Vec<LabelCount<'a>>,
    rules: &'a [RuleSummary],
}

pub fn parse_records(content: &str) -> Result<Vec<Record>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<Record>(line).map_err(|e| LabelError::RecordParseError {
                line: index + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

pub fn render_jsonl(records: &[LabeledRecord]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.push(b'\n');
    }
    Ok(out)
}

pub fn render_csv(records: &[LabeledRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["uid", "label"])?;
    for record in records {
        // 字串型 uid 去掉 JSON 引號，其餘保留原文
        let raw = record.uid.get();
        let uid = serde_json::from_str::<String>(raw).unwrap_or_else(|_| raw.to_string());
        writer.write_record([uid.as_str(), record.label.as_str()])?;
    }
    writer
        .into_inner()
        .map_err(|e| LabelError::IoError(e.into_error()))
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, M: AggregationModel> Pipeline for LabelingPipeline<S, C, M> {
    async fn extract(&self) -> Result<Vec<Record>> {
        let input_path = self.config.input_path();
        tracing::debug!("Reading records from: {}", input_path);

        let bytes = self.storage.read_file(input_path).await?;
        let content = String::from_utf8(bytes).map_err(|e| LabelError::RecordParseError {
            line: 0,
            message: format!("input is not valid UTF-8: {}", e),
        })?;

        parse_records(&content)
    }

    async fn transform(&self, data: Vec<Record>) -> Result<LabelResult> {
        tracing::debug!(
            "Applying {} rules to {} records",
            self.labeler.rules().len(),
            data.len()
        );
        self.labeler.label(&data)
    }

    async fn load(&self, result: LabelResult) -> Result<String> {
        let output_path = self.config.output_path();

        // 先完成所有序列化，再一次寫出
        let payload = match self.config.output_format() {
            OutputFormat::Jsonl => render_jsonl(&result.labeled)?,
            OutputFormat::Csv => render_csv(&result.labeled)?,
        };

        let summary = match self.config.summary_path() {
            Some(path) => {
                let classes = self.labeler.classes();
                let summary = RunSummary {
                    generated_at: chrono::Utc::now().to_rfc3339(),
                    input: self.config.input_path(),
                    output: output_path,
                    records: result.labeled.len(),
                    ties: result.tie_count(),
                    tie_break_label: classes.name_of(self.labeler.policy().tie_break_class),
                    label_counts: result
                        .label_counts
                        .iter()
                        .map(|(label, count)| LabelCount {
                            label,
                            count: *count,
                        })
                        .collect(),
                    rules: &result.rule_summaries,
                };
                Some((path, serde_json::to_vec_pretty(&summary)?))
            }
            None => None,
        };

        tracing::debug!("Writing {} bytes to {}", payload.len(), output_path);
        self.storage.write_file(output_path, &payload).await?;

        if let Some((path, bytes)) = summary {
            // 摘要寫入失敗時撤回已寫出的結果檔
            if let Err(e) = self.storage.write_file(path, &bytes).await {
                if let Err(cleanup) = self.storage.remove_file(output_path).await {
                    tracing::warn!("Failed to remove {}: {}", output_path, cleanup);
                }
                return Err(e);
            }
            tracing::info!("📝 Run summary saved to: {}", path);
        }

        Ok(output_path.to_string())
    }
}
