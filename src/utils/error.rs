use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid record on line {line}: {message}")]
    RecordParseError { line: usize, message: String },

    #[error("Rule '{rule}' failed on record {row}: {message}")]
    RuleApplicationError {
        rule: String,
        row: usize,
        message: String,
    },

    #[error("Vote matrix row {row} has {found} votes, expected {expected}")]
    VoteMatrixShapeError {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Aggregation model error: {message}")]
    AggregationModelError { message: String },

    #[error("Malformed distribution for record {row}: {reason}")]
    MalformedDistributionError { row: usize, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Labeling,
    Model,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LabelError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LabelError::ConfigError { .. }
            | LabelError::ConfigValidationError { .. }
            | LabelError::InvalidConfigValueError { .. }
            | LabelError::MissingConfigError { .. } => ErrorCategory::Configuration,
            LabelError::RecordParseError { .. }
            | LabelError::SerializationError(_)
            | LabelError::CsvError(_) => ErrorCategory::Input,
            LabelError::RuleApplicationError { .. } | LabelError::VoteMatrixShapeError { .. } => {
                ErrorCategory::Labeling
            }
            LabelError::AggregationModelError { .. }
            | LabelError::MalformedDistributionError { .. } => ErrorCategory::Model,
            LabelError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Labeling | ErrorCategory::Model => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            LabelError::IoError(_) => "檢查輸入/輸出路徑是否存在且具有讀寫權限",
            LabelError::SerializationError(_) | LabelError::RecordParseError { .. } => {
                "確認輸入檔為每行一個 JSON 物件，且包含 uid 欄位"
            }
            LabelError::CsvError(_) => "檢查輸出路徑或改用 --format jsonl",
            LabelError::ConfigError { .. }
            | LabelError::ConfigValidationError { .. }
            | LabelError::InvalidConfigValueError { .. }
            | LabelError::MissingConfigError { .. } => "檢查 TOML 設定檔與命令列參數",
            LabelError::RuleApplicationError { .. } => "確認每筆記錄都有字串型別的 url 欄位",
            LabelError::VoteMatrixShapeError { .. } => "每列投票數必須與規則數相同",
            LabelError::AggregationModelError { .. } => {
                "確認模型檔與目前的規則順序及類別列舉一致，或使用 --aggregator majority"
            }
            LabelError::MalformedDistributionError { .. } => {
                "模型輸出的機率分佈不合法，請重新匯出模型"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LabelError::IoError(e) => format!("無法讀寫檔案: {}", e),
            LabelError::RecordParseError { line, .. } => {
                format!("輸入檔第 {} 行無法解析", line)
            }
            LabelError::RuleApplicationError { rule, row, .. } => {
                format!("規則 {} 在第 {} 筆記錄執行失敗", rule, row)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LabelError>;
