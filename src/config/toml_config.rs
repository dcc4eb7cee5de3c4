use crate::core::decision::TieBreakPolicy;
use crate::core::label_mapper::{ClassEntry, ClassEnumeration};
use crate::core::rules::{RuleDefinition, RuleSet};
use crate::utils::error::{LabelError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_unique_names, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 內建的預設規則集與類別列舉
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default_labeler.toml");

/// 類別可用 id 或名稱指定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassRef {
    Id(usize),
    Name(String),
}

impl ClassRef {
    pub fn resolve(&self, classes: &ClassEnumeration) -> Option<usize> {
        match self {
            ClassRef::Id(id) => classes.contains(*id).then_some(*id),
            ClassRef::Name(name) => classes.id_of(name),
        }
    }
}

impl std::str::FromStr for ClassRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.parse::<usize>() {
            Ok(id) => ClassRef::Id(id),
            Err(_) => ClassRef::Name(s.to_string()),
        })
    }
}

impl std::fmt::Display for ClassRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassRef::Id(id) => write!(f, "{}", id),
            ClassRef::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelerSection {
    #[serde(default = "default_tie_break_label")]
    pub tie_break_label: ClassRef,
    pub tie_tolerance: Option<f64>,
    #[serde(default = "default_strict")]
    pub strict_distributions: bool,
}

fn default_tie_break_label() -> ClassRef {
    ClassRef::Name("Benign".to_string())
}

fn default_strict() -> bool {
    true
}

impl Default for LabelerSection {
    fn default() -> Self {
        Self {
            tie_break_label: default_tie_break_label(),
            tie_tolerance: None,
            strict_distributions: default_strict(),
        }
    }
}

fn default_classes() -> Vec<ClassEntry> {
    ClassEnumeration::default().entries().to_vec()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelerConfig {
    #[serde(default)]
    pub labeler: LabelerSection,
    #[serde(default = "default_classes")]
    pub classes: Vec<ClassEntry>,
    pub rules: Option<Vec<RuleDefinition>>,
}

impl LabelerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LabelError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置；未提供 `[[rules]]` 時沿用內建規則
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: Self = Self::parse(&processed_content)?;
        if config.rules.is_none() {
            config.rules = Self::parse(DEFAULT_CONFIG)?.rules;
        }
        Ok(config)
    }

    pub fn builtin() -> Result<Self> {
        Self::parse(DEFAULT_CONFIG)
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| LabelError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${URL_KEYWORD})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LabelError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn class_enumeration(&self) -> ClassEnumeration {
        ClassEnumeration::new(self.classes.clone())
    }

    pub fn tie_break_class(&self) -> Result<usize> {
        let classes = self.class_enumeration();
        self.labeler
            .tie_break_label
            .resolve(&classes)
            .ok_or_else(|| LabelError::InvalidConfigValueError {
                field: "labeler.tie_break_label".to_string(),
                value: self.labeler.tie_break_label.to_string(),
                reason: "Tie-break label is not part of the class enumeration".to_string(),
            })
    }

    pub fn tie_break_policy(&self) -> Result<TieBreakPolicy> {
        let policy = TieBreakPolicy::new(self.tie_break_class()?);
        Ok(match self.labeler.tie_tolerance {
            Some(tolerance) => policy.with_tolerance(tolerance),
            None => policy,
        })
    }

    pub fn rule_definitions(&self) -> &[RuleDefinition] {
        self.rules.as_deref().unwrap_or_default()
    }

    pub fn rule_set(&self) -> Result<RuleSet> {
        RuleSet::from_definitions(self.rule_definitions(), &self.class_enumeration())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(LabelError::MissingConfigError {
                field: "classes".to_string(),
            });
        }
        for class in &self.classes {
            validate_non_empty_string("classes.name", &class.name)?;
        }
        validate_unique_names("classes.name", self.classes.iter().map(|c| c.name.as_str()))?;

        let classes = self.class_enumeration();
        if !classes.is_contiguous() {
            return Err(LabelError::ConfigValidationError {
                field: "classes.id".to_string(),
                message: format!("class ids must be 0..{} without gaps", classes.len()),
            });
        }

        self.tie_break_class()?;

        if let Some(tolerance) = self.labeler.tie_tolerance {
            validate_range("labeler.tie_tolerance", tolerance, 0.0, 1.0)?;
        }

        if self.rule_definitions().is_empty() {
            return Err(LabelError::MissingConfigError {
                field: "rules".to_string(),
            });
        }

        // 建構一次以檢查標籤、樣式與 regex
        self.rule_set()?;

        Ok(())
    }
}

impl Validate for LabelerConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
