use crate::core::label_mapper::ClassEnumeration;
use crate::domain::model::{Record, Vote};
use crate::domain::ports::LabelingRule;
use crate::utils::error::{LabelError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_unique_names};
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    Contains,
    EndsWith,
    StartsWith,
    LongerThan,
    ContainsDigit,
    Regex,
    HostEndsWith,
}

/// TOML 中的 `[[rules]]` 區塊
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub name: String,
    pub kind: MatcherKind,
    #[serde(default)]
    pub patterns: Vec<String>,
    pub threshold: Option<usize>,
    pub label: String,
}

#[derive(Debug, Clone)]
pub enum Matcher {
    Contains(Vec<String>),
    EndsWith(Vec<String>),
    StartsWith(Vec<String>),
    LongerThan(usize),
    ContainsDigit,
    Regex(Vec<Regex>),
    HostEndsWith(Vec<String>),
}

impl Matcher {
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Matcher::Contains(patterns) => patterns.iter().any(|p| url.contains(p.as_str())),
            Matcher::EndsWith(patterns) => patterns.iter().any(|p| url.ends_with(p.as_str())),
            Matcher::StartsWith(patterns) => patterns.iter().any(|p| url.starts_with(p.as_str())),
            Matcher::LongerThan(limit) => url.chars().count() > *limit,
            // Unicode 數字（含全形、阿拉伯-印度數字），非僅 ASCII
            Matcher::ContainsDigit => url.chars().any(char::is_numeric),
            Matcher::Regex(patterns) => patterns.iter().any(|re| re.is_match(url)),
            Matcher::HostEndsWith(suffixes) => match url::Url::parse(url) {
                Ok(parsed) => parsed
                    .host_str()
                    .map(|host| suffixes.iter().any(|s| host.ends_with(s.as_str())))
                    .unwrap_or(false),
                // 無法解析的 URL 視為棄權
                Err(_) => false,
            },
        }
    }
}

/// 命中時投給固定類別，否則棄權
#[derive(Debug, Clone)]
pub struct UrlRule {
    name: String,
    matcher: Matcher,
    class_id: usize,
}

impl UrlRule {
    pub fn new(name: impl Into<String>, matcher: Matcher, class_id: usize) -> Self {
        Self {
            name: name.into(),
            matcher,
            class_id,
        }
    }

    pub fn from_definition(definition: &RuleDefinition, classes: &ClassEnumeration) -> Result<Self> {
        let field = format!("rules.{}", definition.name);
        validate_non_empty_string("rules.name", &definition.name)?;

        let class_id = classes.id_of(&definition.label).ok_or_else(|| {
            LabelError::InvalidConfigValueError {
                field: format!("{}.label", field),
                value: definition.label.clone(),
                reason: "Label is not part of the class enumeration".to_string(),
            }
        })?;

        let require_patterns = || -> Result<Vec<String>> {
            if definition.patterns.is_empty() {
                return Err(LabelError::MissingConfigError {
                    field: format!("{}.patterns", field),
                });
            }
            Ok(definition.patterns.clone())
        };

        let matcher = match definition.kind {
            MatcherKind::Contains => Matcher::Contains(require_patterns()?),
            MatcherKind::EndsWith => Matcher::EndsWith(require_patterns()?),
            MatcherKind::StartsWith => Matcher::StartsWith(require_patterns()?),
            MatcherKind::HostEndsWith => Matcher::HostEndsWith(require_patterns()?),
            MatcherKind::LongerThan => {
                let threshold = definition.threshold.ok_or_else(|| {
                    LabelError::MissingConfigError {
                        field: format!("{}.threshold", field),
                    }
                })?;
                Matcher::LongerThan(threshold)
            }
            MatcherKind::ContainsDigit => Matcher::ContainsDigit,
            MatcherKind::Regex => {
                let compiled = require_patterns()?
                    .iter()
                    .map(|p| {
                        Regex::new(p).map_err(|e| LabelError::InvalidConfigValueError {
                            field: format!("{}.patterns", field),
                            value: p.clone(),
                            reason: format!("Invalid regex: {}", e),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Matcher::Regex(compiled)
            }
        };

        Ok(Self::new(definition.name.clone(), matcher, class_id))
    }
}

impl LabelingRule for UrlRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, record: &Record) -> Result<Vote> {
        let url = record
            .url
            .as_deref()
            .ok_or_else(|| LabelError::RuleApplicationError {
                rule: self.name.clone(),
                row: 0,
                message: "record has no url field".to_string(),
            })?;

        if self.matcher.matches(url) {
            Ok(Vote::Class(self.class_id))
        } else {
            Ok(Vote::Abstain)
        }
    }
}

/// 有序的規則集合；欄位順序即投票矩陣的欄位順序
pub struct RuleSet {
    rules: Vec<Box<dyn LabelingRule>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Box<dyn LabelingRule>>) -> Result<Self> {
        validate_unique_names("rules", rules.iter().map(|rule| rule.name()))?;
        Ok(Self { rules })
    }

    pub fn from_definitions(definitions: &[RuleDefinition], classes: &ClassEnumeration) -> Result<Self> {
        let rules = definitions
            .iter()
            .map(|definition| {
                UrlRule::from_definition(definition, classes)
                    .map(|rule| Box::new(rule) as Box<dyn LabelingRule>)
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(rules)
    }

    pub fn rules(&self) -> &[Box<dyn LabelingRule>] {
        &self.rules
    }

    pub fn names(&self) -> Vec<String> {
        self.rules.iter().map(|rule| rule.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet").field("rules", &self.names()).finish()
    }
}
