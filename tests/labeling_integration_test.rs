use anyhow::Result;
use url_labeler::core::rules::{Matcher, UrlRule};
use url_labeler::domain::model::{Distribution, Vote, VoteMatrix};
use url_labeler::domain::ports::{ConfigProvider, OutputFormat};
use url_labeler::{
    AggregationModel, ClassEnumeration, LabelError, Labeler, LabelingEngine, LabelingPipeline,
    LabelingRule, LocalStorage, MajorityVoteModel, RuleSet, TieBreakPolicy,
};
use tempfile::TempDir;

/// 依記錄順序回傳固定分佈的測試模型
struct ScriptedModel {
    distributions: Vec<Distribution>,
}

impl AggregationModel for ScriptedModel {
    fn cardinality(&self) -> usize {
        3
    }

    fn predict_distribution(&self, matrix: &VoteMatrix) -> url_labeler::Result<Vec<Distribution>> {
        Ok(self.distributions[..matrix.num_rows()].to_vec())
    }
}

/// 永遠投給類別 0
struct AlwaysBenign;

impl LabelingRule for AlwaysBenign {
    fn name(&self) -> &str {
        "rule_A"
    }

    fn evaluate(&self, _record: &url_labeler::Record) -> url_labeler::Result<Vote> {
        Ok(Vote::Class(0))
    }
}

/// 永遠棄權
struct AlwaysAbstain;

impl LabelingRule for AlwaysAbstain {
    fn name(&self) -> &str {
        "rule_B"
    }

    fn evaluate(&self, _record: &url_labeler::Record) -> url_labeler::Result<Vote> {
        Ok(Vote::Abstain)
    }
}

struct FileConfig {
    input: String,
    output: String,
    format: OutputFormat,
}

impl ConfigProvider for FileConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output
    }

    fn output_format(&self) -> OutputFormat {
        self.format
    }

    fn summary_path(&self) -> Option<&str> {
        None
    }
}

fn two_rule_set() -> RuleSet {
    let rules: Vec<Box<dyn LabelingRule>> = vec![Box::new(AlwaysBenign), Box::new(AlwaysAbstain)];
    RuleSet::new(rules).unwrap()
}

fn setup(temp_dir: &TempDir, input: &str) -> Result<FileConfig> {
    let input_path = temp_dir.path().join("urls.jsonl");
    std::fs::write(&input_path, input)?;
    Ok(FileConfig {
        input: input_path.to_str().unwrap().to_string(),
        output: temp_dir.path().join("out/labels.jsonl").to_str().unwrap().to_string(),
        format: OutputFormat::Jsonl,
    })
}

#[tokio::test]
async fn test_three_record_scenario_with_scripted_model() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = setup(
        &temp_dir,
        concat!(
            "{\"uid\": \"r1\", \"url\": \"https://a.example\"}\n",
            "{\"uid\": \"r2\", \"url\": \"https://b.example\"}\n",
            "{\"uid\": \"r3\", \"url\": \"https://c.example\"}\n",
        ),
    )?;
    let output = config.output.clone();

    let model = ScriptedModel {
        distributions: vec![
            vec![0.7, 0.2, 0.1],
            vec![0.4, 0.4, 0.2],
            vec![0.0, 0.0, 1.0],
        ],
    };
    let labeler = Labeler::new(
        two_rule_set(),
        model,
        ClassEnumeration::default(),
        TieBreakPolicy::new(0),
    )?;

    let pipeline = LabelingPipeline::new(LocalStorage::default(), config, labeler);
    let engine = LabelingEngine::new(pipeline);
    let output_path = engine.run().await?;

    assert_eq!(output_path, output);
    let written = std::fs::read_to_string(&output)?;
    let labels: Vec<serde_json::Value> = written
        .lines()
        .map(serde_json::from_str::<serde_json::Value>)
        .collect::<std::result::Result<_, _>>()?;

    assert_eq!(labels.len(), 3);
    assert_eq!(labels[0], serde_json::json!({"uid": "r1", "label": "Benign"}));
    assert_eq!(labels[1], serde_json::json!({"uid": "r2", "label": "Benign"}));
    assert_eq!(labels[2], serde_json::json!({"uid": "r3", "label": "Adult"}));
    Ok(())
}

#[tokio::test]
async fn test_tie_break_label_is_configurable() -> Result<()> {
    let model = ScriptedModel {
        distributions: vec![vec![0.4, 0.4, 0.2], vec![0.0, 0.5, 0.5]],
    };
    let labeler = Labeler::new(
        two_rule_set(),
        model,
        ClassEnumeration::default(),
        TieBreakPolicy::new(1),
    )?;

    let records: Vec<url_labeler::Record> = serde_json::from_str(
        r#"[{"uid": 1, "url": "x"}, {"uid": 2, "url": "y"}]"#,
    )?;
    let result = labeler.label(&records)?;

    assert_eq!(result.labeled[0].label, "Malicious");
    assert_eq!(result.labeled[1].label, "Malicious");
    assert_eq!(result.tie_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_order_and_uid_preserved_for_any_permutation() -> Result<()> {
    let lines = [
        r#"{"uid": "a", "url": "https://museum.example.org"}"#,
        r#"{"uid": 1.50, "url": "http://phish-login.biz"}"#,
        r#"{"uid": {"k": [1, 2]}, "url": "http://example.xxx"}"#,
        r#"{"uid": "ünïcødé", "url": "http://plain.example"}"#,
    ];
    let permutations = [[0, 1, 2, 3], [3, 2, 1, 0], [1, 3, 0, 2]];
    let expected_uids = [r#""a""#, "1.50", r#"{"k": [1, 2]}"#, r#""ünïcødé""#];

    for order in permutations {
        let temp_dir = TempDir::new()?;
        let input: String = order.iter().map(|&i| format!("{}\n", lines[i])).collect();
        let config = setup(&temp_dir, &input)?;
        let output = config.output.clone();

        let labeler_config = url_labeler::LabelerConfig::builtin()?;
        let labeler = Labeler::new(
            labeler_config.rule_set()?,
            MajorityVoteModel::new(3),
            labeler_config.class_enumeration(),
            labeler_config.tie_break_policy()?,
        )?;
        let pipeline = LabelingPipeline::new(LocalStorage::default(), config, labeler);
        LabelingEngine::new(pipeline).run().await?;

        let written = std::fs::read_to_string(&output)?;
        let uids: Vec<String> = written
            .lines()
            .map(|line| {
                let start = line.find(':').unwrap() + 1;
                let end = line.rfind(",\"label\"").unwrap();
                line[start..end].to_string()
            })
            .collect();
        let expected: Vec<String> = order.iter().map(|&i| expected_uids[i].to_string()).collect();
        assert_eq!(uids, expected);
    }
    Ok(())
}

#[tokio::test]
async fn test_weighted_model_from_file_end_to_end() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut config = setup(
        &temp_dir,
        concat!(
            "{\"uid\": \"safe\", \"url\": \"https://docs.example.org\"}\n",
            "{\"uid\": \"bad\", \"url\": \"http://phish.example.com\"}\n",
            "{\"uid\": \"none\", \"url\": \"ftp://example.com\"}\n",
        ),
    )?;
    config.format = OutputFormat::Csv;
    let output = config.output.clone();

    let model_path = temp_dir.path().join("model.json");
    std::fs::write(
        &model_path,
        r#"{
            "cardinality": 3,
            "rules": ["lf_https", "lf_phish"],
            "class_balance": [0.5, 0.25, 0.25],
            "accuracies": [0.7, 0.9]
        }"#,
    )?;

    let rules: Vec<Box<dyn LabelingRule>> = vec![
        Box::new(UrlRule::new("lf_https", Matcher::StartsWith(vec!["https://".into()]), 0)),
        Box::new(UrlRule::new("lf_phish", Matcher::Contains(vec!["phish".into()]), 1)),
    ];
    let labeler = Labeler::new(
        RuleSet::new(rules)?,
        url_labeler::WeightedVoteModel::from_file(&model_path)?,
        ClassEnumeration::default(),
        TieBreakPolicy::new(0),
    )?;

    let pipeline = LabelingPipeline::new(LocalStorage::default(), config, labeler);
    LabelingEngine::new(pipeline).run().await?;

    let written = std::fs::read_to_string(&output)?;
    // 最後一筆全數棄權，依類別先驗判為 Benign
    assert_eq!(written, "uid,label\nsafe,Benign\nbad,Malicious\nnone,Benign\n");
    Ok(())
}

#[tokio::test]
async fn test_model_rule_mismatch_aborts_before_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let model_path = temp_dir.path().join("model.json");
    std::fs::write(
        &model_path,
        r#"{"cardinality": 3, "rules": ["rule_B", "rule_A"], "class_balance": [1, 1, 1], "accuracies": [0.8, 0.8]}"#,
    )?;

    let err = Labeler::new(
        two_rule_set(),
        url_labeler::WeightedVoteModel::from_file(&model_path)?,
        ClassEnumeration::default(),
        TieBreakPolicy::new(0),
    )
    .err()
    .expect("mismatched rule ordering must be rejected");

    assert!(matches!(err, LabelError::AggregationModelError { .. }));
    Ok(())
}

#[tokio::test]
async fn test_missing_url_aborts_without_partial_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = setup(
        &temp_dir,
        "{\"uid\": 1, \"url\": \"https://a.example\"}\n{\"uid\": 2, \"link\": \"https://b.example\"}\n",
    )?;
    let output = config.output.clone();

    let labeler_config = url_labeler::LabelerConfig::builtin()?;
    let labeler = Labeler::new(
        labeler_config.rule_set()?,
        MajorityVoteModel::new(3),
        labeler_config.class_enumeration(),
        labeler_config.tie_break_policy()?,
    )?;
    let pipeline = LabelingPipeline::new(LocalStorage::default(), config, labeler);

    let err = LabelingEngine::new(pipeline).run().await.unwrap_err();

    assert!(matches!(err, LabelError::RuleApplicationError { row: 1, .. }));
    assert!(!std::path::Path::new(&output).exists());
    Ok(())
}
