use clap::Parser;
use url_labeler::domain::ports::AggregationModel;
use url_labeler::utils::error::ErrorSeverity;
use url_labeler::utils::{logger, validation::Validate};
use url_labeler::{
    Aggregator, CliConfig, LabelError, Labeler, LabelingEngine, LabelingPipeline, LocalStorage,
    MajorityVoteModel, WeightedVoteModel,
};

fn load_model(config: &CliConfig, cardinality: usize) -> url_labeler::Result<Box<dyn AggregationModel>> {
    match config.aggregator {
        Aggregator::Weighted => {
            let path = config
                .model
                .as_deref()
                .ok_or_else(|| LabelError::MissingConfigError {
                    field: "model".to_string(),
                })?;
            tracing::info!("📦 Loading model from: {}", path);
            Ok(Box::new(WeightedVoteModel::from_file(path)?))
        }
        Aggregator::Majority => {
            tracing::info!("🗳️ Using majority vote baseline");
            Ok(Box::new(MajorityVoteModel::new(cardinality)))
        }
    }
}

async fn run(config: CliConfig) -> url_labeler::Result<String> {
    let labeler_config = config.labeler_config()?;
    let classes = labeler_config.class_enumeration();
    let rules = labeler_config.rule_set()?;
    let policy = labeler_config.tie_break_policy()?;
    tracing::info!(
        "✅ {} rules, {} classes, tie-break label: {}",
        rules.len(),
        classes.len(),
        classes.name_of(policy.tie_break_class)
    );

    let model = load_model(&config, classes.len())?;
    let labeler = Labeler::new(rules, model, classes, policy)?
        .with_strict_distributions(labeler_config.labeler.strict_distributions);

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = LabelingPipeline::new(LocalStorage::default(), config, labeler);
    let engine = LabelingEngine::new_with_monitoring(pipeline, monitor_enabled);
    engine.run().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting url-labeler");
    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match run(config).await {
        Ok(output_path) => {
            tracing::info!("✅ Labeling completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Labeling failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 依嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
