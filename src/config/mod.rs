pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use args::{Aggregator, CliConfig};

#[cfg(feature = "cli")]
mod args {
    use crate::config::toml_config::{ClassRef, LabelerConfig};
    use crate::core::ConfigProvider;
    use crate::domain::ports::OutputFormat;
    use crate::utils::error::{LabelError, Result};
    use crate::utils::validation::{validate_file_extension, validate_path, Validate};
    use clap::{Parser, ValueEnum};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    pub enum Aggregator {
        /// Pre-trained weighted vote model loaded from --model
        Weighted,
        /// Untrained majority vote baseline
        Majority,
    }

    #[derive(Debug, Clone, Parser)]
    #[command(name = "url-labeler")]
    #[command(about = "Label URLs as Benign, Malicious or Adult by aggregating heuristic rules")]
    pub struct CliConfig {
        /// Path to the JSONL file with `uid` and `url` fields
        #[arg(short, long)]
        pub input: String,

        /// Path to the trained model artifact (JSON)
        #[arg(short, long)]
        pub model: Option<String>,

        /// Path to save the predictions
        #[arg(short, long)]
        pub output: String,

        /// Labeler TOML configuration (classes, rules, tie-break)
        #[arg(short, long)]
        pub config: Option<String>,

        #[arg(long, value_enum, default_value = "weighted")]
        pub aggregator: Aggregator,

        /// Class id or name emitted on a probability tie
        #[arg(long)]
        pub tie_break_label: Option<ClassRef>,

        /// Absolute tolerance for tie detection (exact equality when unset)
        #[arg(long)]
        pub tie_tolerance: Option<f64>,

        #[arg(long, value_enum, default_value = "jsonl")]
        pub format: OutputFormat,

        /// Write a JSON run summary (label counts, rule coverage)
        #[arg(long)]
        pub summary: Option<String>,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Log process CPU and memory per phase")]
        pub monitor: bool,

        #[arg(long, help = "Emit logs as JSON")]
        pub json_logs: bool,
    }

    impl CliConfig {
        /// 載入 TOML 設定並套用命令列覆蓋
        pub fn labeler_config(&self) -> Result<LabelerConfig> {
            let mut config = match &self.config {
                Some(path) => LabelerConfig::from_file(path)?,
                None => LabelerConfig::builtin()?,
            };

            if let Some(label) = &self.tie_break_label {
                tracing::info!("🔧 Tie-break label overridden to: {}", label);
                config.labeler.tie_break_label = label.clone();
            }
            if let Some(tolerance) = self.tie_tolerance {
                tracing::info!("🔧 Tie tolerance overridden to: {}", tolerance);
                config.labeler.tie_tolerance = Some(tolerance);
            }

            config.validate()?;
            Ok(config)
        }
    }

    impl ConfigProvider for CliConfig {
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
            self.summary.as_deref()
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_path("input", &self.input)?;
            validate_file_extension("input", &self.input, &["jsonl", "json", "ndjson"])?;
            validate_path("output", &self.output)?;

            if self.input == self.output {
                return Err(LabelError::InvalidConfigValueError {
                    field: "output".to_string(),
                    value: self.output.clone(),
                    reason: "Output must not overwrite the input file".to_string(),
                });
            }

            if let Some(summary) = &self.summary {
                validate_path("summary", summary)?;
            }
            if let Some(config) = &self.config {
                validate_path("config", config)?;
            }

            match self.aggregator {
                Aggregator::Weighted => {
                    let model = crate::utils::validation::validate_required_field("model", &self.model)?;
                    validate_file_extension("model", model, &["json"])?;
                }
                Aggregator::Majority => {
                    if self.model.is_some() {
                        tracing::warn!("--model is ignored with --aggregator majority");
                    }
                }
            }

            Ok(())
        }
    }

}
