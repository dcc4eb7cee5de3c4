pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{Aggregator, CliConfig};

pub use config::{cli::LocalStorage, toml_config::LabelerConfig};
pub use core::{
    aggregation::{MajorityVoteModel, WeightedVoteModel},
    decision::TieBreakPolicy,
    engine::LabelingEngine,
    label_mapper::ClassEnumeration,
    labeler::Labeler,
    pipeline::LabelingPipeline,
    rules::RuleSet,
};
pub use domain::model::{Decision, LabeledRecord, Record, Vote, VoteMatrix};
pub use domain::ports::{AggregationModel, LabelingRule};
pub use utils::error::{LabelError, Result};
