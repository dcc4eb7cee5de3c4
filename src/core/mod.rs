pub mod aggregation;
pub mod analysis;
pub mod decision;
pub mod engine;
pub mod label_mapper;
pub mod labeler;
pub mod pipeline;
pub mod rules;
pub mod vote_matrix;

pub use crate::domain::model::{LabelResult, Record};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
