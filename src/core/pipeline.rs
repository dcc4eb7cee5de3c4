pub use crate::app::pipelines::labeling_pipeline::LabelingPipeline;
