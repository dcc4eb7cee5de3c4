pub mod labeling_pipeline;
