mod app;
mod batch_config;
mod checkpoint;
pub mod fieldname;
mod route_choice_error;
#[cfg(test)]
mod route_choice_test;
mod table;

pub use app::RouteChoice;
pub use batch_config::BatchConfig;
pub use checkpoint::{CheckpointDataset, CheckpointWriter};
pub use route_choice_error::RouteChoiceError;
pub use table::results_to_batch;
