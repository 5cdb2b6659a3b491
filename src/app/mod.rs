// Module declarations
pub mod api;
pub mod index;

// Re-export key functions
pub use api::api_loop;
pub use index::{index_predictions, PredictionIndex, RawPrediction};
