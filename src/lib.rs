pub mod app;
pub mod environment;
pub mod logging;
pub mod pipeline;
pub mod predictor;
pub mod taxonomy;
