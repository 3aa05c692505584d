//! Adaptive difficulty core: struggle estimation (IRT), difficulty
//! adjustment (DDA) and skill clustering for matchmaking.

pub mod config;
pub mod dda;
pub mod directory;
pub mod error;
pub mod irt;
pub mod kmeans;
pub mod metrics;
pub mod orchestrator;
pub mod trend;
pub mod types;
