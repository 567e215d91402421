pub mod client;
pub mod handlers;
pub mod normalizer;
pub mod payload;
pub mod session;

pub use client::{HttpPredictionClient, PredictionError, PredictionService};
pub use normalizer::{PredictionSet, ResponseShape};
pub use session::SessionStore;
