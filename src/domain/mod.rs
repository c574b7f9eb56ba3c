// Domain layer - Plain data shared by every chart
pub mod error;
pub mod generation;
pub mod hover;
pub mod performance;
pub mod sample;
pub mod viewport;
