pub mod analyzer;
pub mod assembler;
pub mod config;
pub mod growth;
pub mod models;
pub mod monte_carlo;
pub mod projection;
pub mod reverse;
pub mod scenario;
pub mod sensitivity;
pub mod terminal;
pub mod wacc;

pub use analyzer::DcfAnalyzer;
pub use assembler::{price_case, PricingInputs, ValuationEngine};
pub use config::ValuationConfig;
pub use models::*;
