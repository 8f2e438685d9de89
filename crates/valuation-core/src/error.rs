use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Solver failed: {0}")]
    SolverFailed(String),

    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}
