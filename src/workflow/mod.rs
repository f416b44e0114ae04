pub mod fetch_ctx;
pub mod fetch_flow;

pub use fetch_ctx::FetchCtx;
pub use fetch_flow::{AttemptError, FetchFlow, FetchOutcome, FetchPolicy, FetchStage};
