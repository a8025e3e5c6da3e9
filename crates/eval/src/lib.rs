pub mod client;
pub mod config;
pub mod gold;
pub mod harness;
pub mod record;
pub mod recorder;
pub mod retry;
pub mod scoring;
pub mod store;

pub use client::{ReviewClient, ReviewOutcome};
pub use config::EvalConfig;
pub use gold::{GoldExample, load_gold};
pub use harness::RunStatus;
pub use record::EvalResult;
pub use recorder::RunRecorder;
pub use retry::RetryPolicy;
pub use scoring::{ScoreReport, ScoreTally, score_run};
pub use store::{EvalLog, LoadedLog};
