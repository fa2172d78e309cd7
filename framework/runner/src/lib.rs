mod backend;
mod cli;
mod config;
mod corpus;
mod executor;
mod progress;
mod run_executor;
mod scheduler;
mod shutdown;

pub mod prelude {
    pub use crate::backend::{ClusterBackend, HttpBackend};
    pub use crate::cli::SweepArgs;
    pub use crate::config::{load_config, BenchConfig, SweepSettings};
    pub use crate::corpus::{load_queries, QuerySpec};
    pub use crate::executor::Executor;
    pub use crate::run_executor::RunExecutor;
    pub use crate::scheduler::{run_sweep, SweepOptions, SweepOutcome, SweepStatus};
}
