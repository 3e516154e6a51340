pub mod error;
pub mod lock;
pub mod runner;
pub mod step;
pub mod steps;

pub use error::MigratorError;
pub use lock::AdvisoryLock;
pub use runner::{MigrationReport, MigrationRunner};
pub use step::{Executor, Migration, MigrationStep, StepTiming};
pub use steps::safe_add_column_with_default;
