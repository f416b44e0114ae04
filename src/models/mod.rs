pub mod branch;
pub mod job;
pub mod loaders;
pub mod record;
pub mod roll_range;

pub use job::HarvestJob;
pub use loaders::load_job;
pub use record::{CourseRow, SemesterKey, StudentIdentity, StudentRecord, NOT_AVAILABLE};
pub use roll_range::{expand_range, RollRange};
