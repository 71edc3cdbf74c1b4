pub mod driver;
pub mod summary;
pub mod workload;

pub use driver::{DEFAULT_MAX_TICKS, Sim};
pub use summary::Summary;
pub use workload::Workload;
