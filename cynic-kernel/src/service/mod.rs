//! HTTP service: routes, guidance side channel, worker pool

pub mod guidance;
pub mod routes;
pub mod workers;

pub use guidance::{read_guidance, write_guidance, Guidance};
pub use routes::router;
pub use workers::{PersistTask, WorkerPool};
