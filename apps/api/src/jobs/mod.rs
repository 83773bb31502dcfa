pub mod normalizer;
pub mod query;
pub mod service;

pub use service::JobService;
