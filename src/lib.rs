pub mod age;
pub mod config;
pub mod dates;
pub mod model;
pub mod notifier;
pub mod samples;
pub mod storage;
pub mod store;
pub mod tracker;

pub use config::{BackendConfig, TrackerConfig};
pub use dates::StoredDate;
pub use store::{EntityStore, LoadReport, StoreError};
pub use tracker::{Tracker, TrackerError};
