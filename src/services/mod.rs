pub mod advisor;
pub mod comparator;
pub mod config_updater;
pub mod confidence;
pub mod learning;
pub mod parallel_data;
