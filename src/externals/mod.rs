pub mod cloud_monitoring;
pub mod hardware;
pub mod tabular_log;
