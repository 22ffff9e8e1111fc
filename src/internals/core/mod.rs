pub mod heater;
pub mod metric_export;
pub mod ports;
pub mod scanner;
pub mod system;
pub mod tabular_export;

#[cfg(test)]
pub mod fakes;
