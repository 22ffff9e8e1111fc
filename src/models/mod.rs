pub mod record;
pub mod time_series;
