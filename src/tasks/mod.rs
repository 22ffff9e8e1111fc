pub mod sensing;
