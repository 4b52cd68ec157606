pub mod configuration;
pub mod controller;
pub mod data_capture;
pub mod error_handling;
pub mod reporting;
pub mod storage;
