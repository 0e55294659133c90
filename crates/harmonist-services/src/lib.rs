//! harmonist-services: frame driver thread and configuration files

pub mod config;
pub mod frame_driver;

pub use config::{config_path, load_config, read_config, save_config, ConfigError, HarmonistConfig};
pub use frame_driver::{DriverError, DriverStats, FrameDriver, SUBSCRIBER_CAPACITY};
