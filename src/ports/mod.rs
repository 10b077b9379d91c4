//! Port traits (interfaces) for external dependencies.

pub mod config_port;
pub mod data_port;
pub mod order_router;
pub mod report_port;
pub mod trend_port;
