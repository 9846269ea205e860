pub mod advisor;
pub mod alert;
pub mod api;
pub mod audit;
pub mod benchmark;
pub mod cli;
pub mod collector;
pub mod config;
pub mod context;
pub mod health;
pub mod locks;
pub mod metrics;
pub mod monitor;
pub mod notifier;
pub mod probe;
pub mod run;
pub mod scheduler;
pub mod shutdown;
pub mod store;
pub mod testing;

pub use context::Context;
pub use monitor::{Monitor, MonitorHandle, Settings, TickReport};
