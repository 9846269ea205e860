mod health;
mod instrument;
mod metrics;
mod server;
mod state;
mod status;

pub use health::{healthz, ready};
pub use instrument::{instrument, InstrumentSample};
pub use metrics::metrics;
pub use server::{router, serve};
pub use state::ApiState;
pub use status::status;
