//! Application-level configuration.
//!
//! - [`DispatchParams`]: fan-out, retry and timeout control

pub mod dispatch_params;

pub use dispatch_params::DispatchParams;
