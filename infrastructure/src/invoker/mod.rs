//! Agent invoker adapters.

mod command;

pub use command::CommandInvoker;
