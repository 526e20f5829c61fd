//! Agent domain
//!
//! - [`identity::AgentIdentity`]: who is evaluating (validator or provider)
//! - [`result::AgentResult`]: what one agent concluded
//! - [`result::AgentFailure`]: why an agent produced nothing usable

pub mod identity;
pub mod result;
