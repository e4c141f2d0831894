//! Cross-module scenarios exercised through [`cl_execution::service`].


pub mod accounts;
pub mod assets;
pub mod determinism;
pub mod transfer;
pub mod workflow;
