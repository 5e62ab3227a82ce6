//! Core types for the provisioning pipeline: builder, context, and error handling.

pub mod builder;
pub mod context;
pub mod error;

pub use builder::{ProvisionReport, Provisioner, ToolchainBuilder};
pub use context::Context;
pub use error::{Error, InputKind, Result};
