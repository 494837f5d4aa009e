//! sure-infra core
//!
//! Core library for a declarative provisioning program: resource
//! declarations are recorded in a one-shot context, later declarations
//! reference earlier ones through deferred output values, and an external
//! engine reconciles the declared topology against real infrastructure.

pub mod context;
pub mod deploy;
pub mod engine;
pub mod error;
pub mod graph;
pub mod output;
pub mod resource;
