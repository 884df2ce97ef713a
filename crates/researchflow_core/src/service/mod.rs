//! Use-case services over the model, command and store layers.

pub mod consistency;
pub mod session;
