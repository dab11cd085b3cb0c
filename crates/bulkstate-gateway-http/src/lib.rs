//! Transition gateway and catalog over the record service's REST Web API.

pub mod client;
pub mod webapi;

pub use client::*;
