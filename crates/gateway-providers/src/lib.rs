//! # Gateway Providers
//!
//! Upstream provider access for the AI Gateway.
//!
//! Every provider speaks the OpenAI chat completions protocol, so a single
//! [`ProviderClient`] covers them all. The execution engine obtains clients
//! through the [`ProviderFactory`] seam, which tests replace with scripted
//! fakes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod factory;
pub mod traits;

pub use client::ProviderClient;
pub use factory::HttpProviderFactory;
pub use traits::{ChatProvider, ProviderFactory};
