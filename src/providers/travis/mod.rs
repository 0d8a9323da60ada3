mod client;
mod provider;
pub mod types;

#[cfg(test)]
mod tests;

pub use provider::{DrainSummary, TravisProvider};
pub use types::Build;
