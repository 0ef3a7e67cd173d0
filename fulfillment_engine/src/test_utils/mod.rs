//! Helpers for tests, in this crate and downstream: throwaway databases and a stub messaging provider.
#[cfg(feature = "sqlite")]
pub mod prepare_env;
mod stub_messenger;

pub use stub_messenger::{SentMessage, StubMessenger};
