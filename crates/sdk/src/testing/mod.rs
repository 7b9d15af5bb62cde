//! Scripted wallet double for exercising the SDK without a browser wallet
//! or a node.
//!
//! [`MockProvider`] implements [`crate::provider::WalletProvider`] over
//! in-memory state: canned call responses keyed by function selector,
//! synthesized receipts for accepted transactions and an event feed the
//! test drives by hand.

mod mock;

pub use mock::{MockProvider, RecordedRequest};
