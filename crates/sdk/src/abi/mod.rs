//! Generated bindings for the on-chain valuation oracle.

pub mod oracle;

/// Revision of the oracle contract source these bindings are pinned to.
pub const ORACLE_REVISION: &str = env!("ORACLE_REVISION");
