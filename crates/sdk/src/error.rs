use thiserror::Error;

use crate::provider::ProviderError;

/// Errors surfaced by the SDK.
///
/// Variants are split by remediation: reconnect (`NotBound`), retry the
/// action (`Network`), fix the input (`Validation`), switch or add a chain
/// (`UnsupportedChain`), wait for the pending submission (`WriteInFlight`),
/// or give up (`UserRejected`, `ContractRevert`).
#[derive(Debug, Error)]
pub enum OracleError {
    /// No wallet provider was injected into the session manager.
    #[error("no wallet provider is available")]
    ProviderAbsent,

    /// The user declined the request in their wallet.
    #[error("request rejected by the user")]
    UserRejected,

    /// No binding is active, or the one a result was produced against has
    /// been superseded. Connect (again) and retry.
    #[error("no oracle binding is active")]
    NotBound,

    /// Input failed local validation. Raised before anything leaves the
    /// process, so no fee is ever paid for input that cannot encode.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Wallet transport or RPC failure.
    #[error("network failure: {0}")]
    Network(String),

    /// The contract rejected the call.
    #[error("contract reverted: {0}")]
    ContractRevert(String),

    /// The wallet has no configuration for the requested chain. Offer to
    /// add it rather than retrying the switch.
    #[error("chain {0} is not configured in the wallet")]
    UnsupportedChain(u64),

    /// A submission is already awaiting confirmation. Never queued: a
    /// duplicate fee-bearing write from a repeated trigger is worse than
    /// asking the caller to wait.
    #[error("a submission is already in flight")]
    WriteInFlight,

    /// Anything the classifier could not attribute.
    #[error("{0}")]
    Unknown(String),
}

impl From<ProviderError> for OracleError {
    fn from(err: ProviderError) -> Self {
        // Revert detection runs before the JSON-RPC range check: several
        // providers report reverts with a generic server-error code and
        // only the message tells them apart.
        if err.code == ProviderError::USER_REJECTED {
            OracleError::UserRejected
        } else if err.code == ProviderError::EXECUTION_ERROR
            || err.message.to_lowercase().contains("revert")
        {
            OracleError::ContractRevert(err.message)
        } else if (-32768..=-32000).contains(&err.code) {
            OracleError::Network(err.message)
        } else {
            OracleError::Unknown(format!("provider error {}: {}", err.code, err.message))
        }
    }
}

impl From<alloy::sol_types::Error> for OracleError {
    fn from(err: alloy::sol_types::Error) -> Self {
        OracleError::Unknown(format!("response decoding: {err}"))
    }
}

impl From<serde_json::Error> for OracleError {
    fn from(err: serde_json::Error) -> Self {
        OracleError::Unknown(format!("payload encoding: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_provider_errors() {
        let rejected = ProviderError::new(ProviderError::USER_REJECTED, "denied");
        assert!(matches!(OracleError::from(rejected), OracleError::UserRejected));

        let reverted = ProviderError::new(-32000, "execution reverted: not authorized");
        assert!(matches!(OracleError::from(reverted), OracleError::ContractRevert(_)));

        let transport = ProviderError::new(-32002, "request already pending");
        assert!(matches!(OracleError::from(transport), OracleError::Network(_)));

        let odd = ProviderError::new(4200, "unsupported method");
        assert!(matches!(OracleError::from(odd), OracleError::Unknown(_)));
    }
}
