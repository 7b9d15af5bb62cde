use std::{pin::pin, sync::Arc, time::Duration};

use alloy::primitives::{Address, TxKind, U256};
use alloy_sol_types::SolCall;
use carat_sdk::{
    Chain, ORACLE_ADDRESS, SUBMISSION_FEE,
    abi::oracle::ValuationOracle,
    client::OracleClient,
    error::OracleError,
    provider::ProviderError,
    testing::MockProvider,
    types::ValuationRequest,
};
use futures::poll;

const COLLECTION: Address = Address::repeat_byte(0x11);

fn client_with(provider: &Arc<MockProvider>) -> OracleClient {
    OracleClient::new(Chain::mainnet(), Some(provider.clone() as _))
        .with_receipt_interval(Duration::from_millis(10))
}

async fn connected(provider: &Arc<MockProvider>) -> OracleClient {
    let client = client_with(provider);
    client.initialize().await.unwrap();
    client.connect().await.unwrap();
    client
}

fn valuation_request() -> ValuationRequest {
    ValuationRequest {
        collection: COLLECTION,
        token_id: "42".to_string(),
        estimated_value: "1.25".to_string(),
        rarity_score: "85.50".to_string(),
        rarity_rank: "1250".to_string(),
        methodology: "floor-adjusted comparables".to_string(),
        confidence: "85".to_string(),
    }
}

fn recorded_valuation() -> ValuationOracle::Valuation {
    ValuationOracle::Valuation {
        contractAddress: COLLECTION,
        tokenId: U256::from(42u64),
        estimatedValue: U256::from(1_250_000_000_000_000_000u128),
        rarityScore: U256::from(8550u64),
        rarityRank: U256::from(1250u64),
        timestamp: U256::from(1_700_000_000u64),
        valuator: MockProvider::DEFAULT_ACCOUNT,
        isVerified: true,
        methodology: "floor-adjusted comparables".to_string(),
        confidence: U256::from(85u64),
    }
}

fn empty_valuation() -> ValuationOracle::Valuation {
    ValuationOracle::Valuation {
        contractAddress: Address::ZERO,
        tokenId: U256::ZERO,
        estimatedValue: U256::ZERO,
        rarityScore: U256::ZERO,
        rarityRank: U256::ZERO,
        timestamp: U256::ZERO,
        valuator: Address::ZERO,
        isVerified: false,
        methodology: String::new(),
        confidence: U256::ZERO,
    }
}

/// Tests that a submission goes out with scaled fields, the fixed fee and
/// the bound signer.
#[tokio::test]
async fn submit_sends_scaled_calldata_with_fee() {
    let provider = Arc::new(MockProvider::new());
    let client = connected(&provider).await;

    let hash = client.submit_valuation(&valuation_request(), tokio::time::sleep).await.unwrap();

    let (sent_hash, tx) = provider.sent_transactions().pop().unwrap();
    assert_eq!(sent_hash, hash);
    assert_eq!(tx.from, Some(MockProvider::DEFAULT_ACCOUNT));
    assert_eq!(tx.to, Some(TxKind::Call(ORACLE_ADDRESS)));
    assert_eq!(tx.value, Some(SUBMISSION_FEE));

    let call = ValuationOracle::submitValuationCall::abi_decode(tx.input.input().unwrap()).unwrap();
    assert_eq!(call.contractAddress, COLLECTION);
    assert_eq!(call.tokenId, U256::from(42u64));
    assert_eq!(call.estimatedValue, U256::from(1_250_000_000_000_000_000u128));
    assert_eq!(call.rarityScore, U256::from(8550u64));
    assert_eq!(call.rarityRank, U256::from(1250u64));
    assert_eq!(call.methodology, "floor-adjusted comparables");
    assert_eq!(call.confidence, U256::from(85u64));
}

#[tokio::test]
async fn invalid_input_fails_before_any_traffic() {
    let provider = Arc::new(MockProvider::new());
    let client = connected(&provider).await;
    let before = provider.requests().len();

    let bad = ValuationRequest { estimated_value: "1.2.3".to_string(), ..valuation_request() };
    assert!(matches!(
        client.submit_valuation(&bad, tokio::time::sleep).await,
        Err(OracleError::Validation(_))
    ));

    assert_eq!(provider.requests().len(), before);
    assert!(provider.sent_transactions().is_empty());
    assert!(!client.loading());
}

#[tokio::test]
async fn a_second_write_is_rejected_while_one_is_pending() {
    let provider = Arc::new(MockProvider::new().with_held_receipts());
    let client = connected(&provider).await;
    let request = valuation_request();

    let mut first = pin!(client.submit_valuation(&request, tokio::time::sleep));
    // Drive the submission into its receipt loop.
    assert!(poll!(&mut first).is_pending());
    assert!(client.loading());

    assert!(matches!(
        client.submit_valuation(&request, tokio::time::sleep).await,
        Err(OracleError::WriteInFlight)
    ));

    provider.release_receipts();
    let hash = first.await.unwrap();
    assert!(!client.loading());

    // The gate reopened once the first write settled.
    let again = client.submit_valuation(&request, tokio::time::sleep).await.unwrap();
    assert_ne!(again, hash);
}

#[tokio::test]
async fn reads_pass_while_a_write_is_pending() {
    let provider = Arc::new(MockProvider::new().with_held_receipts());
    let client = connected(&provider).await;
    provider.respond::<ValuationOracle::getCollectionStatsCall>(&ValuationOracle::CollectionStats {
        totalSupply: U256::from(10_000u64),
        floorPrice: U256::from(800_000_000_000_000_000u128),
        averagePrice: U256::from(1_500_000_000_000_000_000u128),
        totalVolume: U256::from(250_000_000_000_000_000_000u128),
        holderCount: U256::from(3_500u64),
        lastUpdated: U256::from(1_700_000_000u64),
        isActive: true,
    });

    let request = valuation_request();
    let mut submit = pin!(client.submit_valuation(&request, tokio::time::sleep));
    assert!(poll!(&mut submit).is_pending());

    let stats = client.collection_stats(COLLECTION).await.unwrap();
    assert_eq!(stats.floor_price, "0.8");
    assert_eq!(stats.average_price, "1.5");
    assert_eq!(stats.total_volume, "250");
    assert!(stats.is_active);
    assert!(client.loading());

    provider.release_receipts();
    submit.await.unwrap();
}

#[tokio::test]
async fn reverted_submission_is_classified_as_contract_revert() {
    let provider = Arc::new(MockProvider::new().with_failed_submissions());
    let client = connected(&provider).await;

    let err =
        client.submit_valuation(&valuation_request(), tokio::time::sleep).await.unwrap_err();
    assert!(matches!(err, OracleError::ContractRevert(_)));
    assert!(!client.loading());
}

#[tokio::test]
async fn confirmed_write_is_reported_after_a_signer_change() {
    let provider = Arc::new(MockProvider::new().with_held_receipts());
    let client = connected(&provider).await;

    let request = valuation_request();
    let mut submit = pin!(client.submit_valuation(&request, tokio::time::sleep));
    assert!(poll!(&mut submit).is_pending());

    provider.change_accounts(vec![Address::repeat_byte(0xcd)]);
    assert_eq!(client.process_pending_events(), 1);

    provider.release_receipts();
    // The transaction is on-chain; the signer change cannot unrecord it.
    let hash = submit.await.unwrap();
    assert_eq!(provider.sent_transactions()[0].0, hash);
}

#[tokio::test]
async fn absent_valuation_reads_as_none() {
    let provider = Arc::new(MockProvider::new());
    let client = connected(&provider).await;

    provider.respond::<ValuationOracle::getCurrentValuationCall>(&empty_valuation());
    assert_eq!(client.current_valuation(COLLECTION, U256::from(42u64)).await.unwrap(), None);

    provider.respond::<ValuationOracle::getCurrentValuationCall>(&recorded_valuation());
    let record =
        client.current_valuation(COLLECTION, U256::from(42u64)).await.unwrap().unwrap();
    assert_eq!(record.estimated_value, "1.25");
    assert_eq!(record.rarity_score, "85.5");
    assert_eq!(record.valuator, MockProvider::DEFAULT_ACCOUNT);
    assert!(record.is_verified);
}

#[tokio::test]
async fn reads_from_a_superseded_binding_are_discarded() {
    let provider = Arc::new(MockProvider::new());
    let client = connected(&provider).await;
    provider.respond::<ValuationOracle::getTotalValuationsCall>(&U256::from(9u64));

    let gate = provider.gate_call::<ValuationOracle::getTotalValuationsCall>();
    let mut read = pin!(client.total_valuations());
    assert!(poll!(&mut read).is_pending());

    // The signer changes while the read is parked on the wire.
    provider.change_accounts(vec![Address::repeat_byte(0xcd)]);
    assert_eq!(client.process_pending_events(), 1);

    gate.send(()).unwrap();
    assert!(matches!(read.await, Err(OracleError::NotBound)));

    // A fresh read through the rebuilt binding sees the same answer.
    assert_eq!(client.total_valuations().await.unwrap(), 9);
}

#[tokio::test]
async fn provider_errors_classify_by_code() {
    let provider = Arc::new(MockProvider::new());
    let client = connected(&provider).await;

    provider.respond_error::<ValuationOracle::getTotalValuationsCall>(ProviderError::new(
        ProviderError::EXECUTION_ERROR,
        "execution reverted: not authorized",
    ));
    assert!(matches!(client.total_valuations().await, Err(OracleError::ContractRevert(_))));

    provider.respond_error::<ValuationOracle::getTotalValuationsCall>(ProviderError::new(
        -32005,
        "rate limited",
    ));
    assert!(matches!(client.total_valuations().await, Err(OracleError::Network(_))));
}

#[tokio::test]
async fn read_surface_decodes_contract_shapes() {
    let provider = Arc::new(MockProvider::new());
    let client = connected(&provider).await;

    let mut older = recorded_valuation();
    older.estimatedValue = U256::from(900_000_000_000_000_000u128);
    older.timestamp = U256::from(1_690_000_000u64);
    provider
        .respond::<ValuationOracle::getValuationHistoryCall>(&vec![older, recorded_valuation()]);
    let history = client.valuation_history(COLLECTION, U256::from(42u64)).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].estimated_value, "0.9");
    assert_eq!(history[1].estimated_value, "1.25");

    provider.respond::<ValuationOracle::isAuthorizedValuatorCall>(&true);
    assert!(client.is_authorized_valuator(MockProvider::DEFAULT_ACCOUNT).await.unwrap());

    provider.respond::<ValuationOracle::getValuatorReputationCall>(&U256::from(88u64));
    assert_eq!(client.valuator_reputation(MockProvider::DEFAULT_ACCOUNT).await.unwrap(), 88);

    provider.respond::<ValuationOracle::feesCall>(&ValuationOracle::FeeSchedule {
        basicFee: U256::from(1_000_000_000_000_000u64),
        advancedFee: U256::from(5_000_000_000_000_000u64),
        verificationFee: U256::from(10_000_000_000_000_000u64),
    });
    let fees = client.fees().await.unwrap();
    assert_eq!(fees.basic, "0.001");
    assert_eq!(fees.advanced, "0.005");
    assert_eq!(fees.verification, "0.01");
}
