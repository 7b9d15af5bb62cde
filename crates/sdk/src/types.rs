use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};

use crate::{abi::oracle::ValuationOracle, error::OracleError, num};

/// Decoded valuation record, with fixed-point fields rendered back to
/// decimal strings. Fetched on demand, never cached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValuationRecord {
    /// NFT collection contract the token belongs to.
    pub contract_address: Address,
    /// Token inside the collection.
    pub token_id: U256,
    /// Estimated value in native units (18-decimal scale on chain).
    pub estimated_value: String,
    /// Rarity score (2-decimal scale on chain).
    pub rarity_score: String,
    /// Rank inside the collection, 1 is rarest.
    pub rarity_rank: u64,
    /// Submission time, unix seconds.
    pub timestamp: u64,
    /// Account the record was submitted from.
    pub valuator: Address,
    /// Whether the oracle marked the record verified.
    pub is_verified: bool,
    /// Free-text valuation methodology.
    pub methodology: String,
    /// Valuator confidence, percent.
    pub confidence: u8,
}

impl ValuationRecord {
    /// Decodes the on-chain tuple. Returns `None` for the contract's
    /// "nothing recorded" shape, recognized by the zero valuator: a real
    /// submission always stores the sender, which is never zero.
    pub(crate) fn decode(raw: ValuationOracle::Valuation) -> Option<Self> {
        if raw.valuator == Address::ZERO {
            return None;
        }
        let value = num::Converter::new(num::VALUE_DECIMALS);
        let score = num::Converter::new(num::SCORE_DECIMALS);
        Some(Self {
            contract_address: raw.contractAddress,
            token_id: raw.tokenId,
            estimated_value: value.from_unsigned(raw.estimatedValue),
            rarity_score: score.from_unsigned(raw.rarityScore),
            rarity_rank: raw.rarityRank.saturating_to(),
            timestamp: raw.timestamp.saturating_to(),
            valuator: raw.valuator,
            is_verified: raw.isVerified,
            methodology: raw.methodology,
            confidence: raw.confidence.saturating_to(),
        })
    }
}

impl std::fmt::Display for ValuationRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} #{} value:{} score:{} rank:{} by {} @ {}{}]",
            self.contract_address,
            self.token_id,
            self.estimated_value,
            self.rarity_score,
            self.rarity_rank,
            self.valuator,
            format_timestamp(self.timestamp),
            if self.is_verified { " (verified)" } else { "" },
        )
    }
}

/// Aggregates the oracle maintains per collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionStats {
    pub total_supply: u64,
    /// Lowest recorded valuation (18-decimal scale on chain).
    pub floor_price: String,
    pub average_price: String,
    pub total_volume: String,
    pub holder_count: u64,
    /// Last aggregate refresh, unix seconds.
    pub last_updated: u64,
    pub is_active: bool,
}

impl CollectionStats {
    pub(crate) fn decode(raw: ValuationOracle::CollectionStats) -> Self {
        let value = num::Converter::new(num::VALUE_DECIMALS);
        Self {
            total_supply: raw.totalSupply.saturating_to(),
            floor_price: value.from_unsigned(raw.floorPrice),
            average_price: value.from_unsigned(raw.averagePrice),
            total_volume: value.from_unsigned(raw.totalVolume),
            holder_count: raw.holderCount.saturating_to(),
            last_updated: raw.lastUpdated.saturating_to(),
            is_active: raw.isActive,
        }
    }
}

/// Submission fee schedule in native units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fees {
    pub basic: String,
    pub advanced: String,
    pub verification: String,
}

impl Fees {
    pub(crate) fn decode(raw: ValuationOracle::FeeSchedule) -> Self {
        let value = num::Converter::new(num::VALUE_DECIMALS);
        Self {
            basic: value.from_unsigned(raw.basicFee),
            advanced: value.from_unsigned(raw.advancedFee),
            verification: value.from_unsigned(raw.verificationFee),
        }
    }
}

/// Submission input, form-shaped: numeric fields arrive as the strings the
/// user typed and every one of them is validated by the codec before
/// anything leaves the process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValuationRequest {
    pub collection: Address,
    pub token_id: String,
    pub estimated_value: String,
    pub rarity_score: String,
    pub rarity_rank: String,
    pub methodology: String,
    pub confidence: String,
}

impl ValuationRequest {
    /// Validates every numeric field and produces the scaled call.
    pub(crate) fn encode(&self) -> Result<ValuationOracle::submitValuationCall, OracleError> {
        let value = num::Converter::new(num::VALUE_DECIMALS);
        let score = num::Converter::new(num::SCORE_DECIMALS);
        Ok(ValuationOracle::submitValuationCall {
            contractAddress: self.collection,
            tokenId: num::parse_index(&self.token_id)?,
            estimatedValue: value.to_unsigned(&self.estimated_value)?,
            rarityScore: score.to_unsigned(&self.rarity_score)?,
            rarityRank: num::parse_index(&self.rarity_rank)?,
            methodology: self.methodology.clone(),
            confidence: U256::from(num::parse_confidence(&self.confidence)?),
        })
    }
}

fn format_timestamp(timestamp: u64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp as i64, 0)
        .unwrap_or_default()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[cfg(feature = "display")]
impl tabled::Tabled for ValuationRecord {
    const LENGTH: usize = 9;

    fn fields(&self) -> Vec<std::borrow::Cow<'_, str>> {
        use colored::Colorize;

        vec![
            self.token_id.to_string().into(),
            self.estimated_value.clone().into(),
            self.rarity_score.clone().into(),
            self.rarity_rank.to_string().into(),
            format!("{}%", self.confidence).into(),
            self.methodology.clone().into(),
            self.valuator.to_string().into(),
            format_timestamp(self.timestamp).into(),
            if self.is_verified {
                "verified".green().to_string().into()
            } else {
                "unverified".yellow().to_string().into()
            },
        ]
    }

    fn headers() -> Vec<std::borrow::Cow<'static, str>> {
        vec![
            "Token".into(),
            "Value".into(),
            "Score".into(),
            "Rank".into(),
            "Confidence".into(),
            "Methodology".into(),
            "Valuator".into(),
            "Submitted".into(),
            "Status".into(),
        ]
    }
}

#[cfg(feature = "display")]
impl tabled::Tabled for CollectionStats {
    const LENGTH: usize = 7;

    fn fields(&self) -> Vec<std::borrow::Cow<'_, str>> {
        use colored::Colorize;

        vec![
            self.total_supply.to_string().into(),
            self.floor_price.clone().into(),
            self.average_price.clone().into(),
            self.total_volume.clone().into(),
            self.holder_count.to_string().into(),
            format_timestamp(self.last_updated).into(),
            if self.is_active {
                "active".green().to_string().into()
            } else {
                "inactive".red().to_string().into()
            },
        ]
    }

    fn headers() -> Vec<std::borrow::Cow<'static, str>> {
        vec![
            "Supply".into(),
            "Floor".into(),
            "Average".into(),
            "Volume".into(),
            "Holders".into(),
            "Updated".into(),
            "Status".into(),
        ]
    }
}

#[cfg(feature = "display")]
impl tabled::Tabled for Fees {
    const LENGTH: usize = 3;

    fn fields(&self) -> Vec<std::borrow::Cow<'_, str>> {
        vec![self.basic.clone().into(), self.advanced.clone().into(), self.verification.clone().into()]
    }

    fn headers() -> Vec<std::borrow::Cow<'static, str>> {
        vec!["Basic".into(), "Advanced".into(), "Verification".into()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_valuation(valuator: Address) -> ValuationOracle::Valuation {
        ValuationOracle::Valuation {
            contractAddress: Address::repeat_byte(0x11),
            tokenId: U256::from(42u64),
            estimatedValue: U256::from(1_250_000_000_000_000_000u128),
            rarityScore: U256::from(8550u64),
            rarityRank: U256::from(1250u64),
            timestamp: U256::from(1_700_000_000u64),
            valuator,
            isVerified: true,
            methodology: "floor-adjusted".to_string(),
            confidence: U256::from(85u64),
        }
    }

    #[test]
    fn decodes_scaled_fields_to_display_strings() {
        let record = ValuationRecord::decode(raw_valuation(Address::repeat_byte(0xab))).unwrap();
        assert_eq!(record.estimated_value, "1.25");
        assert_eq!(record.rarity_score, "85.5");
        assert_eq!(record.rarity_rank, 1250);
        assert_eq!(record.confidence, 85);
    }

    #[test]
    fn zero_valuator_means_no_record() {
        assert!(ValuationRecord::decode(raw_valuation(Address::ZERO)).is_none());

        // A genuine all-zero record still decodes: the valuator field is the
        // existence sentinel, not the values.
        let mut zeroed = raw_valuation(Address::repeat_byte(0xab));
        zeroed.estimatedValue = U256::ZERO;
        zeroed.rarityScore = U256::ZERO;
        zeroed.rarityRank = U256::ZERO;
        let record = ValuationRecord::decode(zeroed).unwrap();
        assert_eq!(record.estimated_value, "0");
        assert_eq!(record.rarity_rank, 0);
    }

    #[test]
    fn encodes_request_fields_at_contract_scales() {
        let request = ValuationRequest {
            collection: Address::repeat_byte(0x11),
            token_id: "42".to_string(),
            estimated_value: "1.25".to_string(),
            rarity_score: "85.50".to_string(),
            rarity_rank: "1250".to_string(),
            methodology: "floor-adjusted".to_string(),
            confidence: "85".to_string(),
        };
        let call = request.encode().unwrap();
        assert_eq!(call.estimatedValue, U256::from(1_250_000_000_000_000_000u128));
        assert_eq!(call.rarityScore, U256::from(8550u64));
        assert_eq!(call.rarityRank, U256::from(1250u64));
        assert_eq!(call.confidence, U256::from(85u64));

        let bad_score = ValuationRequest { rarity_score: "85.505".to_string(), ..request };
        assert!(matches!(bad_score.encode(), Err(OracleError::Validation(_))));
    }
}
