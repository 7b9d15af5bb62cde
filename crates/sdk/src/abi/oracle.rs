//! `ValuationOracle` contract surface.
//!
//! Calls are ABI-encoded with these types and routed through the injected
//! [`crate::provider::WalletProvider`]; no RPC instance is generated.
//! Value fields are fixed-point integers: 18 decimals for native-token
//! amounts, 2 for rarity scores. [`crate::num`] owns the scaling.

alloy::sol! {
    #[derive(Debug, PartialEq, Eq)]
    contract ValuationOracle {
        /// One recorded valuation. `valuator` is always the submitting
        /// sender, so the all-zero tuple the contract returns for an
        /// unknown token is recognizable by its zero valuator.
        struct Valuation {
            address contractAddress;
            uint256 tokenId;
            uint256 estimatedValue;
            uint256 rarityScore;
            uint256 rarityRank;
            uint256 timestamp;
            address valuator;
            bool isVerified;
            string methodology;
            uint256 confidence;
        }

        /// Aggregates the oracle maintains per collection.
        struct CollectionStats {
            uint256 totalSupply;
            uint256 floorPrice;
            uint256 averagePrice;
            uint256 totalVolume;
            uint256 holderCount;
            uint256 lastUpdated;
            bool isActive;
        }

        struct FeeSchedule {
            uint256 basicFee;
            uint256 advancedFee;
            uint256 verificationFee;
        }

        function submitValuation(
            address contractAddress,
            uint256 tokenId,
            uint256 estimatedValue,
            uint256 rarityScore,
            uint256 rarityRank,
            string memory methodology,
            uint256 confidence
        ) external payable;

        function getCurrentValuation(address contractAddress, uint256 tokenId)
            external view returns (Valuation memory);

        function getValuationHistory(address contractAddress, uint256 tokenId)
            external view returns (Valuation[] memory);

        function getCollectionStats(address contractAddress)
            external view returns (CollectionStats memory);

        function isAuthorizedValuator(address valuator) external view returns (bool);

        function getTotalValuations() external view returns (uint256);

        function getValuatorReputation(address valuator) external view returns (uint256);

        function fees() external view returns (FeeSchedule memory);

        event ValuationSubmitted(
            bytes32 indexed valuationId,
            address indexed contractAddress,
            uint256 indexed tokenId,
            uint256 estimatedValue,
            uint256 rarityScore,
            address valuator,
            uint256 confidence
        );
    }
}
