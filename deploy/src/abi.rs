//! Solidity interfaces of the deployed contracts.
#![allow(missing_docs)]
use alloy::sol;
use deployer::Wallet;

sol!(
    #[sol(rpc)]
    contract SVGNFT {
        function create(string memory svg) external;
        function tokenURI(uint256 tokenId) external view returns (string memory);
        function ownerOf(uint256 tokenId) external view returns (address owner);

        #[derive(Debug, PartialEq)]
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
    }
);

sol!(
    #[sol(rpc)]
    contract RandomSVG {
        constructor(address vrfCoordinator, address linkToken, bytes32 keyHash);

        function create() external payable returns (uint256 requestId);
        function fundSubscription(uint256 amount) external;
        function finishMint(uint256 tokenId) external;
        function tokenURI(uint256 tokenId) external view returns (string memory);
        function ownerOf(uint256 tokenId) external view returns (address owner);

        #[derive(Debug, PartialEq)]
        event RequestedSVGNFT(uint256 indexed requestId, uint256 indexed tokenId);

        #[derive(Debug, PartialEq)]
        event CreatedUnfinishedRandomSVG(uint256 indexed tokenId, uint256 randomWord);

        #[derive(Debug, PartialEq)]
        event CreatedRandomSVG(uint256 indexed tokenId, string tokenURI);
    }
);

sol!(
    #[sol(rpc)]
    contract LinkToken {
        function transfer(address to, uint256 value) external returns (bool success);
        function balanceOf(address owner) external view returns (uint256 balance);
    }
);

sol!(
    #[sol(rpc)]
    contract VRFCoordinatorV2Mock {
        constructor(uint96 baseFee, uint96 gasPriceLink);

        function fundSubscription(uint64 subId, uint96 amount) external;
        function fulfillRandomWords(uint256 requestId, address consumer) external;
        function getSubscription(uint64 subId) external view returns (uint96 balance, uint64 reqCount, address owner, address[] memory consumers);

        #[derive(Debug, PartialEq)]
        event SubscriptionCreated(uint64 indexed subId, address owner);

        #[derive(Debug, PartialEq)]
        event SubscriptionFunded(uint64 indexed subId, uint256 oldBalance, uint256 newBalance);

        #[derive(Debug, PartialEq)]
        event RandomWordsFulfilled(uint256 indexed requestId, uint256 outputSeed, uint96 payment, bool success);
    }
);

/// Random SVG NFT bound to a wallet.
pub type RandomSvg = RandomSVG::RandomSVGInstance<Wallet>;

/// Mock VRF coordinator bound to a wallet.
pub type VrfCoordinatorMock =
    VRFCoordinatorV2Mock::VRFCoordinatorV2MockInstance<Wallet>;
