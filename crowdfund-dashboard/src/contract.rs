// Copyright (c) Crowdfund Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Typed binding to the crowdfunding smart contract.
//!
//! The campaign listings come back as six parallel arrays that are zipped
//! positionally into [`CampaignRecord`] values. State-changing calls are
//! submitted from a node-managed account, optionally carrying an exact
//! Ether payment.

use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use crowdfund_base::{
    data_types::{Amount, ArithmeticError},
    identifiers::CampaignId,
};
use crowdfund_ethereum::{
    client::EthereumQueries as _,
    provider::{EthereumClient, HttpProvider},
};
use tracing::debug;

use crate::{error::Error, state::CacheSlice};

/// The flat fee the contract charges for creating a campaign, in Ether.
pub const CAMPAIGN_CREATION_FEE: Amount = Amount::from_millis(20);

mod abi {
    use alloy_sol_types::sol;

    sol! {
        function getowner() external view returns (address);
        function getTotalFeesAccumulated() external view returns (uint256);
        function destroyed() external view returns (bool);
        function bannedEntrepreneurs(address entrepreneur) external view returns (bool);
        function getBackerPledges(uint256 id, address backer) external view returns (uint256);

        function getActiveCampaigns() external view returns (
            uint256[] memory,
            address[] memory,
            string[] memory,
            uint256[] memory,
            uint256[] memory,
            uint256[] memory
        );
        function getCancelledCampaigns() external view returns (
            uint256[] memory,
            address[] memory,
            string[] memory,
            uint256[] memory,
            uint256[] memory,
            uint256[] memory
        );
        function getFulfilledCampaigns() external view returns (
            uint256[] memory,
            address[] memory,
            string[] memory,
            uint256[] memory,
            uint256[] memory,
            uint256[] memory
        );

        function createCampaign(string memory title, uint256 pledgeCost, uint256 pledgesNeeded) external payable;
        function fundCampaign(uint256 id, uint256 quantity) external payable;
        function cancelCampaign(uint256 id) external;
        function fulfillCampaign(uint256 id) external;
        function compensateBacker() external;
        function withdrawFees() external;
        function changeOwner(address newOwner) external;
        function banEntrepreneur(address entrepreneur) external;
        function destroyContract() external;

        event CampaignCreated(uint256 id, address entrepreneur);
        event CampaignFunded(uint256 id, address backer, uint256 quantity);
        event CampaignFulfilled(uint256 id);
        event CampaignCancelled(uint256 id);
        event BackerCompensated(address backer, uint256 amount);
        event ContractDestroyed();
    }
}

/// One row of a campaign listing, before the pledges of the connected
/// account are attached.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CampaignRecord {
    pub id: CampaignId,
    pub entrepreneur: Address,
    pub title: String,
    pub unit_cost: Amount,
    pub pledges_needed: u64,
    pub pledges_sold: u64,
}

/// The kinds of events the contract emits. The dashboard reacts to an event
/// by refreshing cache slices, so the payloads are never decoded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContractEvent {
    CampaignCreated,
    CampaignFunded,
    CampaignFulfilled,
    CampaignCancelled,
    BackerCompensated,
    ContractDestroyed,
}

impl ContractEvent {
    /// All event kinds, in the order their filters are polled.
    pub const ALL: [ContractEvent; 6] = [
        ContractEvent::CampaignCreated,
        ContractEvent::CampaignFunded,
        ContractEvent::CampaignFulfilled,
        ContractEvent::CampaignCancelled,
        ContractEvent::BackerCompensated,
        ContractEvent::ContractDestroyed,
    ];

    /// The Solidity signature this event is filtered by in `eth_getLogs`.
    pub fn signature(self) -> &'static str {
        match self {
            ContractEvent::CampaignCreated => abi::CampaignCreated::SIGNATURE,
            ContractEvent::CampaignFunded => abi::CampaignFunded::SIGNATURE,
            ContractEvent::CampaignFulfilled => abi::CampaignFulfilled::SIGNATURE,
            ContractEvent::CampaignCancelled => abi::CampaignCancelled::SIGNATURE,
            ContractEvent::BackerCompensated => abi::BackerCompensated::SIGNATURE,
            ContractEvent::ContractDestroyed => abi::ContractDestroyed::SIGNATURE,
        }
    }

    /// The cache slices made stale by this event, in refresh order.
    pub fn invalidated_slices(self) -> &'static [CacheSlice] {
        use CacheSlice::*;
        match self {
            ContractEvent::CampaignCreated => &[Aggregate, Active],
            ContractEvent::CampaignFunded => &[Aggregate, Active],
            ContractEvent::CampaignFulfilled => &[Aggregate, Active, Fulfilled],
            ContractEvent::CampaignCancelled => &[Aggregate, Active, Cancelled],
            ContractEvent::BackerCompensated => &[Aggregate, Cancelled],
            ContractEvent::ContractDestroyed => &[Aggregate, Destroyed, Active, Cancelled],
        }
    }
}

/// The reads and writes the view-model performs against the ledger.
///
/// Implemented by [`ContractClient`] in production and by an in-memory mock
/// in unit tests.
#[async_trait]
pub trait LedgerConnection: Send + Sync {
    /// Lists the accounts the node can sign for.
    async fn accounts(&self) -> Result<Vec<Address>, Error>;

    /// The latest block number of the chain.
    async fn latest_block(&self) -> Result<u64, Error>;

    async fn owner(&self) -> Result<Address, Error>;

    /// The Ether balance held by the contract itself.
    async fn contract_balance(&self) -> Result<Amount, Error>;

    async fn collected_fees(&self) -> Result<Amount, Error>;

    async fn is_destroyed(&self) -> Result<bool, Error>;

    async fn is_banned(&self, account: Address) -> Result<bool, Error>;

    async fn active_campaigns(&self) -> Result<Vec<CampaignRecord>, Error>;

    async fn cancelled_campaigns(&self) -> Result<Vec<CampaignRecord>, Error>;

    async fn fulfilled_campaigns(&self) -> Result<Vec<CampaignRecord>, Error>;

    /// How many pledges `backer` holds in the given campaign.
    async fn backer_pledges(&self, id: CampaignId, backer: Address) -> Result<u64, Error>;

    /// Creates a campaign, paying the fixed creation fee.
    async fn create_campaign(
        &self,
        from: Address,
        title: String,
        unit_cost: Amount,
        pledges_needed: u64,
    ) -> Result<(), Error>;

    /// Buys `quantity` pledges, paying `payment` along with the call.
    async fn fund_campaign(
        &self,
        from: Address,
        id: CampaignId,
        quantity: u64,
        payment: Amount,
    ) -> Result<(), Error>;

    async fn cancel_campaign(&self, from: Address, id: CampaignId) -> Result<(), Error>;

    async fn fulfill_campaign(&self, from: Address, id: CampaignId) -> Result<(), Error>;

    /// Claims the refunds for all of the caller's pledges in cancelled
    /// campaigns.
    async fn compensate_backer(&self, from: Address) -> Result<(), Error>;

    async fn withdraw_fees(&self, from: Address) -> Result<(), Error>;

    async fn change_owner(&self, from: Address, new_owner: Address) -> Result<(), Error>;

    async fn ban_entrepreneur(&self, from: Address, entrepreneur: Address) -> Result<(), Error>;

    async fn destroy_contract(&self, from: Address) -> Result<(), Error>;

    /// Reads all contract events from `starting_block` (inclusive), in block
    /// order.
    async fn read_new_events(&self, starting_block: u64)
        -> Result<Vec<(ContractEvent, u64)>, Error>;
}

/// The crowdfunding contract as seen through an Ethereum node.
pub struct ContractClient {
    address: Address,
    client: EthereumClient<HttpProvider>,
}

impl ContractClient {
    pub fn new(address: Address, client: EthereumClient<HttpProvider>) -> Self {
        Self { address, client }
    }

    /// The address the contract is deployed at.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Runs a read-only contract call and decodes its return values.
    async fn call<C>(&self, call: C) -> Result<C::Return, Error>
    where
        C: SolCall + Send + Sync,
        C::Return: Send,
    {
        let data = call.abi_encode().into();
        let response = self
            .client
            .non_executive_call(self.address, data, Address::ZERO)
            .await?;
        Ok(C::abi_decode_returns(&response, true)?)
    }

    /// Submits a state-changing contract call with the given payment and
    /// waits for its inclusion.
    async fn transact<C>(&self, from: Address, call: C, payment: Amount) -> Result<(), Error>
    where
        C: SolCall + Send + Sync,
    {
        let data = call.abi_encode().into();
        let tx_hash = self
            .client
            .execute(self.address, data, from, payment.into())
            .await?;
        debug!(%tx_hash, call = C::SIGNATURE, "transaction included");
        Ok(())
    }
}

fn to_u64(value: U256) -> Result<u64, Error> {
    u64::try_from(value).map_err(|_| Error::Arithmetic(ArithmeticError::Overflow))
}

/// Zips the parallel listing arrays into campaign records. A length mismatch
/// between the arrays is an error, not a truncation.
fn zip_listing(
    ids: Vec<U256>,
    entrepreneurs: Vec<Address>,
    titles: Vec<String>,
    costs: Vec<U256>,
    needed: Vec<U256>,
    sold: Vec<U256>,
) -> Result<Vec<CampaignRecord>, Error> {
    let len = ids.len();
    if entrepreneurs.len() != len
        || titles.len() != len
        || costs.len() != len
        || needed.len() != len
        || sold.len() != len
    {
        return Err(Error::MismatchedListing);
    }
    let mut records = Vec::with_capacity(len);
    for index in 0..len {
        records.push(CampaignRecord {
            id: CampaignId::try_from(ids[index])?,
            entrepreneur: entrepreneurs[index],
            title: titles[index].clone(),
            unit_cost: Amount::try_from(costs[index])?,
            pledges_needed: to_u64(needed[index])?,
            pledges_sold: to_u64(sold[index])?,
        });
    }
    Ok(records)
}

#[async_trait]
impl LedgerConnection for ContractClient {
    async fn accounts(&self) -> Result<Vec<Address>, Error> {
        Ok(self.client.get_accounts().await?)
    }

    async fn latest_block(&self) -> Result<u64, Error> {
        Ok(self.client.get_block_number().await?)
    }

    async fn owner(&self) -> Result<Address, Error> {
        Ok(self.call(abi::getownerCall {}).await?._0)
    }

    async fn contract_balance(&self) -> Result<Amount, Error> {
        let balance = self.client.get_balance(self.address, None).await?;
        Ok(Amount::try_from(balance)?)
    }

    async fn collected_fees(&self) -> Result<Amount, Error> {
        let fees = self.call(abi::getTotalFeesAccumulatedCall {}).await?._0;
        Ok(Amount::try_from(fees)?)
    }

    async fn is_destroyed(&self) -> Result<bool, Error> {
        Ok(self.call(abi::destroyedCall {}).await?._0)
    }

    async fn is_banned(&self, account: Address) -> Result<bool, Error> {
        let banned = self
            .call(abi::bannedEntrepreneursCall {
                entrepreneur: account,
            })
            .await?;
        Ok(banned._0)
    }

    async fn active_campaigns(&self) -> Result<Vec<CampaignRecord>, Error> {
        let listing = self.call(abi::getActiveCampaignsCall {}).await?;
        zip_listing(
            listing._0, listing._1, listing._2, listing._3, listing._4, listing._5,
        )
    }

    async fn cancelled_campaigns(&self) -> Result<Vec<CampaignRecord>, Error> {
        let listing = self.call(abi::getCancelledCampaignsCall {}).await?;
        zip_listing(
            listing._0, listing._1, listing._2, listing._3, listing._4, listing._5,
        )
    }

    async fn fulfilled_campaigns(&self) -> Result<Vec<CampaignRecord>, Error> {
        let listing = self.call(abi::getFulfilledCampaignsCall {}).await?;
        zip_listing(
            listing._0, listing._1, listing._2, listing._3, listing._4, listing._5,
        )
    }

    async fn backer_pledges(&self, id: CampaignId, backer: Address) -> Result<u64, Error> {
        let pledges = self
            .call(abi::getBackerPledgesCall {
                id: id.into(),
                backer,
            })
            .await?;
        to_u64(pledges._0)
    }

    async fn create_campaign(
        &self,
        from: Address,
        title: String,
        unit_cost: Amount,
        pledges_needed: u64,
    ) -> Result<(), Error> {
        let call = abi::createCampaignCall {
            title,
            pledgeCost: unit_cost.into(),
            pledgesNeeded: U256::from(pledges_needed),
        };
        self.transact(from, call, CAMPAIGN_CREATION_FEE).await
    }

    async fn fund_campaign(
        &self,
        from: Address,
        id: CampaignId,
        quantity: u64,
        payment: Amount,
    ) -> Result<(), Error> {
        let call = abi::fundCampaignCall {
            id: id.into(),
            quantity: U256::from(quantity),
        };
        self.transact(from, call, payment).await
    }

    async fn cancel_campaign(&self, from: Address, id: CampaignId) -> Result<(), Error> {
        self.transact(from, abi::cancelCampaignCall { id: id.into() }, Amount::ZERO)
            .await
    }

    async fn fulfill_campaign(&self, from: Address, id: CampaignId) -> Result<(), Error> {
        self.transact(
            from,
            abi::fulfillCampaignCall { id: id.into() },
            Amount::ZERO,
        )
        .await
    }

    async fn compensate_backer(&self, from: Address) -> Result<(), Error> {
        self.transact(from, abi::compensateBackerCall {}, Amount::ZERO)
            .await
    }

    async fn withdraw_fees(&self, from: Address) -> Result<(), Error> {
        self.transact(from, abi::withdrawFeesCall {}, Amount::ZERO)
            .await
    }

    async fn change_owner(&self, from: Address, new_owner: Address) -> Result<(), Error> {
        self.transact(
            from,
            abi::changeOwnerCall {
                newOwner: new_owner,
            },
            Amount::ZERO,
        )
        .await
    }

    async fn ban_entrepreneur(&self, from: Address, entrepreneur: Address) -> Result<(), Error> {
        self.transact(from, abi::banEntrepreneurCall { entrepreneur }, Amount::ZERO)
            .await
    }

    async fn destroy_contract(&self, from: Address) -> Result<(), Error> {
        self.transact(from, abi::destroyContractCall {}, Amount::ZERO)
            .await
    }

    async fn read_new_events(
        &self,
        starting_block: u64,
    ) -> Result<Vec<(ContractEvent, u64)>, Error> {
        let mut notifications = Vec::new();
        for event in ContractEvent::ALL {
            let logs = self
                .client
                .read_events(self.address, event.signature(), starting_block)
                .await?;
            notifications.extend(logs.into_iter().map(|log| (event, log.block_number)));
        }
        notifications.sort_by_key(|(_event, block)| *block);
        Ok(notifications)
    }
}
