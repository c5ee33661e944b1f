// Copyright (c) Crowdfund Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The queries the dashboard sends to an Ethereum node.

use alloy::rpc::types::eth::BlockId;
use alloy_primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;

use crate::common::EthereumEvent;

/// Converts an optional block number into the [`BlockId`] of the balance query.
pub fn get_block_id(block_number: Option<u64>) -> BlockId {
    match block_number {
        None => BlockId::latest(),
        Some(number) => BlockId::number(number),
    }
}

/// The basic Ethereum queries that can be used from the dashboard.
#[async_trait]
pub trait EthereumQueries {
    type Error;

    /// Lists the accounts managed by the node.
    async fn get_accounts(&self) -> Result<Vec<Address>, Self::Error>;

    /// Gets the latest block number of the chain.
    async fn get_block_number(&self) -> Result<u64, Self::Error>;

    /// Gets the balance of the specified address at the specified block number.
    /// If no block number is specified then the balance of the latest block is
    /// returned.
    async fn get_balance(
        &self,
        address: Address,
        block_number: Option<u64>,
    ) -> Result<U256, Self::Error>;

    /// Reads the events of the smart contract with the given signature, such as
    /// `"CampaignCreated(uint256,address)"`, starting at `starting_block`
    /// (inclusive).
    async fn read_events(
        &self,
        contract_address: Address,
        event_signature: &str,
        starting_block: u64,
    ) -> Result<Vec<EthereumEvent>, Self::Error>;

    /// The operation done with `eth_call`. This does not change the state of the
    /// blockchain.
    async fn non_executive_call(
        &self,
        contract_address: Address,
        data: Bytes,
        from: Address,
    ) -> Result<Bytes, Self::Error>;

    /// Submits a state-changing transaction from one of the node's accounts and
    /// waits for its inclusion in a block. `value` is the payment attached to
    /// the call, in wei.
    async fn execute(
        &self,
        contract_address: Address,
        data: Bytes,
        from: Address,
        value: U256,
    ) -> Result<TxHash, Self::Error>;
}
