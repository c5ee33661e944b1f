// Copyright (c) Crowdfund Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::Address;
use crowdfund_ethereum::provider::EthereumClient;

use crate::{contract::ContractClient, error::Error, listener::EventListenerConfig};

/// Where to find the Ethereum node and the contract, plus listener tuning.
/// Usable both programmatically and from a binary embedding the library.
#[derive(Clone, Debug, clap::Args, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    /// The URL of the Ethereum JSON-RPC endpoint.
    #[arg(
        long = "ethereum-endpoint",
        default_value = "http://localhost:8545",
        env = "CROWDFUND_ETHEREUM_ENDPOINT"
    )]
    pub ethereum_endpoint: String,

    /// The address the crowdfunding contract is deployed at.
    #[arg(long = "contract-address", env = "CROWDFUND_CONTRACT_ADDRESS")]
    pub contract_address: Address,

    #[command(flatten)]
    #[serde(default)]
    pub listener: EventListenerConfig,
}

impl DashboardConfig {
    /// Connects to the configured node and wraps the contract behind it.
    pub fn contract_client(&self) -> Result<ContractClient, Error> {
        let client = EthereumClient::new(&self.ethereum_endpoint)?;
        Ok(ContractClient::new(self.contract_address, client))
    }
}
