// Copyright (c) Crowdfund Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy::{
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::eth::{
        request::{TransactionInput, TransactionRequest},
        Filter,
    },
    transports::http::{Client, Http},
};
use alloy_primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use url::Url;

use crate::{
    client::{get_block_id, EthereumQueries},
    common::{EthereumEvent, EthereumServiceError},
};

pub type HttpProvider = RootProvider<Http<Client>>;

/// The Ethereum endpoint and its provider used for accessing the Ethereum node.
pub struct EthereumClient<M> {
    pub provider: M,
}

#[async_trait]
impl EthereumQueries for EthereumClient<HttpProvider> {
    type Error = EthereumServiceError;

    async fn get_accounts(&self) -> Result<Vec<Address>, EthereumServiceError> {
        Ok(self.provider.get_accounts().await?)
    }

    async fn get_block_number(&self) -> Result<u64, EthereumServiceError> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn get_balance(
        &self,
        address: Address,
        block_number: Option<u64>,
    ) -> Result<U256, EthereumServiceError> {
        let block_id = get_block_id(block_number);
        Ok(self.provider.get_balance(address).block_id(block_id).await?)
    }

    async fn read_events(
        &self,
        contract_address: Address,
        event_signature: &str,
        starting_block: u64,
    ) -> Result<Vec<EthereumEvent>, EthereumServiceError> {
        let filter = Filter::new()
            .address(contract_address)
            .event(event_signature)
            .from_block(starting_block);
        let logs = self.provider.get_logs(&filter).await?;
        logs.into_iter()
            .map(|log| {
                let block_number = log
                    .block_number
                    .ok_or(EthereumServiceError::MissingBlockNumber)?;
                Ok(EthereumEvent { block_number })
            })
            .collect()
    }

    async fn non_executive_call(
        &self,
        contract_address: Address,
        data: Bytes,
        from: Address,
    ) -> Result<Bytes, EthereumServiceError> {
        let input = TransactionInput::new(data);
        let tx = TransactionRequest::default()
            .from(from)
            .to(contract_address)
            .input(input);
        Ok(self.provider.call(&tx).await?)
    }

    async fn execute(
        &self,
        contract_address: Address,
        data: Bytes,
        from: Address,
        value: U256,
    ) -> Result<TxHash, EthereumServiceError> {
        let input = TransactionInput::new(data);
        let tx = TransactionRequest::default()
            .from(from)
            .to(contract_address)
            .input(input)
            .value(value);
        let tx_hash = self.provider.send_transaction(tx).await?.watch().await?;
        Ok(tx_hash)
    }
}

impl EthereumClient<HttpProvider> {
    /// Connects to an existing Ethereum node and creates an `EthereumClient`
    /// if successful.
    pub fn new(url: &str) -> Result<Self, EthereumServiceError> {
        let rpc_url = Url::parse(url)?;
        let provider = ProviderBuilder::new().on_http(rpc_url);
        Ok(Self { provider })
    }
}
