// Copyright (c) Crowdfund Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy::rpc::json_rpc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EthereumServiceError {
    /// The node returned a log entry without a block number.
    #[error("log entry is missing its block number")]
    MissingBlockNumber,

    /// RPC error
    #[error(transparent)]
    RpcError(#[from] json_rpc::RpcError<alloy::transports::TransportErrorKind>),

    /// Transaction confirmation error
    #[error(transparent)]
    PendingTransactionError(#[from] alloy::providers::PendingTransactionError),

    /// URL parsing error
    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),
}

/// An Ethereum event emitted by a smart contract.
///
/// The dashboard reacts to events by re-querying the contract, so only the
/// position of the log in the chain is retained, not its payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthereumEvent {
    pub block_number: u64,
}
