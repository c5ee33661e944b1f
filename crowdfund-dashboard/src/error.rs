// Copyright (c) Crowdfund Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crowdfund_base::{data_types::ArithmeticError, identifiers::CampaignId};
use crowdfund_ethereum::common::EthereumServiceError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Ethereum node error: {0}")]
    Ethereum(#[from] EthereumServiceError),
    #[error("ABI decoding error: {0}")]
    AbiDecode(#[from] alloy_sol_types::Error),
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
    #[error("the campaign listing arrays have mismatched lengths")]
    MismatchedListing,
    #[error("no account is connected")]
    NoConnectedAccount,
    #[error("no campaign with id {0} in the active collection")]
    UnknownCampaign(CampaignId),
}
