// Copyright (c) Crowdfund Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Identifiers of on-chain entities.

use std::{fmt, fmt::Display, num::ParseIntError, str::FromStr};

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::data_types::ArithmeticError;

/// The sequence number of a campaign on the crowdfunding contract.
///
/// The contract assigns these in creation order, starting at 1. Campaign 0
/// never exists.
#[derive(
    Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Default, Debug, Serialize, Deserialize,
)]
pub struct CampaignId(pub u64);

impl Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CampaignId {
    type Err = ParseIntError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Ok(Self(u64::from_str(src)?))
    }
}

impl From<u64> for CampaignId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<CampaignId> for u64 {
    fn from(value: CampaignId) -> Self {
        value.0
    }
}

impl From<CampaignId> for U256 {
    fn from(value: CampaignId) -> Self {
        U256::from(value.0)
    }
}

impl TryFrom<U256> for CampaignId {
    type Error = ArithmeticError;

    fn try_from(value: U256) -> Result<Self, ArithmeticError> {
        let value = u64::try_from(value).map_err(|_| ArithmeticError::Overflow)?;
        Ok(CampaignId(value))
    }
}
