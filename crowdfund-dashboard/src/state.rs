// Copyright (c) Crowdfund Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The locally cached mirror of the contract state.
//!
//! Every value in here is a snapshot of what the contract reported last. The
//! cache is replaced slice by slice on refresh, never patched incrementally,
//! so a failed refresh leaves the previous (stale but coherent) value visible.

use alloy_primitives::Address;
use crowdfund_base::{data_types::Amount, identifiers::CampaignId};
use serde::{Deserialize, Serialize};

/// The wallet-side part of the session.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The account currently connected, if any.
    pub account: Option<Address>,
    /// Whether the connected account is banned from creating campaigns.
    pub is_banned: bool,
    /// Whether the contract has been destroyed.
    pub destroyed: bool,
}

/// Contract-wide values displayed in the dashboard header.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ContractAggregate {
    /// The owner of the contract.
    pub owner: Address,
    /// The Ether balance held by the contract.
    pub balance: Amount,
    /// The fees accumulated by the contract so far.
    pub collected_fees: Amount,
}

/// One campaign as the contract reported it, augmented with the pledges of
/// the connected account.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    /// The identifier assigned by the contract at creation.
    pub id: CampaignId,
    /// The account that created the campaign.
    pub entrepreneur: Address,
    pub title: String,
    /// The price of a single pledge.
    pub unit_cost: Amount,
    /// How many pledges the campaign needs to be fulfillable. Positive.
    pub pledges_needed: u64,
    /// How many pledges have been sold so far.
    pub pledges_sold: u64,
    /// How many pledges the connected account holds; 0 when disconnected.
    pub own_pledges: u64,
}

impl Campaign {
    /// How many pledges are still missing. Never negative, even if the
    /// contract oversold the campaign.
    pub fn pledges_left(&self) -> u64 {
        self.pledges_needed.saturating_sub(self.pledges_sold)
    }

    /// Whether the campaign has sold all the pledges it needs. A complete
    /// campaign can be fulfilled by its entrepreneur or the owner.
    pub fn is_complete(&self) -> bool {
        self.pledges_sold >= self.pledges_needed
    }
}

/// A part of the cache that can be invalidated and refreshed independently.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CacheSlice {
    Aggregate,
    Active,
    Cancelled,
    Fulfilled,
    BanStatus,
    Destroyed,
}

/// The full cached view of the contract.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct DashboardState {
    pub session: Session,
    /// `None` until the first successful aggregate refresh.
    pub aggregate: Option<ContractAggregate>,
    pub active: Vec<Campaign>,
    pub cancelled: Vec<Campaign>,
    pub fulfilled: Vec<Campaign>,
}

impl DashboardState {
    /// Whether the connected account is the contract owner.
    pub fn is_admin(&self) -> bool {
        match (self.session.account, &self.aggregate) {
            (Some(account), Some(aggregate)) => account == aggregate.owner,
            _ => false,
        }
    }

    /// Whether the connected account may create a campaign: connected, not
    /// the owner, not banned, and the contract still alive.
    pub fn can_create(&self) -> bool {
        self.session.account.is_some()
            && !self.is_admin()
            && !self.session.is_banned
            && !self.session.destroyed
    }

    /// Whether the fulfill control is offered for this campaign: only its
    /// entrepreneur and the contract owner see it.
    pub fn shows_fulfill(&self, campaign: &Campaign) -> bool {
        match self.session.account {
            Some(account) => account == campaign.entrepreneur || self.is_admin(),
            None => false,
        }
    }

    /// Whether the cancel control is offered for this campaign. Same rule as
    /// [`Self::shows_fulfill`].
    pub fn shows_cancel(&self, campaign: &Campaign) -> bool {
        self.shows_fulfill(campaign)
    }

    /// Whether the connected account has refundable pledges in cancelled
    /// campaigns.
    pub fn can_claim_refunds(&self) -> bool {
        self.session.account.is_some()
            && self
                .cancelled
                .iter()
                .any(|campaign| campaign.own_pledges > 0)
    }
}
