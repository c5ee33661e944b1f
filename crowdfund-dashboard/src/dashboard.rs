// Copyright (c) Crowdfund Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The view-model mirroring the crowdfunding contract.
//!
//! All operations take `&mut self`, so refreshes are serialized by ownership:
//! an event-triggered refresh can never interleave with an action-triggered
//! one. The only concurrency within a refresh is the per-campaign own-pledge
//! fan-out, which is joined before the slice is replaced.

use alloy_primitives::Address;
use crowdfund_base::{data_types::Amount, identifiers::CampaignId};
use futures::future::try_join_all;
use tracing::warn;

use crate::{
    contract::{CampaignRecord, ContractEvent, LedgerConnection},
    error::Error,
    state::{CacheSlice, Campaign, ContractAggregate, DashboardState},
};

/// The dashboard view-model: a cached [`DashboardState`] together with the
/// connection used to refresh it.
pub struct Dashboard<C> {
    connection: C,
    state: DashboardState,
}

impl<C> Dashboard<C> {
    pub fn new(connection: C) -> Self {
        Self {
            connection,
            state: DashboardState::default(),
        }
    }

    /// The current cached view.
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }
}

impl<C: LedgerConnection> Dashboard<C> {
    /// Loads the whole cache, best-effort: each step's failure is logged and
    /// initialization continues, so a partially reachable node still yields a
    /// partially filled dashboard.
    pub async fn initialize(&mut self) {
        match self.connection.accounts().await {
            Ok(accounts) => self.state.session.account = accounts.first().copied(),
            Err(error) => warn!(%error, "failed to list the node's accounts"),
        }
        for slice in [
            CacheSlice::Aggregate,
            CacheSlice::Active,
            CacheSlice::Fulfilled,
            CacheSlice::Cancelled,
            CacheSlice::BanStatus,
            CacheSlice::Destroyed,
        ] {
            if let Err(error) = self.refresh_slice(slice).await {
                warn!(%error, ?slice, "failed to load a cache slice");
            }
        }
    }

    /// Re-fetches the contract owner, balance and accumulated fees, replacing
    /// the aggregate wholesale.
    pub async fn refresh_aggregate(&mut self) -> Result<(), Error> {
        let (owner, balance, collected_fees) = futures::try_join!(
            self.connection.owner(),
            self.connection.contract_balance(),
            self.connection.collected_fees(),
        )?;
        self.state.aggregate = Some(ContractAggregate {
            owner,
            balance,
            collected_fees,
        });
        Ok(())
    }

    /// Re-fetches the active campaigns. On failure the previous collection
    /// stays in place.
    pub async fn refresh_active(&mut self) -> Result<(), Error> {
        let records = self.connection.active_campaigns().await?;
        self.state.active = self.with_own_pledges(records).await?;
        Ok(())
    }

    /// Re-fetches the cancelled campaigns.
    pub async fn refresh_cancelled(&mut self) -> Result<(), Error> {
        let records = self.connection.cancelled_campaigns().await?;
        self.state.cancelled = self.with_own_pledges(records).await?;
        Ok(())
    }

    /// Re-fetches the fulfilled campaigns.
    pub async fn refresh_fulfilled(&mut self) -> Result<(), Error> {
        let records = self.connection.fulfilled_campaigns().await?;
        self.state.fulfilled = self.with_own_pledges(records).await?;
        Ok(())
    }

    /// Re-fetches whether the connected account is banned. A disconnected
    /// session is never banned.
    pub async fn refresh_ban_status(&mut self) -> Result<(), Error> {
        self.state.session.is_banned = match self.state.session.account {
            Some(account) => self.connection.is_banned(account).await?,
            None => false,
        };
        Ok(())
    }

    /// Re-fetches the destroyed flag. A destroyed contract has no active
    /// campaigns left.
    pub async fn refresh_destroyed(&mut self) -> Result<(), Error> {
        let destroyed = self.connection.is_destroyed().await?;
        self.state.session.destroyed = destroyed;
        if destroyed {
            self.state.active.clear();
        }
        Ok(())
    }

    async fn refresh_slice(&mut self, slice: CacheSlice) -> Result<(), Error> {
        match slice {
            CacheSlice::Aggregate => self.refresh_aggregate().await,
            CacheSlice::Active => self.refresh_active().await,
            CacheSlice::Cancelled => self.refresh_cancelled().await,
            CacheSlice::Fulfilled => self.refresh_fulfilled().await,
            CacheSlice::BanStatus => self.refresh_ban_status().await,
            CacheSlice::Destroyed => self.refresh_destroyed().await,
        }
    }

    /// Attaches the connected account's pledge counts to listing records,
    /// fetching them concurrently. Any single failure fails the whole batch,
    /// so a collection is replaced all-or-nothing.
    async fn with_own_pledges(
        &self,
        records: Vec<CampaignRecord>,
    ) -> Result<Vec<Campaign>, Error> {
        let own_pledges = match self.state.session.account {
            None => vec![0; records.len()],
            Some(account) => {
                try_join_all(
                    records
                        .iter()
                        .map(|record| self.connection.backer_pledges(record.id, account)),
                )
                .await?
            }
        };
        Ok(records
            .into_iter()
            .zip(own_pledges)
            .map(|(record, own_pledges)| Campaign {
                id: record.id,
                entrepreneur: record.entrepreneur,
                title: record.title,
                unit_cost: record.unit_cost,
                pledges_needed: record.pledges_needed,
                pledges_sold: record.pledges_sold,
                own_pledges,
            })
            .collect())
    }

    /// Creates a new campaign, paying the fixed creation fee, then refreshes
    /// the slices the creation touched.
    pub async fn submit_create_campaign(
        &mut self,
        title: String,
        unit_cost: Amount,
        pledges_needed: u64,
    ) -> Result<(), Error> {
        let from = self.connected_account()?;
        self.connection
            .create_campaign(from, title, unit_cost, pledges_needed)
            .await
            .map_err(log_write_failure("campaign creation"))?;
        self.refresh_active().await?;
        self.refresh_aggregate().await
    }

    /// Buys one pledge of the given active campaign, paying its unit cost.
    pub async fn submit_pledge(&mut self, id: CampaignId) -> Result<(), Error> {
        let from = self.connected_account()?;
        let unit_cost = self
            .state
            .active
            .iter()
            .find(|campaign| campaign.id == id)
            .map(|campaign| campaign.unit_cost)
            .ok_or(Error::UnknownCampaign(id))?;
        self.connection
            .fund_campaign(from, id, 1, unit_cost)
            .await
            .map_err(log_write_failure("pledge"))?;
        self.refresh_active().await?;
        self.refresh_aggregate().await
    }

    /// Cancels a campaign, refunding its backers on the contract side.
    pub async fn submit_cancel(&mut self, id: CampaignId) -> Result<(), Error> {
        let from = self.connected_account()?;
        self.connection
            .cancel_campaign(from, id)
            .await
            .map_err(log_write_failure("campaign cancellation"))?;
        self.refresh_active().await?;
        self.refresh_cancelled().await
    }

    /// Fulfills a complete campaign, paying out its entrepreneur.
    pub async fn submit_fulfill(&mut self, id: CampaignId) -> Result<(), Error> {
        let from = self.connected_account()?;
        self.connection
            .fulfill_campaign(from, id)
            .await
            .map_err(log_write_failure("campaign fulfillment"))?;
        self.refresh_active().await?;
        self.refresh_fulfilled().await?;
        self.refresh_aggregate().await
    }

    /// Claims the refunds for all of the connected account's pledges in
    /// cancelled campaigns.
    pub async fn submit_claim_all_refunds(&mut self) -> Result<(), Error> {
        let from = self.connected_account()?;
        self.connection
            .compensate_backer(from)
            .await
            .map_err(log_write_failure("refund claim"))?;
        self.refresh_cancelled().await?;
        self.refresh_aggregate().await
    }

    /// Withdraws the accumulated fees to the owner.
    pub async fn submit_withdraw_fees(&mut self) -> Result<(), Error> {
        let from = self.connected_account()?;
        self.connection
            .withdraw_fees(from)
            .await
            .map_err(log_write_failure("fee withdrawal"))?;
        self.refresh_aggregate().await
    }

    /// Transfers contract ownership.
    pub async fn submit_change_owner(&mut self, new_owner: Address) -> Result<(), Error> {
        let from = self.connected_account()?;
        self.connection
            .change_owner(from, new_owner)
            .await
            .map_err(log_write_failure("ownership change"))?;
        self.refresh_aggregate().await
    }

    /// Bans an entrepreneur from creating campaigns. The ban affects other
    /// sessions, so no local slice needs a refresh.
    pub async fn submit_ban_entrepreneur(&mut self, entrepreneur: Address) -> Result<(), Error> {
        let from = self.connected_account()?;
        self.connection
            .ban_entrepreneur(from, entrepreneur)
            .await
            .map_err(log_write_failure("entrepreneur ban"))
    }

    /// Destroys the contract. Remaining active campaigns are cancelled by the
    /// contract, so the cancelled collection is re-fetched.
    pub async fn submit_destroy_contract(&mut self) -> Result<(), Error> {
        let from = self.connected_account()?;
        self.connection
            .destroy_contract(from)
            .await
            .map_err(log_write_failure("contract destruction"))?;
        self.state.session.destroyed = true;
        self.state.active.clear();
        self.refresh_cancelled().await
    }

    /// Reacts to a contract event by refreshing the cache slices it made
    /// stale. A failed refresh keeps the stale slice and is only logged.
    pub async fn handle_event(&mut self, event: ContractEvent) {
        for slice in event.invalidated_slices() {
            if let Err(error) = self.refresh_slice(*slice).await {
                warn!(%error, ?event, ?slice, "failed to refresh a cache slice after an event");
            }
        }
    }

    /// Reacts to a change of the node's account list. A new account re-fetches
    /// everything account-scoped; a disconnect clears account-scoped state
    /// locally, without any remote call.
    pub async fn handle_accounts_changed(&mut self, accounts: &[Address]) {
        match accounts.first() {
            Some(&account) => {
                self.state.session.account = Some(account);
                for slice in [
                    CacheSlice::Active,
                    CacheSlice::Fulfilled,
                    CacheSlice::Cancelled,
                    CacheSlice::BanStatus,
                ] {
                    if let Err(error) = self.refresh_slice(slice).await {
                        warn!(%error, ?slice, "failed to refresh a cache slice after an account change");
                    }
                }
            }
            None => {
                self.state.session.account = None;
                self.state.session.is_banned = false;
                let campaigns = self
                    .state
                    .active
                    .iter_mut()
                    .chain(self.state.cancelled.iter_mut())
                    .chain(self.state.fulfilled.iter_mut());
                for campaign in campaigns {
                    campaign.own_pledges = 0;
                }
            }
        }
    }

    fn connected_account(&self) -> Result<Address, Error> {
        self.state.session.account.ok_or(Error::NoConnectedAccount)
    }
}

fn log_write_failure(action: &str) -> impl FnOnce(Error) -> Error + '_ {
    move |error| {
        warn!(%error, "{} failed", action);
        error
    }
}
