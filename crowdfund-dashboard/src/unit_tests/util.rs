// Copyright (c) Crowdfund Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! An in-memory [`LedgerConnection`] for tests.
//!
//! The mock keeps the full contract state behind a mutex, so tests can mutate
//! it "behind the dashboard's back" to simulate activity by other sessions.
//! Every read bumps a counter and every write is recorded, which lets tests
//! assert not only on outcomes but on the traffic that produced them.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use alloy_primitives::Address;
use async_trait::async_trait;
use crowdfund_base::{data_types::Amount, identifiers::CampaignId};
use crowdfund_ethereum::common::EthereumServiceError;

use crate::{
    contract::{CampaignRecord, ContractEvent, LedgerConnection, CAMPAIGN_CREATION_FEE},
    error::Error,
};

pub const ADMIN: Address = Address::repeat_byte(0xAD);
pub const ALICE: Address = Address::repeat_byte(0xA1);
pub const BOB: Address = Address::repeat_byte(0xB0);

/// A state-changing call the mock received, with everything the caller sent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Transaction {
    CreateCampaign {
        from: Address,
        title: String,
        unit_cost: Amount,
        pledges_needed: u64,
    },
    FundCampaign {
        from: Address,
        id: CampaignId,
        quantity: u64,
        payment: Amount,
    },
    CancelCampaign {
        from: Address,
        id: CampaignId,
    },
    FulfillCampaign {
        from: Address,
        id: CampaignId,
    },
    CompensateBacker {
        from: Address,
    },
    WithdrawFees {
        from: Address,
    },
    ChangeOwner {
        from: Address,
        new_owner: Address,
    },
    BanEntrepreneur {
        from: Address,
        entrepreneur: Address,
    },
    DestroyContract {
        from: Address,
    },
}

#[derive(Default)]
struct LedgerState {
    accounts: Vec<Address>,
    latest_block: u64,
    owner: Address,
    balance: Amount,
    collected_fees: Amount,
    destroyed: bool,
    banned: Vec<Address>,
    active: Vec<CampaignRecord>,
    cancelled: Vec<CampaignRecord>,
    fulfilled: Vec<CampaignRecord>,
    pledges: BTreeMap<(CampaignId, Address), u64>,
    events: Vec<(ContractEvent, u64)>,
    event_read_floors: Vec<u64>,
    reads: usize,
    transactions: Vec<Transaction>,
    fail_listings: bool,
    fail_events: bool,
    fail_writes: bool,
}

/// A fake contract whose whole state lives in memory. Clones share the state,
/// so a test can keep a handle while the dashboard owns another.
#[derive(Clone, Default)]
pub struct MockLedger {
    state: Arc<Mutex<LedgerState>>,
}

fn connection_error() -> Error {
    Error::Ethereum(EthereumServiceError::MissingBlockNumber)
}

impl MockLedger {
    /// A ledger with [`ADMIN`] as the contract owner and [`ALICE`] as the only
    /// node account.
    pub fn single_account() -> Self {
        let ledger = Self::default();
        {
            let mut state = ledger.lock();
            state.accounts = vec![ALICE];
            state.owner = ADMIN;
        }
        ledger
    }

    pub fn campaign(
        id: u64,
        entrepreneur: Address,
        title: &str,
        unit_cost: Amount,
        pledges_needed: u64,
        pledges_sold: u64,
    ) -> CampaignRecord {
        CampaignRecord {
            id: CampaignId(id),
            entrepreneur,
            title: title.to_string(),
            unit_cost,
            pledges_needed,
            pledges_sold,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().expect("ledger mutex poisoned")
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.lock().accounts = accounts;
    }

    pub fn set_latest_block(&self, block: u64) {
        self.lock().latest_block = block;
    }

    pub fn set_collected_fees(&self, fees: Amount) {
        self.lock().collected_fees = fees;
    }

    pub fn set_banned(&self, account: Address) {
        self.lock().banned.push(account);
    }

    pub fn set_destroyed(&self) {
        self.lock().destroyed = true;
    }

    pub fn add_active(&self, record: CampaignRecord) {
        self.lock().active.push(record);
    }

    pub fn add_cancelled(&self, record: CampaignRecord) {
        self.lock().cancelled.push(record);
    }

    pub fn set_pledges(&self, id: CampaignId, backer: Address, count: u64) {
        self.lock().pledges.insert((id, backer), count);
    }

    /// Moves an active campaign to the fulfilled listing, as the contract
    /// would after a successful `fulfillCampaign` from another session.
    pub fn move_active_to_fulfilled(&self, id: CampaignId) {
        let mut state = self.lock();
        if let Some(index) = state.active.iter().position(|record| record.id == id) {
            let record = state.active.remove(index);
            state.fulfilled.push(record);
        }
    }

    /// Moves an active campaign to the cancelled listing, as the contract
    /// would after a cancellation from another session.
    pub fn move_active_to_cancelled(&self, id: CampaignId) {
        let mut state = self.lock();
        if let Some(index) = state.active.iter().position(|record| record.id == id) {
            let record = state.active.remove(index);
            state.cancelled.push(record);
        }
    }

    /// Appends an event and extends the chain up to its block.
    pub fn push_event(&self, event: ContractEvent, block: u64) {
        let mut state = self.lock();
        state.events.push((event, block));
        state.latest_block = state.latest_block.max(block);
    }

    pub fn fail_listings(&self, fail: bool) {
        self.lock().fail_listings = fail;
    }

    pub fn fail_events(&self, fail: bool) {
        self.lock().fail_events = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// How many read calls the mock has served so far.
    pub fn read_count(&self) -> usize {
        self.lock().reads
    }

    /// All successfully executed state-changing calls, in order.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.lock().transactions.clone()
    }

    /// The `starting_block` of every event read, in call order.
    pub fn event_read_floors(&self) -> Vec<u64> {
        self.lock().event_read_floors.clone()
    }

    fn record_write(&self, transaction: Transaction) -> Result<MutexGuard<'_, LedgerState>, Error> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(connection_error());
        }
        state.transactions.push(transaction);
        Ok(state)
    }
}

#[async_trait]
impl LedgerConnection for MockLedger {
    async fn accounts(&self) -> Result<Vec<Address>, Error> {
        let mut state = self.lock();
        state.reads += 1;
        Ok(state.accounts.clone())
    }

    async fn latest_block(&self) -> Result<u64, Error> {
        let mut state = self.lock();
        state.reads += 1;
        Ok(state.latest_block)
    }

    async fn owner(&self) -> Result<Address, Error> {
        let mut state = self.lock();
        state.reads += 1;
        Ok(state.owner)
    }

    async fn contract_balance(&self) -> Result<Amount, Error> {
        let mut state = self.lock();
        state.reads += 1;
        Ok(state.balance)
    }

    async fn collected_fees(&self) -> Result<Amount, Error> {
        let mut state = self.lock();
        state.reads += 1;
        Ok(state.collected_fees)
    }

    async fn is_destroyed(&self) -> Result<bool, Error> {
        let mut state = self.lock();
        state.reads += 1;
        Ok(state.destroyed)
    }

    async fn is_banned(&self, account: Address) -> Result<bool, Error> {
        let mut state = self.lock();
        state.reads += 1;
        Ok(state.banned.contains(&account))
    }

    async fn active_campaigns(&self) -> Result<Vec<CampaignRecord>, Error> {
        let mut state = self.lock();
        state.reads += 1;
        if state.fail_listings {
            return Err(connection_error());
        }
        Ok(state.active.clone())
    }

    async fn cancelled_campaigns(&self) -> Result<Vec<CampaignRecord>, Error> {
        let mut state = self.lock();
        state.reads += 1;
        if state.fail_listings {
            return Err(connection_error());
        }
        Ok(state.cancelled.clone())
    }

    async fn fulfilled_campaigns(&self) -> Result<Vec<CampaignRecord>, Error> {
        let mut state = self.lock();
        state.reads += 1;
        if state.fail_listings {
            return Err(connection_error());
        }
        Ok(state.fulfilled.clone())
    }

    async fn backer_pledges(&self, id: CampaignId, backer: Address) -> Result<u64, Error> {
        let mut state = self.lock();
        state.reads += 1;
        Ok(state.pledges.get(&(id, backer)).copied().unwrap_or(0))
    }

    async fn create_campaign(
        &self,
        from: Address,
        title: String,
        unit_cost: Amount,
        pledges_needed: u64,
    ) -> Result<(), Error> {
        let mut state = self.record_write(Transaction::CreateCampaign {
            from,
            title: title.clone(),
            unit_cost,
            pledges_needed,
        })?;
        let next_id = state
            .active
            .iter()
            .chain(&state.cancelled)
            .chain(&state.fulfilled)
            .map(|record| u64::from(record.id))
            .max()
            .unwrap_or(0)
            + 1;
        state.active.push(CampaignRecord {
            id: CampaignId(next_id),
            entrepreneur: from,
            title,
            unit_cost,
            pledges_needed,
            pledges_sold: 0,
        });
        state.collected_fees = state.collected_fees.saturating_add(CAMPAIGN_CREATION_FEE);
        state.balance = state.balance.saturating_add(CAMPAIGN_CREATION_FEE);
        Ok(())
    }

    async fn fund_campaign(
        &self,
        from: Address,
        id: CampaignId,
        quantity: u64,
        payment: Amount,
    ) -> Result<(), Error> {
        let mut state = self.record_write(Transaction::FundCampaign {
            from,
            id,
            quantity,
            payment,
        })?;
        if let Some(record) = state.active.iter_mut().find(|record| record.id == id) {
            record.pledges_sold += quantity;
        }
        *state.pledges.entry((id, from)).or_insert(0) += quantity;
        state.balance = state.balance.saturating_add(payment);
        Ok(())
    }

    async fn cancel_campaign(&self, from: Address, id: CampaignId) -> Result<(), Error> {
        let mut state = self.record_write(Transaction::CancelCampaign { from, id })?;
        if let Some(index) = state.active.iter().position(|record| record.id == id) {
            let record = state.active.remove(index);
            state.cancelled.push(record);
        }
        Ok(())
    }

    async fn fulfill_campaign(&self, from: Address, id: CampaignId) -> Result<(), Error> {
        let mut state = self.record_write(Transaction::FulfillCampaign { from, id })?;
        if let Some(index) = state.active.iter().position(|record| record.id == id) {
            let record = state.active.remove(index);
            state.fulfilled.push(record);
        }
        Ok(())
    }

    async fn compensate_backer(&self, from: Address) -> Result<(), Error> {
        let mut state = self.record_write(Transaction::CompensateBacker { from })?;
        let cancelled_ids: Vec<_> = state.cancelled.iter().map(|record| record.id).collect();
        for id in cancelled_ids {
            state.pledges.remove(&(id, from));
        }
        Ok(())
    }

    async fn withdraw_fees(&self, from: Address) -> Result<(), Error> {
        let mut state = self.record_write(Transaction::WithdrawFees { from })?;
        state.balance = state.balance.saturating_sub(state.collected_fees);
        state.collected_fees = Amount::ZERO;
        Ok(())
    }

    async fn change_owner(&self, from: Address, new_owner: Address) -> Result<(), Error> {
        let mut state = self.record_write(Transaction::ChangeOwner { from, new_owner })?;
        state.owner = new_owner;
        Ok(())
    }

    async fn ban_entrepreneur(&self, from: Address, entrepreneur: Address) -> Result<(), Error> {
        let mut state = self.record_write(Transaction::BanEntrepreneur { from, entrepreneur })?;
        state.banned.push(entrepreneur);
        Ok(())
    }

    async fn destroy_contract(&self, from: Address) -> Result<(), Error> {
        let mut state = self.record_write(Transaction::DestroyContract { from })?;
        state.destroyed = true;
        let remaining = std::mem::take(&mut state.active);
        state.cancelled.extend(remaining);
        Ok(())
    }

    async fn read_new_events(
        &self,
        starting_block: u64,
    ) -> Result<Vec<(ContractEvent, u64)>, Error> {
        let mut state = self.lock();
        state.event_read_floors.push(starting_block);
        if state.fail_events {
            return Err(connection_error());
        }
        let mut notifications: Vec<_> = state
            .events
            .iter()
            .copied()
            .filter(|(_event, block)| *block >= starting_block)
            .collect();
        notifications.sort_by_key(|(_event, block)| *block);
        Ok(notifications)
    }
}
