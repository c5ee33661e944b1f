// Copyright (c) Crowdfund Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Tests for the polling loop, driven by Tokio's paused clock.

use std::time::Duration;

use crowdfund_base::data_types::Amount;
use tokio_util::sync::CancellationToken;

use super::util::{MockLedger, ALICE, BOB};
use crate::{
    contract::ContractEvent,
    dashboard::Dashboard,
    listener::{EventListener, EventListenerConfig},
};

fn config(start_block: Option<u64>) -> EventListenerConfig {
    EventListenerConfig {
        poll_interval_ms: 1000,
        start_block,
        delay_after_ms: 0,
    }
}

#[test_log::test(tokio::test(start_paused = true))]
async fn events_drive_refreshes_and_are_consumed_once() -> anyhow::Result<()> {
    let ledger = MockLedger::single_account();
    let token = CancellationToken::new();
    let listener = EventListener::new(
        Dashboard::new(ledger.clone()),
        config(Some(0)),
        token.clone(),
    );
    let handle = tokio::spawn(listener.run());

    // After the first poll, a campaign is created in another session.
    tokio::time::sleep(Duration::from_millis(500)).await;
    ledger.add_active(MockLedger::campaign(1, BOB, "boat", Amount::ONE, 10, 0));
    ledger.push_event(ContractEvent::CampaignCreated, 3);
    tokio::time::sleep(Duration::from_millis(2600)).await;
    token.cancel();
    let dashboard = handle.await??;

    assert_eq!(dashboard.state().active.len(), 1);
    let floors = ledger.event_read_floors();
    assert_eq!(floors.first(), Some(&0));
    // Once the event at block 3 is consumed, polling resumes after it and
    // never rereads it.
    let advanced = floors
        .iter()
        .position(|&block| block == 4)
        .expect("the event was consumed");
    assert!(floors[advanced..].iter().all(|&block| block == 4));
    Ok(())
}

#[test_log::test(tokio::test(start_paused = true))]
async fn the_default_start_block_is_past_the_chain_head() -> anyhow::Result<()> {
    let ledger = MockLedger::single_account();
    // An old event below the chain head must not be replayed.
    ledger.push_event(ContractEvent::CampaignCreated, 5);
    ledger.set_latest_block(7);

    let token = CancellationToken::new();
    let listener = EventListener::new(Dashboard::new(ledger.clone()), config(None), token.clone());
    let handle = tokio::spawn(listener.run());
    tokio::time::sleep(Duration::from_millis(2500)).await;
    token.cancel();
    let dashboard = handle.await??;

    let floors = ledger.event_read_floors();
    assert!(!floors.is_empty());
    assert!(floors.iter().all(|&block| block == 8));
    // The stale campaign creation never reached the dashboard.
    assert!(dashboard.state().active.is_empty());
    Ok(())
}

#[test_log::test(tokio::test(start_paused = true))]
async fn account_changes_are_observed() -> anyhow::Result<()> {
    let ledger = MockLedger::single_account();
    let token = CancellationToken::new();
    let listener = EventListener::new(
        Dashboard::new(ledger.clone()),
        config(Some(0)),
        token.clone(),
    );
    let handle = tokio::spawn(listener.run());

    tokio::time::sleep(Duration::from_millis(500)).await;
    ledger.set_accounts(vec![BOB]);
    tokio::time::sleep(Duration::from_millis(1100)).await;
    token.cancel();
    let dashboard = handle.await??;

    assert_eq!(dashboard.state().session.account, Some(BOB));
    Ok(())
}

#[test_log::test(tokio::test(start_paused = true))]
async fn a_failed_event_read_skips_the_whole_tick() -> anyhow::Result<()> {
    let ledger = MockLedger::single_account();
    ledger.fail_events(true);

    let token = CancellationToken::new();
    let listener = EventListener::new(
        Dashboard::new(ledger.clone()),
        config(Some(0)),
        token.clone(),
    );
    let handle = tokio::spawn(listener.run());

    tokio::time::sleep(Duration::from_millis(500)).await;
    ledger.set_accounts(vec![BOB]);
    tokio::time::sleep(Duration::from_millis(2100)).await;
    token.cancel();
    let dashboard = handle.await??;

    // Polling kept going despite the errors, but the account switch was not
    // picked up because the failing tick is skipped entirely.
    assert!(ledger.event_read_floors().len() >= 2);
    assert_eq!(dashboard.state().session.account, Some(ALICE));
    Ok(())
}
