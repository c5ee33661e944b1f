// Copyright (c) Crowdfund Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! A polling listener that keeps a [`Dashboard`] in sync with the contract.

use std::time::Duration;

use alloy_primitives::Address;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{contract::LedgerConnection, dashboard::Dashboard, error::Error};

#[derive(Clone, Debug, clap::Args, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListenerConfig {
    /// How often to poll the node for new events and account changes.
    #[serde(default = "default_poll_interval_ms")]
    #[arg(
        long = "listener-poll-interval-ms",
        default_value = "2000",
        env = "CROWDFUND_LISTENER_POLL_INTERVAL"
    )]
    pub poll_interval_ms: u64,

    /// The first block to read events from. Defaults to the block after the
    /// chain head at startup.
    #[serde(default)]
    #[arg(long = "listener-start-block", env = "CROWDFUND_LISTENER_START_BLOCK")]
    pub start_block: Option<u64>,

    /// Wait after processing any notification (useful for rate limiting).
    #[serde(default)]
    #[arg(
        long = "listener-delay-after-ms",
        default_value = "0",
        env = "CROWDFUND_LISTENER_DELAY_AFTER"
    )]
    pub delay_after_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    2000
}

impl Default for EventListenerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            start_block: None,
            delay_after_ms: 0,
        }
    }
}

/// An `EventListener` owns a [`Dashboard`] and drives it: contract events and
/// account changes observed at the node are turned into cache refreshes.
pub struct EventListener<C: LedgerConnection> {
    dashboard: Dashboard<C>,
    config: EventListenerConfig,
    cancellation_token: CancellationToken,
    /// The next block events have not yet been read from.
    next_block: u64,
    last_accounts: Vec<Address>,
}

impl<C: LedgerConnection> EventListener<C> {
    pub fn new(
        dashboard: Dashboard<C>,
        config: EventListenerConfig,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            dashboard,
            config,
            cancellation_token,
            next_block: 0,
            last_accounts: Vec::new(),
        }
    }

    /// Initializes the dashboard and polls until the cancellation token fires.
    /// Returns the dashboard so its final state remains inspectable.
    ///
    /// Errors inside the loop are logged and the tick skipped; only a failure
    /// to determine the starting block is fatal.
    #[instrument(skip_all)]
    pub async fn run(mut self) -> Result<Dashboard<C>, Error> {
        self.next_block = match self.config.start_block {
            Some(block) => block,
            None => self.dashboard.connection().latest_block().await? + 1,
        };
        self.dashboard.initialize().await;
        self.last_accounts = self
            .dashboard
            .state()
            .session
            .account
            .into_iter()
            .collect();
        info!(next_block = self.next_block, "listening for contract events");
        let mut interval =
            tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));
        loop {
            tokio::select! {
                _ = self.cancellation_token.cancelled() => break,
                _ = interval.tick() => self.poll().await,
            }
        }
        Ok(self.dashboard)
    }

    async fn poll(&mut self) {
        let notifications = self
            .dashboard
            .connection()
            .read_new_events(self.next_block)
            .await;
        match notifications {
            Ok(notifications) => {
                for (event, block) in notifications {
                    debug!(?event, block, "contract event");
                    self.next_block = self.next_block.max(block + 1);
                    self.dashboard.handle_event(event).await;
                    Self::sleep(self.config.delay_after_ms).await;
                }
            }
            Err(error) => {
                warn!(%error, "failed to read contract events; skipping this tick");
                return;
            }
        }
        let accounts = self.dashboard.connection().accounts().await;
        match accounts {
            Ok(accounts) => {
                if accounts != self.last_accounts {
                    self.dashboard.handle_accounts_changed(&accounts).await;
                    self.last_accounts = accounts;
                }
            }
            Err(error) => warn!(%error, "failed to poll the node's accounts"),
        }
    }

    async fn sleep(delay_ms: u64) {
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }
}
