// Copyright (c) Crowdfund Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! This crate provides a convenient library for embedding the crowdfunding
//! dashboard in a client application: a local mirror of the crowdfunding
//! contract's state, refreshed in bulk and invalidated by contract events.

pub mod config;
pub mod contract;
pub mod dashboard;
mod error;
pub mod listener;
pub mod state;


pub use error::Error;
