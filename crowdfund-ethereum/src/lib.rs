// Copyright (c) Crowdfund Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! This module provides functionalities for accessing an Ethereum blockchain node.

pub mod client;
pub mod common;
pub mod provider;
