// Copyright (c) Crowdfund Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! This module provides the base types used throughout the crowdfunding
//! dashboard: exact currency amounts, campaign identifiers and tracing setup.

pub mod data_types;
pub mod identifiers;
pub mod tracing;
