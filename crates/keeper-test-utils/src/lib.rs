// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Keeper integration tests.

pub mod harness;
pub mod memory_store;

pub use harness::{TEST_SECRET, TestHarness, TestHarnessBuilder, metadata_for};
pub use memory_store::MemoryStore;
