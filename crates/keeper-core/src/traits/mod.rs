// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions at the storage seam.
//!
//! Both traits use `#[async_trait]` so backends can be held as
//! `Arc<dyn VaultStore>`.

pub mod lifecycle;
pub mod store;

pub use lifecycle::StoreLifecycle;
pub use store::VaultStore;
