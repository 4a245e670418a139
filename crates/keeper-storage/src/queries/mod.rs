// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the vault tables.

pub mod accounts;
pub mod secrets;
