// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Keeper credential vault.
//!
//! A thin axum layer over [`keeper_service::VaultService`]: it moves request
//! headers into call metadata and maps vault errors onto HTTP statuses. All
//! authentication and scoping decisions stay in the service.

pub mod auth;
pub mod handlers;
pub mod server;

pub use handlers::{ApiError, ErrorResponse};
pub use server::{GatewayState, ServerConfig, router, start_server};
