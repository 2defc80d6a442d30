// ABOUTME: Core types and constants for the homedash service dashboard
// ABOUTME: Foundation crate with error handling, health models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 homedash contributors

#![deny(unsafe_code)]

//! # Homedash Core
//!
//! Foundation crate shared by the aggregation runtime and the service
//! adapters. It changes rarely, which keeps incremental builds of the
//! workspace cheap.
//!
//! ## Modules
//!
//! - **errors**: `AppError`, `ErrorCode` and the adapter error taxonomy
//! - **constants**: TTLs, key prefixes, rate limit and monitor defaults
//! - **models**: health states and service records

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Health and service configuration models
pub mod models;
