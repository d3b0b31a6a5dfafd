// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cross-cutting HTTP middleware.

pub mod cors;
pub mod http;
pub mod request_log;

pub use request_log::{request_logger, RequestId, RequestMetadata};
