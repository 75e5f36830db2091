// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Web client (WebSocket server + embedded HTML)

pub mod server;

pub use server::{router, serve};
