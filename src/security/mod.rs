// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Security policies

pub mod url_policy;

pub use url_policy::UrlPolicy;
