// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warden-store: the durable, filesystem-backed record store that sits
//! under the coordination service. Every record is one file under
//! `<project>/.warden/`, mutated via an exclusive advisory lock on a
//! sibling `.lock` file and written through a temp-file rename so a crash
//! mid-write never leaves a torn record behind.

pub mod atomic;
pub mod contracts;
pub mod decisions;
pub mod error;
pub mod known_issues;
pub mod layout;
pub mod messages;
pub mod run_state;
pub mod sessions;
pub mod store;
pub mod tasks;

pub use error::StoreError;
pub use layout::ProjectPaths;
pub use store::Store;
