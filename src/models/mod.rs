// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod item;
pub mod session;
pub mod user;

pub use item::{BucketItem, CompletedItem, CompletionDraft};
pub use session::Session;
pub use user::{User, UserProfile};
