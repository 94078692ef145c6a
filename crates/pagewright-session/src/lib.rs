// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewright-session — Per-user conversation state for Pagewright front ends.
//
// A front end (chat bot, web form) collects a user's documents over several
// messages before anything runs. This crate keeps that state explicit: one
// `Session` per user, each with its own workspace directory and a
// forward-only stage, owned by a `SessionStore`.

pub mod session;
pub mod store;

pub use session::{Session, Stage};
pub use store::{SessionSettings, SessionStore, UserId};
