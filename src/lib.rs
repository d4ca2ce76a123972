//! # Fishbowl Game Library
//!
//! This library provides the core game logic for Fishbowl, a party game in
//! which players submit words, split into teams, and take timed turns getting
//! their teammates to guess the words across several rounds. It holds the
//! game record and its transitions, the team and turn rotation rules, and the
//! change-driven triggers that move a stored game forward as players act.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]

pub mod config;
pub mod constants;
pub mod game;
pub mod game_id;
pub mod phase;
pub mod player;
pub mod store;
pub mod teams;
pub mod trigger;
pub mod words;

pub use game::Game;
pub use game_id::GameId;
pub use phase::Phase;
pub use player::{Player, UserId};
pub use words::WordEntry;
