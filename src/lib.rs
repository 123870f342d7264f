//! Squad Duel Server - authoritative two-player squad combat over HTTP
//!
//! Matches are created, joined and played through a small JSON protocol;
//! clients learn about their opponent's moves by polling match state.

pub mod app;
pub mod client;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
