//! hinko - a chat bot for small teams: shared notes, named groups, random
//! teams, match scores and a few animations.

pub mod application;
pub mod domain;
pub mod infrastructure;
