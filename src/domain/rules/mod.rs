//! Domain rules - pure logic with no I/O

pub mod animation;
pub mod teams;

pub use animation::Animation;
pub use teams::{assemble_teams, format_teams, random_teams, Team};
