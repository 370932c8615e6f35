//! Domain layer - Core business logic with no platform dependencies
//! 
//! This layer contains:
//! - Entities: Core business objects (User, Message, Command, ScoreRecord)
//! - Traits: Abstractions for infrastructure (Bot, Store, FrameSink)
//! - Rules: Pure business logic (team assembly, animation frames)

pub mod entities;
pub mod rules;
pub mod traits;
