//! SeaORM entities.

pub mod insight;
pub mod insight_tag;
pub mod tag;
pub mod user;
