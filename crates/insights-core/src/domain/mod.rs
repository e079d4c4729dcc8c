//! Domain entities - the core business objects.

mod insight;
mod tag;
mod user;

pub use insight::{Category, Creator, Insight, InsightFilter, InsightInput, InsightPatch, UnknownCategory};
pub use tag::{TAG_NAME_MAX_LEN, Tag, TagCount};
pub use user::{SignupInput, SignupOutcome, User};
