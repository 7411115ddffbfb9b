//! Data models for the Mensa sync service.
//!
//! Remote models mirror the JSON shapes of the Mensa API; chat models mirror the local store.

mod canteen;
mod chat;
mod meal;
mod preferences;
mod review;

pub use canteen::*;
pub use chat::*;
pub use meal::*;
pub use preferences::*;
pub use review::*;
