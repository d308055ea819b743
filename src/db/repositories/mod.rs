//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod advertisement;
pub mod category;
pub mod city;
pub mod response;
pub mod session;
pub mod tag;
pub mod user;

pub use advertisement::{AdvertisementRepository, SqlxAdvertisementRepository};
pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use city::{CityRepository, SqlxCityRepository};
pub use response::{ResponseRepository, SqlxResponseRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use tag::{SqlxTagRepository, TagRepository};
pub use user::{SqlxUserRepository, UserRepository};
