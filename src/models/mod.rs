//! Data models
//!
//! This module contains all data structures used throughout the adboard system.
//! Models represent:
//! - Database entities (Advertisement, Response, City, Category, Tag, User, Session)
//! - Input types for create/update operations
//! - Query, filter and pagination types

mod advertisement;
mod category;
mod city;
mod response;
mod session;
mod tag;
mod user;

pub use advertisement::{
    AdFilter, AdSort, Advertisement, AdvertisementWithMeta, CreateAdvertisementInput, ListParams,
    NewAdvertisement, PagedResult, UpdateAdvertisementInput,
};
pub use category::Category;
pub use city::City;
pub use response::{CreateResponseInput, Response, ResponseStatus, ResponseWithMeta};
pub use session::Session;
pub use tag::{Tag, TagWithCount};
pub use user::User;
