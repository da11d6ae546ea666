//! crudkit: pagination, generic CRUD, and selective-update helpers for
//! PostgreSQL-backed services.
//!
//! Entities are described by runtime metadata built once per type; rows
//! travel as JSON objects inside the engines and cross the public boundary
//! as serde-mapped beans.

pub mod error;
pub mod meta;
pub mod page;
pub mod radix;
pub mod response;
pub mod service;
pub mod session;
pub mod sql;

pub use error::AppError;
pub use meta::{ColumnInfo, DescriptorBuilder, Entity, EntityDescriptor, PkType};
pub use page::{Page, DEFAULT_PAGE_SIZE};
pub use response::Message;
pub use service::{paginate_finder, paginate_spec, Repo, Updater};
pub use session::{PgSession, Session};
pub use sql::{Direction, Finder, Order, Predicate, QueryBuf, Specification};
