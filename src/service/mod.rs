pub mod paginate;
pub mod repo;
pub mod update;

pub use paginate::{paginate_finder, paginate_spec};
pub use repo::Repo;
pub use update::{update_by_updater, Updater};
