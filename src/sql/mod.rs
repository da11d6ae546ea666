pub mod builder;
pub mod finder;
pub mod params;

pub use builder::*;
pub use finder::Finder;
pub use params::PgBindValue;
