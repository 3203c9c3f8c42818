pub mod blog;
pub mod category;
pub mod user;

pub use blog::{Blog, BlogPatch, NewBlog};
pub use category::{Category, NewCategory};
pub use user::{NewUser, User};

use crate::filter::{ColumnKind, FilterWhereOptions};

/// Row type backed by a table the filter compiler may query.
pub trait Table {
    const NAME: &'static str;
    /// Non-text columns and the cast their parameters need
    const COLUMNS: &'static [(&'static str, ColumnKind)];

    fn where_options() -> FilterWhereOptions {
        FilterWhereOptions::with_columns(Self::COLUMNS)
    }
}
