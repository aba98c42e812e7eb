use std::future::Future;

use sqlx::{Database, query_builder::Separated};

/// This module contains the SQLite writer implementation.
pub mod sqlite_writer;

/// Trait for binding item data to database query parameters.
///
/// Generic over the database type so binders can be written for any SQLx
/// backend. The binder pushes one value per configured column, in column
/// order.
///
/// # Examples
///
/// ```no_run
/// use herc_reader::item::rdbc::DatabaseItemBinder;
/// use sqlx::{query_builder::Separated, Sqlite};
///
/// struct User {
///     id: i32,
///     name: String,
/// }
///
/// struct UserBinder;
/// impl DatabaseItemBinder<User, Sqlite> for UserBinder {
///     fn bind(&self, item: &User, mut query_builder: Separated<Sqlite, &str>) {
///         query_builder.push_bind(item.id);
///         query_builder.push_bind(item.name.clone());
///     }
/// }
/// ```
pub trait DatabaseItemBinder<O, DB: Database> {
    /// Binds the properties of an item to a separated query builder.
    fn bind(&self, item: &O, query_builder: Separated<DB, &str>);
}

/// Runs a database future to completion from synchronous batch code.
///
/// Must be called from within a multi-threaded Tokio runtime.
pub(crate) fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

pub use sqlite_writer::{SqliteItemWriter, SqliteItemWriterBuilder};
