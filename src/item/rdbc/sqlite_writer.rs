use log::{debug, error, warn};
use sqlx::{Pool, QueryBuilder, Sqlite};

use crate::BatchError;
use crate::core::item::{ItemWriter, ItemWriterResult};
use crate::item::rdbc::{DatabaseItemBinder, block_on};

/// A writer inserting items into a SQLite table using SQLx.
///
/// Each call to [`ItemWriter::write`] is one transaction: one parameterized
/// `INSERT` statement is executed per item, with values supplied by the
/// configured [`DatabaseItemBinder`], and the transaction is committed once
/// every item has been inserted. If any statement fails the transaction is
/// rolled back, so none of the chunk's rows become visible.
///
/// # Examples
///
/// ```no_run
/// use herc_reader::item::rdbc::sqlite_writer::SqliteItemWriterBuilder;
/// use herc_reader::item::rdbc::DatabaseItemBinder;
/// use herc_reader::core::item::ItemWriter;
/// use sqlx::{SqlitePool, query_builder::Separated, Sqlite};
///
/// struct Product {
///     id: i32,
///     name: String,
/// }
///
/// struct ProductBinder;
/// impl DatabaseItemBinder<Product, Sqlite> for ProductBinder {
///     fn bind(&self, item: &Product, mut query_builder: Separated<Sqlite, &str>) {
///         query_builder.push_bind(item.id);
///         query_builder.push_bind(item.name.clone());
///     }
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = SqlitePool::connect("sqlite://products.db").await?;
/// let binder = ProductBinder;
///
/// let writer = SqliteItemWriterBuilder::<Product>::new()
///     .pool(&pool)
///     .table("products")
///     .add_column("id")
///     .add_column("name")
///     .item_binder(&binder)
///     .build()?;
///
/// writer.write(&[Product { id: 1, name: "Laptop".to_string() }])?;
/// # Ok(())
/// # }
/// ```
pub struct SqliteItemWriter<'a, O> {
    pool: &'a Pool<Sqlite>,
    table: &'a str,
    columns: Vec<&'a str>,
    item_binder: &'a dyn DatabaseItemBinder<O, Sqlite>,
}

impl<O> SqliteItemWriter<'_, O> {
    fn insert_prefix(&self) -> String {
        format!("INSERT INTO {} ({}) ", self.table, self.columns.join(","))
    }
}

impl<O> ItemWriter<O> for SqliteItemWriter<'_, O> {
    /// Inserts the chunk inside a single transaction.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::ItemWriter` when the transaction cannot be opened
    /// or committed, or when any insert fails (constraint violation, missing
    /// table, lost connection). The transaction is rolled back in that case.
    fn write(&self, items: &[O]) -> ItemWriterResult {
        if items.is_empty() {
            return Ok(());
        }

        let insert = self.insert_prefix();

        let result = block_on(async {
            let mut transaction = self.pool.begin().await?;

            for item in items {
                let mut query_builder = QueryBuilder::<Sqlite>::new(insert.as_str());
                query_builder.push_values(std::iter::once(item), |b, item| {
                    self.item_binder.bind(item, b);
                });

                if let Err(error) = query_builder.build().execute(&mut *transaction).await {
                    if let Err(rollback_error) = transaction.rollback().await {
                        warn!("Rollback on {} failed: {}", self.table, rollback_error);
                    }
                    return Err(error);
                }
            }

            transaction.commit().await
        });

        match result {
            Ok(()) => {
                debug!("Committed {} rows into {}", items.len(), self.table);
                Ok(())
            }
            Err(error) => {
                error!("Rolled back {} rows for {}: {}", items.len(), self.table, error);
                Err(BatchError::ItemWriter(format!("SQLite write failed: {}", error)))
            }
        }
    }
}

/// Builder for a [`SqliteItemWriter`].
///
/// Pool, table, at least one column and an item binder are required.
pub struct SqliteItemWriterBuilder<'a, O> {
    pool: Option<&'a Pool<Sqlite>>,
    table: Option<&'a str>,
    columns: Vec<&'a str>,
    item_binder: Option<&'a dyn DatabaseItemBinder<O, Sqlite>>,
}

impl<O> Default for SqliteItemWriterBuilder<'_, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, O> SqliteItemWriterBuilder<'a, O> {
    pub fn new() -> Self {
        Self {
            pool: None,
            table: None,
            columns: Vec::new(),
            item_binder: None,
        }
    }

    pub fn pool(mut self, pool: &'a Pool<Sqlite>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn table(mut self, table: &'a str) -> Self {
        self.table = Some(table);
        self
    }

    /// Adds a column; values are bound in the order columns are added.
    pub fn add_column(mut self, column: &'a str) -> Self {
        self.columns.push(column);
        self
    }

    pub fn item_binder(mut self, item_binder: &'a dyn DatabaseItemBinder<O, Sqlite>) -> Self {
        self.item_binder = Some(item_binder);
        self
    }

    pub fn build(self) -> Result<SqliteItemWriter<'a, O>, BatchError> {
        let pool = self
            .pool
            .ok_or_else(|| BatchError::Configuration("a SQLite pool is required".to_string()))?;
        let table = self
            .table
            .ok_or_else(|| BatchError::Configuration("Table name is mandatory".to_string()))?;

        if self.columns.is_empty() {
            return Err(BatchError::Configuration(
                "One or more columns are required".to_string(),
            ));
        }

        let item_binder = self
            .item_binder
            .ok_or_else(|| BatchError::Configuration("an item binder is required".to_string()))?;

        Ok(SqliteItemWriter {
            pool,
            table,
            columns: self.columns,
            item_binder,
        })
    }
}

#[cfg(test)]
mod tests {
    use sqlx::{Sqlite, SqlitePool, query_builder::Separated, sqlite::SqliteConnectOptions};
    use tempfile::NamedTempFile;

    use crate::{
        BatchError,
        core::item::ItemWriter,
        item::rdbc::{DatabaseItemBinder, sqlite_writer::SqliteItemWriterBuilder},
    };

    #[derive(Clone, Debug)]
    struct TestUser {
        name: String,
        email: String,
    }

    struct TestUserBinder;

    impl DatabaseItemBinder<TestUser, Sqlite> for TestUserBinder {
        fn bind(&self, item: &TestUser, mut query_builder: Separated<Sqlite, &str>) {
            query_builder.push_bind(item.name.clone());
            query_builder.push_bind(item.email.clone());
        }
    }

    fn user(i: usize) -> TestUser {
        TestUser {
            name: format!("User {}", i),
            email: format!("user{}@example.com", i),
        }
    }

    async fn setup_test_db(file: &NamedTempFile) -> Result<SqlitePool, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(file.path())
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        sqlx::query(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE
            )",
        )
        .execute(&pool)
        .await?;

        Ok(pool)
    }

    async fn count_users(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn chunk_is_inserted_in_one_transaction() -> anyhow::Result<()> {
        let file = NamedTempFile::new()?;
        let pool = setup_test_db(&file).await?;
        let binder = TestUserBinder;

        let writer = SqliteItemWriterBuilder::<TestUser>::new()
            .pool(&pool)
            .table("users")
            .add_column("name")
            .add_column("email")
            .item_binder(&binder)
            .build()?;

        let users: Vec<TestUser> = (1..=10).map(user).collect();
        writer.write(&users)?;

        assert_eq!(count_users(&pool).await, 10);

        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM users ORDER BY id")
            .fetch_all(&pool)
            .await?;
        assert_eq!(names[0], "User 1");
        assert_eq!(names[9], "User 10");

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failing_row_rolls_back_the_whole_chunk() -> anyhow::Result<()> {
        let file = NamedTempFile::new()?;
        let pool = setup_test_db(&file).await?;
        let binder = TestUserBinder;

        let writer = SqliteItemWriterBuilder::<TestUser>::new()
            .pool(&pool)
            .table("users")
            .add_column("name")
            .add_column("email")
            .item_binder(&binder)
            .build()?;

        // duplicate email on the third row
        let users = vec![user(1), user(2), user(1)];
        let result = writer.write(&users);

        match result {
            Err(BatchError::ItemWriter(msg)) => {
                assert!(msg.contains("SQLite write failed"), "{msg}");
                assert!(msg.contains("UNIQUE constraint failed"), "{msg}");
            }
            _ => panic!("Expected BatchError::ItemWriter"),
        }
        assert_eq!(count_users(&pool).await, 0);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_chunk_is_a_no_op() -> anyhow::Result<()> {
        let file = NamedTempFile::new()?;
        let pool = setup_test_db(&file).await?;
        let binder = TestUserBinder;

        let writer = SqliteItemWriterBuilder::<TestUser>::new()
            .pool(&pool)
            .table("missing_table")
            .add_column("name")
            .item_binder(&binder)
            .build()?;

        assert!(writer.write(&[]).is_ok());

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_table_is_a_write_error() -> anyhow::Result<()> {
        let file = NamedTempFile::new()?;
        let pool = setup_test_db(&file).await?;
        let binder = TestUserBinder;

        let writer = SqliteItemWriterBuilder::<TestUser>::new()
            .pool(&pool)
            .table("missing_table")
            .add_column("name")
            .add_column("email")
            .item_binder(&binder)
            .build()?;

        assert!(matches!(
            writer.write(&[user(1)]),
            Err(BatchError::ItemWriter(_))
        ));

        Ok(())
    }

    #[test]
    fn build_requires_columns() {
        let binder = TestUserBinder;

        let result = SqliteItemWriterBuilder::<TestUser>::new()
            .table("users")
            .item_binder(&binder)
            .build();

        assert!(matches!(result, Err(BatchError::Configuration(_))));
    }
}
