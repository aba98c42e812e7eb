#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # herc-reader

 A small chunk-oriented batch job: `importUserJob` reads people from the
 `sample-data.csv` resource, upper-cases their names and inserts them into the
 `people` table, ten rows per transaction.

 ## Core Concepts

- **Job:** the entire batch process, composed of one or more `Step`s. Every
  run gets an incrementing run id and ends `COMPLETED` or `FAILED`; completion
  listeners are plain closures invoked with the final `JobExecution`.
- **Step:** a chunk-oriented phase: read up to `chunk` items, process them,
  write them as one unit, until the reader is exhausted.
- **ItemReader:** retrieves input one item at a time.
- **ItemProcessor:** business logic applied to each item read.
- **ItemWriter:** writes a whole chunk; the SQLite writer commits it in one
  transaction.
- **JobRepository:** remembers executions so run ids keep increasing.

 ## Features

| **Feature**   | **Description**                                              |
|---------------|--------------------------------------------------------------|
| csv           | Enables the CSV `ItemReader`                                 |
| rdbc-sqlite   | Enables the SQLite `ItemWriter` and SQLite `JobRepository`   |
| full          | Enables all available features                               |

 The `people` module and the `herc-reader` binary need both `csv` and
 `rdbc-sqlite`, which are enabled by default.

 ## Getting Started

```rust,no_run
# use herc_reader::{
#     core::repository::sqlite::SqliteJobRepository,
#     people::{configuration, run_import_user_job},
# };
# use std::path::Path;
#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let pool = configuration::connect("sqlite://people.db").await?;
    configuration::initialize_schema(&pool).await?;

    let repository = SqliteJobRepository::new(&pool);
    repository.initialize()?;

    let execution = run_import_user_job(Path::new("resources"), &pool, &repository)?;
    println!("run {} ended {}", execution.run_id, execution.status);

    Ok(())
}
```
 */

/// Core module for batch operations
pub mod core;

/// Error types for batch operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Set of item readers / writers (csv reader, sqlite writer)
pub mod item;

/// Settings of the job binary
pub mod settings;

#[cfg(all(feature = "csv", feature = "rdbc-sqlite"))]
/// The `importUserJob` definition
pub mod people;
