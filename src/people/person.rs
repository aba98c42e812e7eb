use std::fmt;

use log::info;
use serde::Deserialize;
use sqlx::{Sqlite, query_builder::Separated};

use crate::{
    core::item::{ItemProcessor, ItemProcessorResult},
    item::rdbc::DatabaseItemBinder,
};

/// A row of the sample data: first and last name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
}

impl Person {
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "firstName: {}, lastName: {}",
            self.first_name, self.last_name
        )
    }
}

/// Upper-cases both names of a person.
#[derive(Default)]
pub struct PersonItemProcessor;

impl ItemProcessor<Person, Person> for PersonItemProcessor {
    fn process(&self, item: &Person) -> ItemProcessorResult<Person> {
        let transformed = Person {
            first_name: item.first_name.to_uppercase(),
            last_name: item.last_name.to_uppercase(),
        };

        info!("Converting ({}) into ({})", item, transformed);

        Ok(transformed)
    }
}

/// Binds `first_name` then `last_name`.
#[derive(Default)]
pub struct PersonItemBinder;

impl DatabaseItemBinder<Person, Sqlite> for PersonItemBinder {
    fn bind(&self, item: &Person, mut query_builder: Separated<Sqlite, &str>) {
        query_builder.push_bind(item.first_name.clone());
        query_builder.push_bind(item.last_name.clone());
    }
}
