use rand::distr::{Alphanumeric, SampleString};

pub mod chunk;

pub mod item;

pub mod job;

pub mod repository;

pub mod step;

/// Generates a random name consisting of alphanumeric characters.
///
/// Used for jobs and steps built without an explicit name.
fn build_name() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 8)
}
