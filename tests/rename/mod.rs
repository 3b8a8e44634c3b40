//! Rename workflow scenarios run against the in-memory cluster.

mod bdd_steps;
mod scenarios;
mod test_helpers;
