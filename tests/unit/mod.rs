//! Unit test harness for seeder-motion.
//!
//! This module organizes configuration tests that go through the public
//! loading API.

mod config_parsing;
mod config_validation;
