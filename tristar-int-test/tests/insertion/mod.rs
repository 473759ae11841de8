//! Insertion integration tests.
//!
//! These tests drive whole trees through many insertions and check the
//! structural properties after every step.

mod insert_property_test;
mod insert_negative_test;
