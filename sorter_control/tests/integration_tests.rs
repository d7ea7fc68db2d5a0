//! Integration tests for the sorter mode machine.
//!
//! These drive a [`ModeMachine`](sorter_control::ModeMachine) through
//! operator scenarios with production [`BusActions`](sorter_control::BusActions)
//! and check both the resulting mode and the commands it emitted.

mod integration;
