//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the Firewatch controller:
//! startup sequencing, measurement cycles, alarm decisions and command
//! handling.  All interaction with hardware and the network happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod channels;
pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
