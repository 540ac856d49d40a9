//! Actuator drivers and hardware initialisation.

pub mod alarm;
pub mod hw_init;
