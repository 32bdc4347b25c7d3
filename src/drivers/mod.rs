pub mod dac;

pub use dac::{DacBank, DacError};
