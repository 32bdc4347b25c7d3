pub mod dac;
pub mod serial;

pub use dac::dac_task;
pub use serial::serial_task;
