#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod channels;
pub mod command;
pub mod config;
pub mod drivers;
pub mod frame;
pub mod link;
pub mod serial_logging;

#[cfg(feature = "firmware")]
pub mod board;
#[cfg(feature = "firmware")]
pub mod ipc;
#[cfg(feature = "firmware")]
pub mod tasks;

#[cfg(feature = "firmware")]
pub use board::Board;
pub use channels::{Channel, ChannelBank, Message};
pub use link::{DacUpdate, HostLink, UpdateQueue};
pub use serial_logging::{Logger, SerialLogger, SerialOut};
