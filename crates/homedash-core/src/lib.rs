#![cfg_attr(not(test), no_std)]

//! Hardware-independent core of the homedash telemetry display.
//!
//! Everything in here runs on the host: the board crate supplies buttons,
//! network workers, fonts and a draw target through the traits below.

pub mod app;
pub mod config;
pub mod connectivity;
pub mod input;
pub mod protocol;
pub mod render;
pub mod screen;
pub mod telemetry;
pub mod text;
