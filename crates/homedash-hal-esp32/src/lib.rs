#![no_std]

//! M5Stack Core (ESP32) drivers for the homedash display: front buttons,
//! backlight, LCD frame drawing and the WiFi/MQTT/HTTP network workers.

pub mod input;
pub mod network;
pub mod platform;
pub mod render;
