pub mod backlight;
