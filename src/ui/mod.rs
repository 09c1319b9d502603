//! UI Module - GTK4 + Libadwaita Interface
//!
//! A fixed-size window hosting the four wizard steps side by side in a
//! `gtk::Fixed`, driven by the wizard controller.

pub mod app;
pub mod window;
pub mod pages;
