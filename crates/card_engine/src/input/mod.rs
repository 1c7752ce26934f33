//! Pointer interaction with the card

pub mod picking;

pub use picking::Picker;
