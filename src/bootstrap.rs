//! Rules the crate builds its own front ends from

pub mod rules;
