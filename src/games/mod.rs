//! Reference games.

pub mod gems;
