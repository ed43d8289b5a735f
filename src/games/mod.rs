//! Game implementations.

pub mod bazaar;
