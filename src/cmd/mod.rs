//! Command module structure for the bakery CLI

pub mod check;
pub mod list;
pub mod output;
pub mod util;
