#![warn(clippy::all)]
#![doc = include_str!("../README.md")]

// Modules that make up the SQL Query Runner library.
mod args;
mod catalog;
mod container;
mod error;
mod export;
mod history;
mod layout;
mod runner;
mod selection;
mod sort;
mod storage;
mod traits;

// Publicly expose the contents of these modules.
pub use self::{
    // add to lib
    args::Arguments,
    catalog::*,
    container::*,
    error::*,
    export::*,
    history::*,
    layout::*,
    runner::*,
    selection::*,
    sort::*,
    storage::*,
    traits::*,
};
