pub mod config;
pub mod display;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod parse;
pub mod poll;
