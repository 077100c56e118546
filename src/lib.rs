#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::items_after_statements,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

pub mod agent;
pub mod config;
pub mod observability;
pub mod parser;
pub mod providers;
pub mod repl;
pub mod utensils;

pub use agent::Agent;
pub use config::Config;
pub use parser::{StreamParser, UtensilCall};
pub use utensils::UtensilRegistry;
