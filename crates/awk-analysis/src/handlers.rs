//! Handlers for editor queries.
//!
//! Query handlers read the structures maintained by the processing queue and
//! never mutate them. Misses (unknown URIs, unresolvable cursors) produce
//! empty results rather than errors.

mod common;
mod completions;
mod document_symbol;
mod find_all_references;
mod goto_definition;
mod hover;
mod signature_help;
mod workspace_symbol;

pub(crate) use completions::*;
pub(crate) use document_symbol::*;
pub(crate) use find_all_references::*;
pub(crate) use goto_definition::*;
pub(crate) use hover::*;
pub(crate) use signature_help::*;
pub(crate) use workspace_symbol::*;
