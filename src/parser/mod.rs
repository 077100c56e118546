//! Incremental extraction of utensil calls from streamed model output.
//!
//! Model text arrives as fragments cut at arbitrary byte positions. This
//! module reassembles lines ([`lines::LineAssembler`]), feeds them through
//! the utensil wire protocol ([`stream::StreamParser`]), and queues completed
//! [`UtensilCall`] records while narrative text accumulates separately.

pub mod lines;
pub mod stream;

pub use lines::LineAssembler;
pub use stream::{ParamSet, StreamParser, UtensilCall};
