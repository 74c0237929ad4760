//! # docflow
//!
//! Event-stream decoder for legacy Microsoft Word binary documents
//! (.doc, Word 97–2003).
//!
//! The crate reads the compound container, reconstructs its streams and
//! walks the document's character positions once, emitting a linear
//! sequence of typed events — text codepoints carrying their effective
//! formatting, paragraph marks, cell and row marks, picture anchors — to
//! a caller-supplied sink. Rendering (plain text, RTF, a view) is the
//! consumer's concern; the decoder never buffers the document.
//!
//! Entry points:
//! - [`doc::Session`] — open a document and drive it through an
//!   [`doc::EventSink`]
//! - [`doc::parse`] — one-shot convenience wrapper
//! - [`ole::OleFile`] — the underlying compound container reader
//!
//! The decoder is read-only, synchronous and single-threaded.

pub mod common;
pub mod doc;
pub mod ole;

pub use doc::{Completion, DocError, DocEvent, EventSink, Session, SinkFlow};
