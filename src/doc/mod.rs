//! Legacy Word binary document (.doc) decoding.
//!
//! The MS-DOC format used by Word 97 through 2003 stores a document as a
//! compound container hosting a primary `WordDocument` stream, a table
//! stream (`0Table` or `1Table`) and an optional `Data` stream. Text is a
//! piecewise array of runs located through a piece table; formatting is
//! encoded as incremental property modifications (Sprms) layered over a
//! style sheet.
//!
//! The decoder makes a single pass over the character positions of the
//! main document, the footnotes and the headers, emitting one typed event
//! per position to a caller-supplied [`EventSink`]:
//!
//! ```rust,no_run
//! use docflow::doc::{DocEvent, EventSink, PropertyState, Session, SinkFlow};
//!
//! struct Plain(String);
//!
//! impl EventSink for Plain {
//!     fn main_document(&mut self, _props: &PropertyState, event: DocEvent) -> SinkFlow {
//!         if let DocEvent::Char(ch) = event {
//!             self.0.push(ch);
//!         }
//!         SinkFlow::Continue
//!     }
//! }
//!
//! let mut sink = Plain(String::new());
//! let mut session = Session::open("report.doc")?;
//! session.run(&mut sink)?;
//! println!("{}", sink.0);
//! # Ok::<(), docflow::doc::DocError>(())
//! ```

pub mod apply;
pub mod bin_table;
pub mod boundaries;
pub mod events;
pub mod fib;
pub mod fkp;
pub mod piece_table;
pub mod picture;
pub mod properties;
pub mod session;
pub mod sprm;
pub mod sprm_ids;
pub mod stylesheet;
pub mod text;

pub use boundaries::{SectionTable, Sed};
pub use events::{Completion, ControlMark, DocEvent, EventSink, SinkFlow};
pub use fib::Fib;
pub use picture::{Picture, PictureHeader};
pub use properties::{Chp, Pap, PropertyState, Sep, Tcp, Trp};
pub use session::{DocError, Result, Session, parse};
