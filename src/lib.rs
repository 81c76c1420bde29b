//! Inserts nested markup annotations into text.
//!
//! An [`Annotation`] covers a range of code points and carries the bytes to
//! write before and after it. [`annotate`] sorts the annotations, nests the
//! ones that start inside others and interleaves their markers with the
//! literal text, which goes through a [`WriteContent`] transform such as
//! [`HtmlEscape`].
//!
//! ```
//! use text_annotate::{annotate_verbatim, Annotation};
//!
//! let anns = [
//!     Annotation::new(0, 4, "<1>", "</1>"),
//!     Annotation::new(1, 3, "<2>", "</2>"),
//! ];
//! assert_eq!(annotate_verbatim("abcd", &anns).unwrap(), b"<1>a<2>bc</2>d</1>");
//! ```

mod annotation;
mod content;
mod error;
#[cfg(feature = "manifest")]
pub mod manifest;
mod render;

use std::io::Write;

pub use annotation::{nesting_order, normalize, validate, Annotation};
pub use content::{HtmlEscape, Verbatim, WriteContent};
pub use error::{Error, Result};
pub use render::annotate;

/// Annotates `text`, copying the literal text unchanged.
pub fn annotate_verbatim(text: &str, annotations: &[Annotation]) -> Result<Vec<u8>> {
    annotate(text, annotations, Verbatim)
}

/// Annotates `text` with HTML-escaped literal text and writes the result to
/// `w`. Nothing is written if the annotations are invalid.
pub fn with_html<W: Write + ?Sized>(text: &str, annotations: &[Annotation], w: &mut W) -> Result<()> {
    let out = annotate(text, annotations, HtmlEscape)?;
    w.write_all(&out)?;
    Ok(())
}
