//! Transforms applied to the literal text between markers.

/// Writes one literal span of the source text into the output.
///
/// Called once per contiguous, non-empty span, in document order. Marker
/// bytes are never passed here.
pub trait WriteContent {
    fn write_content(&mut self, out: &mut Vec<u8>, content: &str);
}

impl<F> WriteContent for F
where
    F: FnMut(&mut Vec<u8>, &str),
{
    fn write_content(&mut self, out: &mut Vec<u8>, content: &str) {
        self(out, content);
    }
}

/// Copies literal text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl WriteContent for Verbatim {
    fn write_content(&mut self, out: &mut Vec<u8>, content: &str) {
        out.extend_from_slice(content.as_bytes());
    }
}

/// Escapes literal text for inclusion in HTML, using the same entities as
/// Go's `template.HTMLEscape`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEscape;

impl WriteContent for HtmlEscape {
    fn write_content(&mut self, out: &mut Vec<u8>, content: &str) {
        let bytes = content.as_bytes();
        let mut last = 0;
        for (i, b) in bytes.iter().enumerate() {
            let entity: &[u8] = match *b {
                b'"' => b"&#34;",
                b'\'' => b"&#39;",
                b'&' => b"&amp;",
                b'<' => b"&lt;",
                b'>' => b"&gt;",
                b'\0' => "\u{FFFD}".as_bytes(),
                _ => continue,
            };
            out.extend_from_slice(&bytes[last..i]);
            out.extend_from_slice(entity);
            last = i + 1;
        }
        out.extend_from_slice(&bytes[last..]);
    }
}
