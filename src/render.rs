use crate::annotation::{normalize, validate, Annotation};
use crate::content::WriteContent;
use crate::error::Result;

/// A validated annotation resolved to unsigned code point offsets.
struct Span<'a> {
    start: usize,
    end: usize,
    annotation: &'a Annotation,
}

/// One open nesting level: the interior `[left, right)` of the annotation at
/// `owner`, or the whole text for the root level.
#[derive(Clone, Copy)]
struct Frame {
    owner: Option<usize>,
    left: usize,
    right: usize,
    rightmost: usize,
    rendered: usize,
}

struct Renderer<'a, W> {
    text: &'a str,
    /// Byte offset of every code point, plus one trailing entry for the end
    /// of the text.
    offsets: Vec<usize>,
    spans: Vec<Span<'a>>,
    rendered: Vec<bool>,
    shadowed: usize,
    out: Vec<u8>,
    content: W,
}

impl<'a, W: WriteContent> Renderer<'a, W> {
    fn new(text: &'a str, offsets: Vec<usize>, sorted: Vec<&'a Annotation>, content: W) -> Self {
        let spans: Vec<Span<'a>> = sorted
            .into_iter()
            .map(|annotation| Span {
                start: to_offset(annotation.start),
                end: to_offset(annotation.end),
                annotation,
            })
            .collect();
        let rendered = vec![false; spans.len()];
        Renderer {
            text,
            out: Vec::with_capacity(text.len() + text.len() / 4),
            offsets,
            spans,
            rendered,
            shadowed: 0,
            content,
        }
    }

    fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Writes the code points `[from, to)` through the content transform,
    /// clamped to the text. Empty spans are skipped.
    fn literal(&mut self, from: usize, to: usize) {
        let n = self.len();
        let (from, to) = (from.min(n), to.min(n));
        if from >= to {
            return;
        }
        let text = self.text;
        let content = &text[self.offsets[from]..self.offsets[to]];
        self.content.write_content(&mut self.out, content);
    }

    fn render(mut self) -> Vec<u8> {
        let n = self.len();
        self.walk(n);
        tracing::debug!(
            code_points = n,
            annotations = self.spans.len(),
            shadowed = self.shadowed,
            bytes = self.out.len(),
            "annotated text"
        );
        self.out
    }

    /// Walks the sorted annotations depth first, keeping the open levels on
    /// an explicit stack so nesting depth is bounded by memory only.
    ///
    /// A level takes the annotations that start inside `[left, right)`; the
    /// root level also takes zero-width annotations sitting at the end of the
    /// text. Levels are consumed in sorted order, so a single cursor is shared
    /// by all of them and a parent resumes where its child stopped.
    fn walk(&mut self, n: usize) {
        let mut stack = vec![Frame {
            owner: None,
            left: 0,
            right: n,
            rightmost: 0,
            rendered: 0,
        }];
        let mut i = 0;
        while let Some(&frame) = stack.last() {
            while i < self.spans.len() && self.rendered[i] {
                i += 1;
            }
            let takes_next = i < self.spans.len() && {
                let start = self.spans[i].start;
                start < frame.right || (start == frame.right && frame.owner.is_none())
            };
            if !takes_next {
                stack.pop();
                self.close_level(frame);
                if let Some(parent) = stack.last_mut() {
                    parent.rightmost = frame.right;
                    parent.rendered += 1;
                }
                continue;
            }

            let top = stack.len() - 1;
            let (start, declared_end) = (self.spans[i].start, self.spans[i].end);
            if declared_end < frame.rightmost {
                tracing::trace!(start, end = declared_end, rightmost = frame.rightmost, "dropping shadowed annotation");
                self.rendered[i] = true;
                self.shadowed += 1;
                i += 1;
                continue;
            }

            self.literal(frame.rightmost, start);
            let annotation = self.spans[i].annotation;
            self.out.extend_from_slice(&annotation.open);
            self.rendered[i] = true;
            let owner = i;
            i += 1;

            if annotation.is_zero_width() {
                self.out.extend_from_slice(&annotation.close);
                stack[top].rightmost = start;
                stack[top].rendered += 1;
                continue;
            }
            let end = declared_end.min(frame.right);
            if end < declared_end {
                tracing::trace!(start, end = declared_end, bound = frame.right, "clipping annotation to its parent");
            }
            stack.push(Frame {
                owner: Some(owner),
                left: start,
                right: end,
                rightmost: start,
                rendered: 0,
            });
        }
    }

    /// Finishes a level: the trailing literal after its last annotation, or
    /// its whole span when it rendered none, then the owner's close marker.
    fn close_level(&mut self, frame: Frame) {
        if frame.rendered > 0 {
            self.literal(frame.rightmost, frame.right);
        } else {
            self.literal(frame.left, frame.right);
        }
        if let Some(owner) = frame.owner {
            let annotation = self.spans[owner].annotation;
            self.out.extend_from_slice(&annotation.close);
        }
    }
}

fn to_offset(v: i64) -> usize {
    usize::try_from(v).unwrap_or(0)
}

/// Annotates `text` with `annotations`, passing every literal span through
/// `content`.
///
/// Annotations may be given in any order. They are sorted by start, wider
/// spans first, and equal spans by descending priority; an annotation that
/// starts inside another one is rendered nested inside it.
///
/// Overlaps that are not proper nesting are resolved on a best-effort basis,
/// not by splitting spans: an annotation that starts inside an earlier one but
/// ends after it is clipped to the earlier one's end, and an annotation whose
/// end falls inside a span already rendered at its level is dropped.
///
/// Annotating an empty text with no annotations returns an empty output.
///
/// # Errors
///
/// [`Error::InvalidStart`](crate::Error::InvalidStart) for a negative start and
/// [`Error::UnclosedRange`](crate::Error::UnclosedRange) for an end past the
/// text or before the start. Nothing is rendered in either case.
pub fn annotate<W: WriteContent>(
    text: &str,
    annotations: &[Annotation],
    content: W,
) -> Result<Vec<u8>> {
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    validate(annotations, offsets.len() - 1)?;
    let sorted = normalize(annotations);
    Ok(Renderer::new(text, offsets, sorted, content).render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{HtmlEscape, Verbatim};
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    fn render(text: &str, anns: &[Annotation]) -> String {
        String::from_utf8(annotate(text, anns, Verbatim).unwrap()).unwrap()
    }

    fn tag(start: i64, end: i64, name: &str) -> Annotation {
        Annotation::new(start, end, format!("<{name}>"), format!("</{name}>"))
    }

    #[test]
    fn test_empty_text_without_annotations() {
        assert_eq!(annotate("", &[], Verbatim).unwrap(), b"");
        assert_eq!(annotate("", &[], HtmlEscape).unwrap(), b"");
    }

    #[test]
    fn test_no_annotations_copies_text() {
        assert_eq!(render("a < b", &[]), "a < b");
    }

    #[test]
    fn test_hello_world() {
        let anns = [tag(0, 5, "b"), tag(7, 12, "i")];
        assert_eq!(render("hello, world", &anns), "<b>hello</b>, <i>world</i>");
    }

    #[test]
    fn test_unsorted_input() {
        let anns = [tag(7, 12, "i"), tag(0, 5, "b")];
        assert_eq!(render("hello, world", &anns), "<b>hello</b>, <i>world</i>");
    }

    #[test]
    fn test_adjacent() {
        let anns = [tag(0, 3, "b"), tag(3, 6, "i")];
        assert_eq!(render("abcdef", &anns), "<b>abc</b><i>def</i>");
    }

    #[test]
    fn test_nested() {
        let anns = [tag(0, 4, "1"), tag(1, 3, "2")];
        assert_eq!(render("abcd", &anns), "<1>a<2>bc</2>d</1>");
    }

    #[test]
    fn test_nested_with_point() {
        let anns = [tag(0, 4, "1"), tag(1, 3, "2"), tag(2, 2, "3")];
        assert_eq!(render("abcd", &anns), "<1>a<2>b<3></3>c</2>d</1>");
    }

    #[test]
    fn test_nested_shared_start() {
        let anns = [tag(0, 2, "in"), tag(0, 4, "out")];
        assert_eq!(render("abcdef", &anns), "<out><in>ab</in>cd</out>ef");
    }

    #[test]
    fn test_nested_shared_end() {
        let anns = [tag(2, 4, "in"), tag(0, 4, "out")];
        assert_eq!(render("abcdef", &anns), "<out>ab<in>cd</in></out>ef");
    }

    #[test]
    fn test_deep_nesting() {
        let anns = [tag(0, 6, "a"), tag(1, 5, "b"), tag(2, 4, "c"), tag(3, 3, "d")];
        assert_eq!(
            render("012345", &anns),
            "<a>0<b>1<c>2<d></d>3</c>4</b>5</a>"
        );
    }

    #[test]
    fn test_siblings_inside_parent() {
        let anns = [tag(0, 8, "p"), tag(1, 3, "x"), tag(5, 7, "y")];
        assert_eq!(render("abcdefgh", &anns), "<p>a<x>bc</x>de<y>fg</y>h</p>");
    }

    #[test]
    fn test_point_annotations() {
        let anns = [tag(0, 0, "b"), tag(0, 0, "i"), tag(2, 2, "i")];
        assert_eq!(render("abc", &anns), "<b></b><i></i>ab<i></i>c");
    }

    #[test]
    fn test_point_at_every_offset() {
        let text = "héllo";
        for k in 0..=5 {
            let split = text.char_indices().nth(k).map_or(text.len(), |(i, _)| i);
            let want = format!("{}<z></z>{}", &text[..split], &text[split..]);
            assert_eq!(render(text, &[tag(k as i64, k as i64, "z")]), want, "k = {k}");
        }
    }

    #[test]
    fn test_point_in_empty_text() {
        assert_eq!(render("", &[tag(0, 0, "z")]), "<z></z>");
    }

    #[test]
    fn test_point_at_parent_end_follows_parent() {
        let anns = [tag(0, 2, "a"), tag(2, 2, "z")];
        assert_eq!(render("abc", &anns), "<a>ab</a><z></z>c");
    }

    #[test]
    fn test_equal_spans_nest_by_priority() {
        let lo = tag(1, 3, "lo").with_priority(1);
        let hi = tag(1, 3, "hi").with_priority(2);
        let want = "a<hi><lo>bc</lo></hi>d";
        assert_eq!(render("abcd", &[lo.clone(), hi.clone()]), want);
        assert_eq!(render("abcd", &[hi, lo]), want);
    }

    #[test]
    fn test_crossing_overlap_is_clipped_to_parent() {
        let anns = [tag(0, 4, "1"), tag(2, 6, "2")];
        assert_eq!(render("abcdefgh", &anns), "<1>ab<2>cd</2></1>efgh");
    }

    #[test]
    fn test_crossing_child_never_widens_parent() {
        let anns = [tag(0, 6, "p"), tag(1, 3, "a"), tag(2, 5, "b")];
        assert_eq!(render("abcdefg", &anns), "<p>a<a>b<b>c</b></a>def</p>g");
    }

    #[test]
    fn test_deep_nesting_of_identical_spans() {
        let n = 100_000;
        let anns = vec![tag(0, 2, "a"); n];
        let want = format!("{}ab{}", "<a>".repeat(n), "</a>".repeat(n));
        assert!(render("ab", &anns) == want);
    }

    #[test]
    fn test_clipped_crossing_leaves_nothing_shadowed() {
        // Without clipping, "2" would widen "1" to 6 and "3" would end inside
        // the covered span.
        let anns = [tag(0, 4, "1"), tag(2, 6, "2"), tag(4, 5, "3")];
        let mut spans = 0;
        let out = annotate("abcdefgh", &anns, |out: &mut Vec<u8>, s: &str| {
            spans += 1;
            out.extend_from_slice(s.as_bytes());
        })
        .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out, "<1>ab<2>cd</2></1><3>e</3>fgh");
        for a in &anns {
            let open = String::from_utf8_lossy(&a.open);
            assert_eq!(out.matches(&*open).count(), 1, "{open}");
        }
        assert_eq!(spans, 4);
    }

    #[test]
    fn test_code_point_offsets() {
        let anns = [tag(0, 5, "b"), tag(6, 11, "i"), tag(12, 13, "s")];
        assert_eq!(
            render("héllo wörld ☃", &anns),
            "<b>héllo</b> <i>wörld</i> <s>☃</s>"
        );
    }

    #[test]
    fn test_markers_are_not_escaped() {
        let anns = [tag(3, 6, "b")];
        let out = annotate("<p>Tom & co</p>", &anns, HtmlEscape).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "&lt;p&gt;<b>Tom</b> &amp; co&lt;/p&gt;"
        );
    }

    #[test]
    fn test_transform_sees_each_literal_once_in_order() {
        let text = "abcdefgh";
        let anns = [tag(0, 8, "p"), tag(1, 3, "x"), tag(3, 3, "z"), tag(5, 7, "y")];
        let mut seen = Vec::new();
        let out = annotate(text, &anns, |out: &mut Vec<u8>, s: &str| {
            seen.push(s.to_string());
            out.extend_from_slice(s.as_bytes());
        })
        .unwrap();
        assert_eq!(seen, vec!["a", "bc", "de", "fg", "h"]);
        assert_eq!(seen.concat(), text);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<p>a<x>bc</x><z></z>de<y>fg</y>h</p>"
        );
    }

    #[test]
    fn test_invalid_start() {
        let anns = [tag(-1, 2, "b")];
        let err = annotate("abcd", &anns, Verbatim).unwrap_err();
        assert!(matches!(err, Error::InvalidStart { index: 0, start: -1 }));
    }

    #[test]
    fn test_end_past_text() {
        let anns = [tag(0, 2, "a"), tag(2, 5, "b")];
        let err = annotate("abcd", &anns, Verbatim).unwrap_err();
        assert!(matches!(err, Error::UnclosedRange { index: 1, end: 5, .. }));
    }

    #[test]
    fn test_range_in_empty_text() {
        let err = annotate("", &[tag(0, 1, "b")], Verbatim).unwrap_err();
        assert!(matches!(err, Error::UnclosedRange { len: 0, .. }));
    }
}
