use anyhow::{bail, Error, Result};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use text_annotate::{annotate, Annotation, HtmlEscape, Verbatim};

/// How literal text is written between the annotation markers.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum Escape {
    Html,
    None,
}

impl Escape {
    pub fn all() -> Vec<Escape> {
        vec![Escape::Html, Escape::None]
    }

    pub fn annotate(&self, text: &str, annotations: &[Annotation]) -> Result<Vec<u8>> {
        let out = match self {
            Escape::Html => annotate(text, annotations, HtmlEscape)?,
            Escape::None => annotate(text, annotations, Verbatim)?,
        };
        Ok(out)
    }

    /// Suffix appended to the name of an annotated file.
    pub fn extension(&self) -> &str {
        match self {
            Escape::Html => ".html",
            Escape::None => "",
        }
    }
}

impl FromStr for Escape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "html" => Ok(Escape::Html),
            "none" => Ok(Escape::None),
            _ => bail!(
                "unknown escape {}. Try one of: {}",
                s,
                Escape::all()
                    .into_iter()
                    .map(|l| l.to_string())
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
        }
    }
}

impl Display for Escape {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Escape::Html => f.write_str("html"),
            Escape::None => f.write_str("none"),
        }
    }
}
