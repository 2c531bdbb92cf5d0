//! Domain types for representing the text content of a slide deck.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Represents an entire slide deck with its text content loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presentation {
    /// Original filename (without path).
    pub filename: String,

    /// Detected format of the source file.
    pub format: PresentationFormat,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Presentation {
    /// Create a new presentation with the given filename and format.
    pub fn new(filename: impl Into<String>, format: PresentationFormat) -> Self {
        Self {
            filename: filename.into(),
            format,
            slides: Vec::new(),
        }
    }

    /// Add a slide to the presentation.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }
}

/// A source of slides that can be read one at a time, in order.
///
/// Loading is per slide so a failure while reading one slide's shapes
/// surfaces from that slide's call and aborts the run there.
pub trait SlideSource {
    /// Total number of slides in the deck.
    fn slide_count(&self) -> usize;

    /// Load the slide at `index` (0-based).
    fn load_slide(&mut self, index: usize) -> Result<Slide>;
}

impl SlideSource for Presentation {
    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn load_slide(&mut self, index: usize) -> Result<Slide> {
        self.slides.get(index).cloned().ok_or_else(|| {
            crate::Error::PptxParseError(format!(
                "slide index {} out of range ({} slides)",
                index,
                self.slides.len()
            ))
        })
    }
}

/// The format of the source presentation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
}

impl PresentationFormat {
    /// Detect format from file extension.
    ///
    /// This is the upload allow-list: anything but `pptx` is rejected.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            _ => None,
        }
    }

    /// Detect format from a filename's extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        filename
            .rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        None
    }
}

/// A single slide's text-bearing shapes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based slide number.
    pub number: usize,

    /// Shapes that carry a text frame, in document order.
    pub shapes: Vec<Shape>,
}

impl Slide {
    /// Create a new empty slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            shapes: Vec::new(),
        }
    }

    /// Add a shape to this slide.
    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Iterate every text run on the slide, shape by shape and
    /// paragraph by paragraph.
    pub fn text_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.shapes
            .iter()
            .flat_map(|s| s.paragraphs.iter())
            .flat_map(|p| p.runs.iter())
    }
}

/// A shape with a text frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shape {
    /// Shape name from its non-visual properties, if present.
    pub name: Option<String>,

    /// Paragraphs of the shape's text frame.
    pub paragraphs: Vec<Paragraph>,
}

impl Shape {
    /// Create a shape from paragraphs of plain strings, one run each.
    pub fn from_paragraphs<I, S>(paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            paragraphs: paragraphs
                .into_iter()
                .map(|text| Paragraph {
                    runs: vec![TextRun::new(text)],
                })
                .collect(),
        }
    }
}

/// A paragraph within a text frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    /// Runs in reading order.
    pub runs: Vec<TextRun>,
}

/// A fragment of literal text with uniform formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    /// The run's text, whitespace preserved.
    pub text: String,
}

impl TextRun {
    /// Create a new text run.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
