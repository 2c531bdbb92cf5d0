//! PPTX file reader implementation.

use deckcheck_core::{
    Error, Paragraph, Presentation, PresentationFormat, Result, Shape, Slide, SlideSource, TextRun,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::{NsReader, Reader};
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::result::ZipError;
use zip::ZipArchive;

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";
const SLIDE_REL_TYPE_SUFFIX: &str = "/slide";

/// An open PPTX package whose slides are read on demand.
pub struct PptxDocument<R: Read + Seek> {
    archive: ZipArchive<R>,
    slide_paths: Vec<String>,
}

impl<R: Read + Seek> PptxDocument<R> {
    /// Open a PPTX package and resolve its slide order.
    pub fn open(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let slide_paths = get_slide_order(&mut archive)?;
        log::debug!("Found {} slides", slide_paths.len());

        Ok(Self {
            archive,
            slide_paths,
        })
    }

    /// Archive paths of the slide parts, in presentation order.
    pub fn slide_paths(&self) -> &[String] {
        &self.slide_paths
    }

    /// Read and parse the slide at `index` (0-based).
    pub fn slide(&mut self, index: usize) -> Result<Slide> {
        let path = self.slide_paths.get(index).cloned().ok_or_else(|| {
            Error::PptxParseError(format!(
                "slide index {} out of range ({} slides)",
                index,
                self.slide_paths.len()
            ))
        })?;

        let content = read_file_from_archive(&mut self.archive, &path)?;
        let mut slide = Slide::new(index + 1);
        for shape in extract_shapes_from_xml(&content, index + 1)
            .map_err(|e| Error::XmlError(format!("{}: {}", path, e)))?
        {
            slide.add_shape(shape);
        }

        Ok(slide)
    }
}

impl<R: Read + Seek> SlideSource for PptxDocument<R> {
    fn slide_count(&self) -> usize {
        self.slide_paths.len()
    }

    fn load_slide(&mut self, index: usize) -> Result<Slide> {
        self.slide(index)
    }
}

/// Parser that loads an entire PPTX file up front.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX file from a reader, loading every slide.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<Presentation> {
        let mut document = PptxDocument::open(reader)?;
        let mut presentation = Presentation::new(filename, PresentationFormat::Pptx);

        for index in 0..document.slide_count() {
            presentation.add_slide(document.slide(index)?);
        }

        Ok(presentation)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A relationship entry from a `.rels` part.
#[derive(Debug, Clone)]
struct Relationship {
    rel_type: String,
    target: String,
}

/// Get the ordered list of slide paths.
///
/// The slide id list in `presentation.xml` is authoritative. When it is
/// absent, slide relationships are sorted by their trailing number.
fn get_slide_order<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
    let rels_content = read_file_from_archive(archive, PRESENTATION_RELS_PATH)?;
    let relationships = parse_relationships(&rels_content)?;

    let ordered_ids = match read_optional_file(archive, PRESENTATION_PATH)? {
        Some(content) => parse_slide_id_list(&content)?,
        None => {
            log::warn!("{} missing, ordering slides by relationship", PRESENTATION_PATH);
            Vec::new()
        }
    };

    if !ordered_ids.is_empty() {
        let mut paths = Vec::with_capacity(ordered_ids.len());
        for id in ordered_ids {
            match relationships.get(&id) {
                Some(rel) if rel.rel_type.ends_with(SLIDE_REL_TYPE_SUFFIX) => {
                    paths.push(resolve_target(&rel.target));
                }
                Some(rel) => {
                    log::warn!("Slide id {} points at non-slide relationship {}", id, rel.rel_type);
                }
                None => {
                    return Err(Error::PptxParseError(format!(
                        "slide id list references unknown relationship '{}'",
                        id
                    )));
                }
            }
        }
        return Ok(paths);
    }

    let mut slides: Vec<(String, Option<usize>)> = relationships
        .iter()
        .filter(|(_, rel)| rel.rel_type.ends_with(SLIDE_REL_TYPE_SUFFIX))
        .map(|(id, rel)| {
            let order_num = extract_slide_number(&rel.target).or_else(|| extract_slide_number(id));
            (resolve_target(&rel.target), order_num)
        })
        .collect();

    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb).then_with(|| a.0.cmp(&b.0)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });

    Ok(slides.into_iter().map(|(path, _)| path).collect())
}

/// Parse `Relationship` elements keyed by their `Id`.
fn parse_relationships(xml: &str) -> Result<HashMap<String, Relationship>> {
    let mut relationships = HashMap::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let id = attribute_value(e, b"Id").unwrap_or_default();
                let rel = Relationship {
                    rel_type: attribute_value(e, b"Type").unwrap_or_default(),
                    target: attribute_value(e, b"Target").unwrap_or_default(),
                };
                if !id.is_empty() {
                    relationships.insert(id, rel);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(relationships)
}

/// Relationship ids from `p:sldIdLst`, in order.
fn parse_slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                // The relationship id is the namespaced `r:id`, not the numeric `id`
                let rel_id = e.attributes().flatten().find_map(|attr| {
                    let key = attr.key.as_ref();
                    if key.contains(&b':') && local_name(key) == b"id" {
                        Some(String::from_utf8_lossy(&attr.value).to_string())
                    } else {
                        None
                    }
                });
                if let Some(rel_id) = rel_id {
                    ids.push(rel_id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Shape being assembled while walking slide XML.
#[derive(Debug, Default)]
struct ShapeBuilder {
    name: Option<String>,
    has_text_frame: bool,
    paragraphs: Vec<Paragraph>,
}

const DRAWINGML_NS: &[u8] = b"http://schemas.openxmlformats.org/drawingml/2006/main";
const PRESENTATIONML_NS: &[u8] = b"http://schemas.openxmlformats.org/presentationml/2006/main";

/// Namespaces the text walk cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ns {
    Drawing,
    Presentation,
    Other,
}

impl Ns {
    fn from_resolved(resolved: &ResolveResult) -> Self {
        match resolved {
            ResolveResult::Bound(Namespace(ns)) if *ns == DRAWINGML_NS => Ns::Drawing,
            ResolveResult::Bound(Namespace(ns)) if *ns == PRESENTATIONML_NS => Ns::Presentation,
            _ => Ns::Other,
        }
    }
}

/// A namespace-resolved element name on the open-element stack.
#[derive(Debug)]
struct XmlName {
    ns: Ns,
    local: Vec<u8>,
}

impl XmlName {
    fn is(&self, ns: Ns, local: &[u8]) -> bool {
        self.ns == ns && self.local == local
    }
}

fn parent_is(stack: &[XmlName], ns: Ns, local: &[u8]) -> bool {
    stack.last().map_or(false, |parent| parent.is(ns, local))
}

/// Extract text-bearing shapes from slide XML.
///
/// Only `p:sp` shapes that are direct children of the shape tree and own a
/// `p:txBody` count. Group shapes, pictures, connectors, graphic frames and
/// `mc:AlternateContent` blocks are skipped whole. Runs are the `a:r`
/// children of each `a:p`; math runs, field runs and line breaks are not.
fn extract_shapes_from_xml(
    xml_content: &str,
    slide_number: usize,
) -> std::result::Result<Vec<Shape>, quick_xml::Error> {
    use Ns::{Drawing, Presentation};

    let mut shapes = Vec::new();
    let mut reader = NsReader::from_str(xml_content);

    let mut stack: Vec<XmlName> = Vec::new();
    let mut current_shape: Option<ShapeBuilder> = None;
    let mut in_text_body = false;
    let mut current_paragraph: Option<Paragraph> = None;
    let mut current_run: Option<String> = None;
    let mut in_run_text = false;

    loop {
        let (resolved, event) = reader.read_resolved_event()?;
        let ns = Ns::from_resolved(&resolved);

        match event {
            Event::Start(ref e) => {
                let name = XmlName {
                    ns,
                    local: e.local_name().as_ref().to_vec(),
                };
                match (name.ns, name.local.as_slice()) {
                    (Presentation, b"sp") if parent_is(&stack, Presentation, b"spTree") => {
                        current_shape = Some(ShapeBuilder::default());
                    }
                    (Presentation, b"nvGrpSpPr" | b"grpSpPr" | b"extLst") => {}
                    _ if parent_is(&stack, Presentation, b"spTree") => {
                        log::debug!("Slide {}: Shape without text frame skipped", slide_number);
                    }
                    (Presentation, b"cNvPr") if parent_is(&stack, Presentation, b"nvSpPr") => {
                        set_shape_name(&mut current_shape, e);
                    }
                    (Presentation, b"txBody") if parent_is(&stack, Presentation, b"sp") => {
                        if let Some(ref mut shape) = current_shape {
                            shape.has_text_frame = true;
                            in_text_body = true;
                        }
                    }
                    (Drawing, b"p") if in_text_body && parent_is(&stack, Presentation, b"txBody") => {
                        current_paragraph = Some(Paragraph::default());
                    }
                    (Drawing, b"r")
                        if current_paragraph.is_some() && parent_is(&stack, Drawing, b"p") =>
                    {
                        current_run = Some(String::new());
                    }
                    (Drawing, b"t") if current_run.is_some() && parent_is(&stack, Drawing, b"r") => {
                        in_run_text = true;
                    }
                    _ => {}
                }
                stack.push(name);
            }
            Event::Empty(ref e) => match (ns, e.local_name().as_ref()) {
                (Presentation, b"cNvPr") if parent_is(&stack, Presentation, b"nvSpPr") => {
                    set_shape_name(&mut current_shape, e);
                }
                (Drawing, b"p") if in_text_body && parent_is(&stack, Presentation, b"txBody") => {
                    if let Some(ref mut shape) = current_shape {
                        shape.paragraphs.push(Paragraph::default());
                    }
                }
                (Presentation, b"sp") if parent_is(&stack, Presentation, b"spTree") => {
                    log::debug!("Slide {}: Shape without text frame skipped", slide_number);
                }
                _ => {}
            },
            Event::Text(ref e) => {
                if in_run_text {
                    if let Some(ref mut run) = current_run {
                        run.push_str(&e.unescape()?);
                    }
                }
            }
            Event::End(ref e) => {
                stack.pop();
                match (ns, e.local_name().as_ref()) {
                    (Drawing, b"t") if parent_is(&stack, Drawing, b"r") => {
                        in_run_text = false;
                    }
                    (Drawing, b"r") if parent_is(&stack, Drawing, b"p") => {
                        if let (Some(text), Some(paragraph)) =
                            (current_run.take(), current_paragraph.as_mut())
                        {
                            paragraph.runs.push(TextRun::new(text));
                        }
                        in_run_text = false;
                    }
                    (Drawing, b"p") if in_text_body && parent_is(&stack, Presentation, b"txBody") => {
                        if let (Some(paragraph), Some(shape)) =
                            (current_paragraph.take(), current_shape.as_mut())
                        {
                            shape.paragraphs.push(paragraph);
                        }
                    }
                    (Presentation, b"txBody") if parent_is(&stack, Presentation, b"sp") => {
                        in_text_body = false;
                    }
                    (Presentation, b"sp") if parent_is(&stack, Presentation, b"spTree") => {
                        if let Some(shape) = current_shape.take() {
                            if shape.has_text_frame {
                                log::debug!("Slide {}: Text frame detected", slide_number);
                                shapes.push(Shape {
                                    name: shape.name,
                                    paragraphs: shape.paragraphs,
                                });
                            } else {
                                log::debug!(
                                    "Slide {}: Shape without text frame skipped",
                                    slide_number
                                );
                            }
                        }
                        in_text_body = false;
                        current_paragraph = None;
                        current_run = None;
                        in_run_text = false;
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(shapes)
}

/// Record the shape name from `cNvPr`, keeping the first one seen.
fn set_shape_name(shape: &mut Option<ShapeBuilder>, e: &BytesStart) {
    if let Some(ref mut shape) = shape {
        if shape.name.is_none() {
            shape.name = attribute_value(e, b"name").filter(|n| !n.is_empty());
        }
    }
}

/// Read a file from the ZIP archive.
fn read_file_from_archive<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

/// Read a file from the ZIP archive, or `None` if it does not exist.
fn read_optional_file<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Option<String>> {
    let exists = match archive.by_name(path) {
        Ok(_) => true,
        Err(ZipError::FileNotFound) => false,
        Err(e) => return Err(Error::ZipError(format!("Failed to open '{}': {}", path, e))),
    };

    if exists {
        read_file_from_archive(archive, path).map(Some)
    } else {
        Ok(None)
    }
}

/// Unescaped value of an unprefixed attribute.
fn attribute_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| {
            attr.unescape_value()
                .map(|v| v.to_string())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string())
        })
}

/// Resolve a relationship target of `presentation.xml` to an archive path.
fn resolve_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = vec!["ppt"];
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
