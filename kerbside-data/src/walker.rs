//! Streaming walker over an OSM XML export.
//!
//! [`ElementWalker`] yields one complete node or way at a time in
//! document order without materialising the tree. Event buffers are
//! reused between elements and unwanted subtrees (relations, metadata)
//! are skipped without allocation proportional to their size, so peak
//! memory is bounded by the largest single element in the export.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::str;

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use quick_xml::Reader;
use quick_xml::escape::{EscapeError, unescape};
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

use kerbside_core::{Attributes, Element, ElementKind, RawTag};

/// Errors raised while streaming the source document.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The source document could not be opened.
    #[error("failed to open source document at {path}")]
    Open {
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
        /// Path that failed to open.
        path: Utf8PathBuf,
    },
    /// The document is not well-formed XML.
    #[error("malformed XML near byte {position}: {source}")]
    Parse {
        /// Underlying parser error.
        #[source]
        source: quick_xml::Error,
        /// Byte offset the reader had consumed up to.
        position: u64,
    },
    /// An element carried a malformed attribute list.
    #[error("malformed attribute near byte {position}: {source}")]
    Attribute {
        /// Underlying attribute error.
        #[source]
        source: AttrError,
        /// Byte offset the reader had consumed up to.
        position: u64,
    },
    /// An attribute value carried an invalid character reference.
    #[error("invalid character reference near byte {position}: {source}")]
    Escape {
        /// Underlying unescaping error.
        #[source]
        source: EscapeError,
        /// Byte offset the reader had consumed up to.
        position: u64,
    },
    /// A name or value was not valid UTF-8.
    #[error("non-UTF-8 content near byte {position}")]
    NonUtf8 {
        /// Byte offset the reader had consumed up to.
        position: u64,
    },
    /// The document ended before an element was closed.
    #[error("source document ended before <{element}> was closed")]
    Truncated {
        /// Name of the unclosed element.
        element: String,
    },
}

/// Lazy, forward-only iterator of [`Element`]s over an XML export.
///
/// The sequence is non-restartable: once drained (or once an error has
/// been yielded) the walker returns `None` forever. Dropping the walker
/// releases the underlying source handle.
///
/// # Examples
/// ```
/// use kerbside_data::ElementWalker;
///
/// let xml = r#"<osm><node id="1" lat="53.3" lon="-6.2"/></osm>"#;
/// let mut walker = ElementWalker::new(xml.as_bytes());
/// let element = walker.next().unwrap().unwrap();
/// assert_eq!(element.id(), Some("1"));
/// assert!(walker.next().is_none());
/// ```
pub struct ElementWalker<R: BufRead> {
    reader: Reader<R>,
    yield_nodes: bool,
    yield_ways: bool,
    relations_skipped: u64,
    root_seen: bool,
    finished: bool,
    buf: Vec<u8>,
    child_buf: Vec<u8>,
}

impl ElementWalker<BufReader<File>> {
    /// Open an export file and walk it, yielding nodes and ways.
    pub fn from_path(path: &Utf8Path) -> Result<Self, WalkError> {
        let file = File::open(path).map_err(|source| WalkError::Open {
            source,
            path: path.to_path_buf(),
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ElementWalker<R> {
    /// Walk a source, yielding both nodes and ways.
    pub fn new(source: R) -> Self {
        Self::with_kinds(source, &[ElementKind::Node, ElementKind::Way])
    }

    /// Walk a source, yielding only the requested kinds.
    pub fn with_kinds(source: R, kinds: &[ElementKind]) -> Self {
        Self {
            reader: Reader::from_reader(source),
            yield_nodes: kinds.contains(&ElementKind::Node),
            yield_ways: kinds.contains(&ElementKind::Way),
            relations_skipped: 0,
            root_seen: false,
            finished: false,
            buf: Vec::new(),
            child_buf: Vec::new(),
        }
    }

    /// Number of relation subtrees skipped so far.
    ///
    /// Relations are acknowledged and counted but never shaped.
    #[must_use]
    pub fn relations_skipped(&self) -> u64 {
        self.relations_skipped
    }

    fn position(&self) -> u64 {
        self.reader.buffer_position()
    }

    fn next_element(&mut self) -> Result<Option<Element>, WalkError> {
        loop {
            self.buf.clear();
            let event = {
                let position = self.reader.buffer_position();
                self.reader
                    .read_event_into(&mut self.buf)
                    .map_err(|source| WalkError::Parse { source, position })?
            };
            match event {
                Event::Start(start) => {
                    let start = start.into_owned();
                    match start.name().as_ref() {
                        b"node" => {
                            if self.yield_nodes {
                                return self.read_record(&start, ElementKind::Node).map(Some);
                            }
                            self.skip_subtree(&start)?;
                        }
                        b"way" => {
                            if self.yield_ways {
                                return self.read_record(&start, ElementKind::Way).map(Some);
                            }
                            self.skip_subtree(&start)?;
                        }
                        b"relation" => {
                            self.relations_skipped += 1;
                            debug!("skipping relation subtree near byte {}", Self::position(self));
                            self.skip_subtree(&start)?;
                        }
                        _ if !self.root_seen => {
                            // Descend into the root collection element.
                            self.root_seen = true;
                        }
                        _ => self.skip_subtree(&start)?,
                    }
                }
                Event::Empty(start) => {
                    let start = start.into_owned();
                    match start.name().as_ref() {
                        b"node" if self.yield_nodes => {
                            let attributes = decode_attributes(&start, Self::position(self))?;
                            return Ok(Some(Element::node(attributes, Vec::new())));
                        }
                        b"way" if self.yield_ways => {
                            let attributes = decode_attributes(&start, Self::position(self))?;
                            return Ok(Some(Element::way(attributes, Vec::new(), Vec::new())));
                        }
                        b"relation" => self.relations_skipped += 1,
                        _ => {}
                    }
                }
                Event::Eof => {
                    self.finished = true;
                    return Ok(None);
                }
                _ => {}
            }
        }
    }

    /// Read the children of an opened node or way until its end tag.
    fn read_record(
        &mut self,
        start: &BytesStart<'static>,
        kind: ElementKind,
    ) -> Result<Element, WalkError> {
        let attributes = decode_attributes(start, Self::position(self))?;
        let mut tags = Vec::new();
        let mut node_refs = Vec::new();

        loop {
            self.child_buf.clear();
            let event = {
                let position = self.reader.buffer_position();
                self.reader
                    .read_event_into(&mut self.child_buf)
                    .map_err(|source| WalkError::Parse { source, position })?
            };
            match event {
                Event::Empty(child) => {
                    collect_child(&child, self.reader.buffer_position(), &mut tags, &mut node_refs)?;
                }
                Event::Start(child) => {
                    // Children with their own subtrees carry nothing we
                    // keep; record the entry itself, then drop the rest.
                    collect_child(&child, self.reader.buffer_position(), &mut tags, &mut node_refs)?;
                    let child = child.into_owned();
                    self.skip_subtree(&child)?;
                }
                Event::End(end) if end.name().as_ref() == start.name().as_ref() => break,
                Event::End(_) => {}
                Event::Eof => {
                    return Err(WalkError::Truncated {
                        element: kind.as_str().to_owned(),
                    });
                }
                _ => {}
            }
        }

        Ok(match kind {
            ElementKind::Node => Element::node(attributes, tags),
            ElementKind::Way => Element::way(attributes, tags, node_refs),
        })
    }

    /// Consume everything up to and including the matching end tag.
    fn skip_subtree(&mut self, start: &BytesStart<'static>) -> Result<(), WalkError> {
        let end = start.to_end().into_owned();
        self.child_buf.clear();
        let position = self.reader.buffer_position();
        self.reader
            .read_to_end_into(end.name(), &mut self.child_buf)
            .map(|_| ())
            .map_err(|source| WalkError::Parse { source, position })
    }
}

impl<R: BufRead> Iterator for ElementWalker<R> {
    type Item = Result<Element, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_element() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => None,
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

/// Record a `<tag>` or `<nd>` child on the element under construction.
fn collect_child(
    child: &BytesStart<'_>,
    position: u64,
    tags: &mut Vec<RawTag>,
    node_refs: &mut Vec<String>,
) -> Result<(), WalkError> {
    match child.name().as_ref() {
        b"tag" => {
            let mut attributes = decode_attributes(child, position)?;
            // A tag without a key is noise the original silently skipped.
            if let Some(key) = attributes.remove("k") {
                let value = attributes.remove("v").unwrap_or_default();
                tags.push(RawTag::new(key, value));
            }
        }
        b"nd" => {
            let mut attributes = decode_attributes(child, position)?;
            if let Some(node_ref) = attributes.remove("ref") {
                node_refs.push(node_ref);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Decode an element's attribute list into an owned map.
fn decode_attributes(start: &BytesStart<'_>, position: u64) -> Result<Attributes, WalkError> {
    let mut attributes = Attributes::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|source| WalkError::Attribute { source, position })?;
        let key = str::from_utf8(attr.key.as_ref())
            .map_err(|_| WalkError::NonUtf8 { position })?
            .to_owned();
        let raw = str::from_utf8(attr.value.as_ref()).map_err(|_| WalkError::NonUtf8 { position })?;
        let value = unescape(raw)
            .map_err(|source| WalkError::Escape { source, position })?
            .into_owned();
        attributes.insert(key, value);
    }
    Ok(attributes)
}
