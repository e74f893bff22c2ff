//! XML reading and writing for [`Document`].

use std::io::Write;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::error::DocumentError;
use super::tree::{AttributedTree, Document, NodeId};

impl Document {
    /// Parse a document from XML text.
    ///
    /// Comments, processing instructions and the doctype are dropped. Text and
    /// CDATA sections inside an element are concatenated into its character
    /// data.
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut doc: Option<Document> = None;
        let mut stack: Vec<NodeId> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => {
                    let node = open_element(&mut doc, &stack, e)?;
                    stack.push(node);
                }
                Event::Empty(ref e) => {
                    open_element(&mut doc, &stack, e)?;
                }
                Event::End(ref e) => {
                    if stack.pop().is_none() {
                        let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                        return Err(DocumentError::UnexpectedEnd { tag });
                    }
                }
                Event::Text(ref e) => {
                    if let (Some(doc), Some(node)) = (doc.as_mut(), stack.last()) {
                        let text = e.unescape()?;
                        doc.append_text(*node, &text);
                    }
                }
                Event::CData(ref e) => {
                    if let (Some(doc), Some(node)) = (doc.as_mut(), stack.last()) {
                        let text = String::from_utf8_lossy(e).to_string();
                        doc.append_text(*node, &text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let (Some(doc), Some(node)) = (doc.as_ref(), stack.last()) {
            let tag = doc.tag(*node).unwrap_or_default().to_string();
            return Err(DocumentError::Unclosed { tag });
        }

        let doc = doc.ok_or(DocumentError::NoRoot)?;
        log::debug!(
            "Parsed document <{}> with {} nodes",
            doc.tag(doc.root()).unwrap_or_default(),
            doc.node_count()
        );
        Ok(doc)
    }

    /// Read and parse an XML file.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        log::info!("Loading document from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Serialize the attached part of the document as indented XML.
    pub fn to_xml(&self) -> Result<String, DocumentError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| DocumentError::Xml(e.into()))?;
        self.write_node(&mut writer, self.root())?;

        let result = writer.into_inner();
        String::from_utf8(result).map_err(|_| DocumentError::InvalidUtf8)
    }

    /// Serialize the document and write it to a file.
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let xml = self.to_xml()?;
        std::fs::write(path, xml)?;
        log::info!("Saved document to {:?}", path);
        Ok(())
    }

    fn write_node<W: Write>(&self, writer: &mut Writer<W>, node: NodeId) -> Result<(), DocumentError> {
        let tag = self.tag(node).ok_or(DocumentError::UnknownNode(node))?;
        let start = BytesStart::new(tag).with_attributes(
            self.attributes(node)
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );

        let children = self.children(node);
        let text = self.text(node);
        if children.is_empty() && text.is_empty() {
            writer
                .write_event(Event::Empty(start))
                .map_err(|e| DocumentError::Xml(e.into()))?;
            return Ok(());
        }

        writer
            .write_event(Event::Start(start))
            .map_err(|e| DocumentError::Xml(e.into()))?;
        if !text.is_empty() {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| DocumentError::Xml(e.into()))?;
        }
        for child in children {
            self.write_node(writer, *child)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(tag)))
            .map_err(|e| DocumentError::Xml(e.into()))?;
        Ok(())
    }
}

/// Create the node for a start (or empty) tag and copy its attributes.
fn open_element(
    doc: &mut Option<Document>,
    stack: &[NodeId],
    e: &BytesStart<'_>,
) -> Result<NodeId, DocumentError> {
    let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();

    let node = if let Some(existing) = doc.as_mut() {
        match stack.last() {
            Some(parent) => existing.push_node(*parent, &tag),
            None => {
                let first = existing.tag(existing.root()).unwrap_or_default().to_string();
                return Err(DocumentError::MultipleRoots { first, second: tag });
            }
        }
    } else {
        let created = Document::new(&tag)?;
        let root = created.root();
        *doc = Some(created);
        root
    };

    if let Some(doc) = doc.as_mut() {
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value()?.to_string();
            doc.push_attribute(node, key, value);
        }
    }
    Ok(node)
}
