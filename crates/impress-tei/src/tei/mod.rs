//! TEI document model
//!
//! A lossless element tree over quick-xml events. Everything parsed is kept
//! (comments, processing instructions, DOCTYPE, CDATA, whitespace, attribute
//! order and namespace prefixes) so that writing back an edited document
//! only changes the edited elements. The output is always UTF-8 with an XML
//! declaration.

mod node;
mod reader;
mod writer;

use std::path::{Path, PathBuf};

pub use node::{Attribute, Element, Node};

use crate::error::TeiError;

/// TEI P5 namespace
pub const TEI_NS: &str = "http://www.tei-c.org/ns/1.0";

/// A parsed XML document: prolog nodes, one root element, trailing nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeiDocument {
    prolog: Vec<Node>,
    root: Element,
    epilog: Vec<Node>,
    has_declaration: bool,
}

impl TeiDocument {
    pub fn parse(xml: &str) -> Result<Self, TeiError> {
        reader::parse_document(xml.strip_prefix('\u{feff}').unwrap_or(xml))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TeiError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn write_to<W: std::io::Write>(&self, sink: W) -> Result<(), TeiError> {
        writer::write_document(self, sink)
    }

    pub fn to_xml_string(&self) -> Result<String, TeiError> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        String::from_utf8(buf).map_err(|e| TeiError::Encoding(e.utf8_error()))
    }

    /// Replace `path` with the serialized document.
    ///
    /// The document goes to [`staging_path`] first and is renamed over
    /// `path`; a failed write leaves `path` untouched.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TeiError> {
        let path = path.as_ref();
        let xml = self.to_xml_string()?;
        let staging = staging_path(path)?;

        if let Err(e) = std::fs::write(&staging, xml) {
            let _ = std::fs::remove_file(&staging);
            return Err(e.into());
        }
        std::fs::rename(&staging, path)?;
        Ok(())
    }
}

/// Sibling of `path` that [`TeiDocument::save`] writes before renaming:
/// `bibliography.xml` stages as `bibliography.xml.tmp`.
pub fn staging_path(path: &Path) -> Result<PathBuf, TeiError> {
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("'{}' does not name a file", path.display()),
        )
    })?;
    let mut staged = file_name.to_os_string();
    staged.push(".tmp");
    Ok(path.with_file_name(staged))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<?xml-model href="http://www.tei-c.org/release/xml/tei/custom/schema/relaxng/tei_all.rng" type="application/xml"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0" xml:lang="de">
  <!-- generated from Zotero -->
  <text>
    <body>
      <listBibl>
        <biblStruct corresp="#AB12">
          <monogr>
            <title level="m">Wörterbuch &amp; Ergänzungen</title>
            <imprint>
              <pubPlace>Leipzig</pubPlace>
              <date when="1859">1859</date>
              <biblScope unit="page"/>
            </imprint>
          </monogr>
          <note type="bibliographic"><![CDATA[a < b]]></note>
        </biblStruct>
      </listBibl>
    </body>
  </text>
</TEI>
"##;

    #[test]
    fn test_unchanged_document_round_trips() {
        let doc = TeiDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.to_xml_string().unwrap(), SAMPLE);
    }

    #[test]
    fn test_appended_child_uses_parent_prefix() {
        let xml = r#"<tei:TEI xmlns:tei="http://www.tei-c.org/ns/1.0"><tei:imprint/></tei:TEI>"#;
        let mut doc = TeiDocument::parse(xml).unwrap();
        let imprint = doc
            .root_mut()
            .find_descendant_mut(&|e: &Element| e.is(TEI_NS, "imprint"))
            .unwrap();
        let mut date = imprint.new_child("date");
        date.set_text("2019-07");
        imprint.append_child(date);

        assert_eq!(
            doc.to_xml_string().unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <tei:TEI xmlns:tei=\"http://www.tei-c.org/ns/1.0\"><tei:imprint><tei:date>2019-07</tei:date></tei:imprint></tei:TEI>"
        );
    }

    #[test]
    fn test_text_is_escaped_on_write() {
        let mut doc = TeiDocument::parse("<note/>").unwrap();
        doc.root_mut().set_text("Smith & Jones <eds>");
        let xml = doc.to_xml_string().unwrap();
        assert!(xml.ends_with("<note>Smith &amp; Jones &lt;eds&gt;</note>"));

        let reparsed = TeiDocument::parse(&xml).unwrap();
        assert_eq!(reparsed.root().text().as_deref(), Some("Smith & Jones <eds>"));
    }

    #[test]
    fn test_strips_byte_order_mark() {
        let doc = TeiDocument::parse("\u{feff}<TEI/>").unwrap();
        assert_eq!(doc.root().name(), "TEI");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bibliography.xml");

        let doc = TeiDocument::parse(SAMPLE).unwrap();
        doc.save(&path).unwrap();
        assert_eq!(TeiDocument::load(&path).unwrap(), doc);
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bibliography.xml");
        std::fs::write(&path, "<old/>").unwrap();

        TeiDocument::parse(SAMPLE).unwrap().save(&path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), SAMPLE);
        assert!(!staging_path(&path).unwrap().exists());
    }

    #[test]
    fn test_failed_save_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bibliography.xml");
        std::fs::write(&path, "<old/>").unwrap();
        // A directory in the staging slot makes the write fail
        std::fs::create_dir(staging_path(&path).unwrap()).unwrap();

        let err = TeiDocument::parse(SAMPLE).unwrap().save(&path).unwrap_err();

        assert!(matches!(err, TeiError::Io(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<old/>");
    }

    #[test]
    fn test_staging_path() {
        assert_eq!(
            staging_path(Path::new("data/bibliography.xml")).unwrap(),
            PathBuf::from("data/bibliography.xml.tmp")
        );
        assert!(staging_path(Path::new("/")).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TeiDocument::load(dir.path().join("missing.xml")).unwrap_err();
        assert!(matches!(err, TeiError::Io(_)));
    }
}
