//! DAT document serialization.

use std::io::Write;
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tempfile::NamedTempFile;
use tracing::debug;

use dirdat_core::{DatHeader, DatNode, DatTree, ForcePacking, NodeKind, RunConfig};

use crate::error::DatError;

/// A catalog tree together with its header, ready to serialize.
#[derive(Debug, Clone, Copy)]
pub struct DatDocument<'a> {
    header: &'a DatHeader,
    force_packing: Option<ForcePacking>,
    tree: &'a DatTree,
}

impl<'a> DatDocument<'a> {
    /// Create a document from explicit parts.
    pub fn new(
        header: &'a DatHeader,
        force_packing: Option<ForcePacking>,
        tree: &'a DatTree,
    ) -> Self {
        Self {
            header,
            force_packing,
            tree,
        }
    }

    /// Create a document using a run's header settings.
    pub fn from_config(config: &'a RunConfig, tree: &'a DatTree) -> Self {
        Self::new(&config.header, config.force_packing, tree)
    }

    /// Render the document to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DatError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(buffer)
    }

    /// Write the document to `out`.
    pub fn write_to<W: Write>(&self, out: W) -> Result<(), DatError> {
        let mut xml = Writer::new_with_indent(out, b' ', 2);

        emit(&mut xml, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        emit(&mut xml, Event::Start(BytesStart::new("datafile")))?;

        emit(&mut xml, Event::Start(BytesStart::new("header")))?;
        for (tag, value) in self.header.entries() {
            emit(&mut xml, Event::Start(BytesStart::new(tag)))?;
            emit(&mut xml, Event::Text(BytesText::new(&value)))?;
            emit(&mut xml, Event::End(BytesEnd::new(tag)))?;
        }
        if let Some(packing) = self.force_packing {
            let packing: &str = packing.as_ref();
            let marker = BytesStart::new("romvault").with_attributes([("forcepacking", packing)]);
            emit(&mut xml, Event::Empty(marker))?;
        }
        emit(&mut xml, Event::End(BytesEnd::new("header")))?;

        for node in self.tree.top_level() {
            self.write_node(&mut xml, node)?;
        }

        emit(&mut xml, Event::End(BytesEnd::new("datafile")))?;

        let mut out = xml.into_inner();
        out.write_all(b"\n").map_err(DatError::xml)?;
        out.flush().map_err(DatError::xml)?;
        Ok(())
    }

    fn write_node<W: Write>(&self, xml: &mut Writer<W>, node: &DatNode) -> Result<(), DatError> {
        let tag = match &node.kind {
            NodeKind::Directory { .. } => "dir",
            NodeKind::Group { .. } => "game",
            NodeKind::Leaf(digest) => {
                let size = digest.size.to_string();
                let crc = digest.crc32_hex();
                let md5 = digest.md5_hex();
                let sha1 = digest.sha1_hex();
                let rom = BytesStart::new("rom").with_attributes([
                    ("name", node.name.as_str()),
                    ("size", size.as_str()),
                    ("crc", crc.as_str()),
                    ("md5", md5.as_str()),
                    ("sha1", sha1.as_str()),
                ]);
                return emit(xml, Event::Empty(rom));
            }
        };

        let start = BytesStart::new(tag).with_attributes([("name", node.name.as_str())]);
        if node.children().is_empty() {
            return emit(xml, Event::Empty(start));
        }

        emit(xml, Event::Start(start))?;
        for child in self.tree.children(node.id) {
            self.write_node(xml, child)?;
        }
        emit(xml, Event::End(BytesEnd::new(tag)))
    }

    /// Write the document to `path` atomically.
    ///
    /// The content goes to a temporary file next to `path` which is then
    /// renamed over it, so `path` never holds a half-written document.
    pub fn save(&self, path: &Path) -> Result<(), DatError> {
        let bytes = self.to_bytes()?;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut file = NamedTempFile::new_in(dir).map_err(|e| DatError::write(path, e))?;

        file.write_all(&bytes).map_err(|e| DatError::write(path, e))?;
        file.as_file()
            .sync_all()
            .map_err(|e| DatError::write(path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o644))
                .map_err(|e| DatError::write(path, e))?;
        }

        file.persist(path)
            .map_err(|e| DatError::write(path, e.error))?;

        debug!(path = %path.display(), bytes = bytes.len(), "DAT written");
        Ok(())
    }
}

fn emit<W: Write>(xml: &mut Writer<W>, event: Event<'_>) -> Result<(), DatError> {
    xml.write_event(event).map_err(DatError::xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirdat_core::{DigestResult, TreeBuilder};

    fn digest() -> DigestResult {
        DigestResult {
            size: 3,
            crc32: 0x352441c2,
            md5: [
                0x90, 0x01, 0x50, 0x98, 0x3c, 0xd2, 0x4f, 0xb0, 0xd6, 0x96, 0x3f, 0x7d, 0x28, 0xe1,
                0x7f, 0x72,
            ],
            sha1: [0xa9; 20],
        }
    }

    fn render(header: &DatHeader, packing: Option<ForcePacking>, tree: &DatTree) -> String {
        let bytes = DatDocument::new(header, packing, tree).to_bytes().unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_declaration_and_root() {
        let xml = render(&DatHeader::default(), None, &DatTree::new());
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("<datafile>"));
        assert!(xml.trim_end().ends_with("</datafile>"));
    }

    #[test]
    fn test_header_fields_in_order() {
        let header = DatHeader {
            name: Some("Set".into()),
            author: Some("me".into()),
            date: Some("2024-05-06".into()),
            ..Default::default()
        };
        let xml = render(&header, Some(ForcePacking::FileOnly), &DatTree::new());

        let name = xml.find("<name>Set</name>").unwrap();
        let date = xml.find("<date>2024-05-06</date>").unwrap();
        let author = xml.find("<author>me</author>").unwrap();
        assert!(name < date && date < author);
        assert!(xml.contains("<romvault forcepacking=\"fileonly\"/>"));
        assert!(!xml.contains("<description>"));
    }

    #[test]
    fn test_nested_dir_game_rom() {
        let mut builder = TreeBuilder::new();
        builder.insert(&["Cat"], "Proj & Co", "docs/m.pdf", digest());
        let xml = render(&DatHeader::default(), None, &builder.finish());

        assert!(xml.contains("<dir name=\"Cat\">"));
        assert!(xml.contains("<game name=\"Proj &amp; Co\">"));
        assert!(xml.contains("<rom name=\"docs/m.pdf\" size=\"3\" crc=\"352441c2\""));
        assert!(xml.contains("md5=\"900150983cd24fb0d6963f7d28e17f72\""));
    }

    #[test]
    fn test_empty_group_is_self_closing() {
        let tree = TreeBuilder::with_global_group("DAT").finish();
        let xml = render(&DatHeader::default(), None, &tree);
        assert!(xml.contains("<game name=\"DAT\"/>"));
    }
}
