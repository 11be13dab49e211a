//! DAT document parsing.
//!
//! Reads back the documents produced by [`crate::DatDocument`]: header
//! fields, the RomVault packing marker, and every rom with the names of the
//! `dir` / `game` elements above it.

use std::collections::HashMap;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::DatError;

/// One rom element and the element path above it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RomEntry {
    /// Names of the enclosing `dir` elements followed by the `game` name.
    pub group_path: Vec<String>,
    /// Rom name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// CRC-32, lowercase hex.
    pub crc: String,
    /// MD5, lowercase hex.
    pub md5: String,
    /// SHA-1, lowercase hex.
    pub sha1: String,
}

/// Parsed contents of a DAT document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatFile {
    /// Header fields in document order.
    pub header: Vec<(String, String)>,
    /// Value of the `romvault forcepacking` marker.
    pub force_packing: Option<String>,
    /// Path of every game element, including empty ones.
    pub games: Vec<Vec<String>>,
    /// Every rom in document order.
    pub roms: Vec<RomEntry>,
}

impl DatFile {
    /// Value of a header field.
    pub fn header_value(&self, tag: &str) -> Option<&str> {
        self.header
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Dir,
    Game,
}

/// Read and parse a DAT file.
pub fn read_dat(path: &Path) -> Result<DatFile, DatError> {
    let text = std::fs::read_to_string(path).map_err(|source| DatError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_dat(&text)
}

/// Parse a DAT document.
pub fn parse_dat(text: &str) -> Result<DatFile, DatError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut dat = DatFile::default();
    let mut stack: Vec<(Container, String)> = Vec::new();
    let mut seen_root = false;
    let mut in_header = false;
    let mut field: Option<String> = None;

    loop {
        match reader.read_event().map_err(DatError::xml)? {
            Event::Start(e) => match e.name().as_ref() {
                b"datafile" => seen_root = true,
                b"header" => in_header = true,
                b"dir" => open_container(&mut dat, &mut stack, Container::Dir, &e)?,
                b"game" => open_container(&mut dat, &mut stack, Container::Game, &e)?,
                b"rom" => dat.roms.push(parse_rom(&stack, &e)?),
                tag if in_header => field = Some(String::from_utf8_lossy(tag).into_owned()),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"romvault" if in_header => {
                    dat.force_packing = attributes(&e)?.remove("forcepacking");
                }
                b"rom" => dat.roms.push(parse_rom(&stack, &e)?),
                b"game" => {
                    let mut path = names(&stack);
                    path.push(required(&mut attributes(&e)?, "name", "game")?);
                    dat.games.push(path);
                }
                _ => {}
            },
            Event::Text(t) => {
                if let Some(tag) = field.as_ref() {
                    let value = t.unescape().map_err(DatError::xml)?.into_owned();
                    dat.header.push((tag.clone(), value));
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"header" => in_header = false,
                b"dir" | b"game" => {
                    stack.pop();
                }
                _ => field = None,
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(DatError::malformed("missing <datafile> root element"));
    }
    Ok(dat)
}

fn open_container(
    dat: &mut DatFile,
    stack: &mut Vec<(Container, String)>,
    kind: Container,
    element: &BytesStart<'_>,
) -> Result<(), DatError> {
    let tag = if kind == Container::Dir { "dir" } else { "game" };
    let name = required(&mut attributes(element)?, "name", tag)?;
    stack.push((kind, name));
    if kind == Container::Game {
        dat.games.push(names(stack));
    }
    Ok(())
}

fn parse_rom(
    stack: &[(Container, String)],
    element: &BytesStart<'_>,
) -> Result<RomEntry, DatError> {
    if !matches!(stack.last(), Some((Container::Game, _))) {
        return Err(DatError::malformed("<rom> outside of a <game>"));
    }

    let mut attrs = attributes(element)?;
    let size = required(&mut attrs, "size", "rom")?;
    let size = size
        .parse()
        .map_err(|_| DatError::malformed(format!("invalid rom size '{size}'")))?;

    Ok(RomEntry {
        group_path: names(stack),
        name: required(&mut attrs, "name", "rom")?,
        size,
        crc: required(&mut attrs, "crc", "rom")?,
        md5: required(&mut attrs, "md5", "rom")?,
        sha1: required(&mut attrs, "sha1", "rom")?,
    })
}

fn names(stack: &[(Container, String)]) -> Vec<String> {
    stack.iter().map(|(_, name)| name.clone()).collect()
}

fn attributes(element: &BytesStart<'_>) -> Result<HashMap<String, String>, DatError> {
    let mut map = HashMap::new();
    for attr in element.attributes() {
        let attr = attr.map_err(DatError::xml)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(DatError::xml)?.into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

fn required(
    attrs: &mut HashMap<String, String>,
    key: &str,
    tag: &str,
) -> Result<String, DatError> {
    attrs
        .remove(key)
        .ok_or_else(|| DatError::malformed(format!("<{tag}> without '{key}' attribute")))
}
