// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Translation file extraction.
//!
//! Translation files are XML documents made of `context` elements, each one
//! holding a `name` and a list of `message` elements. A message carries its
//! untranslated `source` text, its `translation`, and optionally an `id`
//! attribute. Only two contexts matter here, see [`CAPTIONS_CONTEXT`] and
//! [`PACKAGE_NAMES_CONTEXT`].

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use std::{fs::read_to_string, path::Path};
use tracing::{debug, instrument};

/// Context holding application captions.
pub const CAPTIONS_CONTEXT: &str = "QtApplicationCaptions";

/// Context holding package names.
pub const PACKAGE_NAMES_CONTEXT: &str = "QtPackageNames";

/// Captions and package names extracted from translation file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Captions {
    /// Short application caption.
    pub short_caption: String,

    /// Long application caption.
    pub long_caption: String,

    /// Package name.
    pub package_name: String,

    /// Smart installer package name.
    pub installer_package_name: String,
}

/// Field of [`Captions`] a message can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ShortCaption,
    LongCaption,
    PackageName,
    InstallerPackageName,
}

impl Field {
    const ALL: [Field; 4] = [
        Self::ShortCaption,
        Self::LongCaption,
        Self::PackageName,
        Self::InstallerPackageName,
    ];

    fn id_prefix(&self) -> &'static str {
        match self {
            Self::ShortCaption => "qtn_short_caption_",
            Self::LongCaption => "qtn_long_caption_",
            Self::PackageName => "qtn_package_name_",
            Self::InstallerPackageName => "qtn_smart_installer_package_name_",
        }
    }

    fn source_text(&self) -> &'static str {
        match self {
            Self::ShortCaption => "Application short caption",
            Self::LongCaption => "Application long caption",
            Self::PackageName => "Package name",
            Self::InstallerPackageName => "Smart installer package name",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl Captions {
    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::ShortCaption => &mut self.short_caption,
            Field::LongCaption => &mut self.long_caption,
            Field::PackageName => &mut self.package_name,
            Field::InstallerPackageName => &mut self.installer_package_name,
        }
    }
}

/// Captions under construction, tracking which fields were matched by id.
#[derive(Debug, Default)]
struct Extraction {
    captions: Captions,
    matched_by_id: [bool; 4],
}

impl Extraction {
    fn apply(&mut self, id: Option<&str>, source: &str, translation: String) {
        if let Some(id) = id {
            if let Some(field) = Field::ALL.into_iter().find(|field| id.starts_with(field.id_prefix())) {
                *self.captions.field_mut(field) = translation;
                self.matched_by_id[field.index()] = true;
                return;
            }
        }

        // INVARIANT: Source text matching never overrides id matching.
        if let Some(field) = Field::ALL.into_iter().find(|field| source == field.source_text()) {
            let matched_by_id = self.matched_by_id[field.index()];
            let value = self.captions.field_mut(field);
            if value.is_empty() && !matched_by_id {
                *value = translation;
            }
        }
    }
}

/// Extract captions from translation file.
///
/// # Errors
///
/// - Return [`ExtractError::Read`] if file cannot be read.
/// - Return [`ExtractError::Xml`] if file is malformed.
#[instrument(level = "debug")]
pub fn extract_captions(path: &Path) -> Result<Captions> {
    let data = read_to_string(path).map_err(|err| ExtractError::Read {
        source: err,
        path: path.to_path_buf(),
    })?;

    parse_captions(&data).map_err(|err| err.at(path))
}

/// Extract captions from translation file contents.
///
/// # Errors
///
/// - Return [`ExtractError::Xml`] if contents are malformed.
/// - Return [`ExtractError::Truncated`] if contents end inside an element.
pub fn parse_captions(data: &str) -> Result<Captions> {
    let mut reader = TsReader::new(data);
    let mut extraction = Extraction::default();

    while let Some(element) = reader.next_start_element()? {
        if element.name().as_ref() == b"context" {
            read_context(&mut reader, &mut extraction)?;
        }
    }

    Ok(extraction.captions)
}

fn read_context(reader: &mut TsReader<'_>, extraction: &mut Extraction) -> Result<()> {
    let mut recognized = false;
    while let Some(element) = reader.next_child_element()? {
        match element.name().as_ref() {
            b"name" => {
                let name = reader.read_element_text(true)?;
                recognized = name == CAPTIONS_CONTEXT || name == PACKAGE_NAMES_CONTEXT;
                debug!("context {name:?} recognized: {recognized}");
            }
            b"message" if recognized => read_message(reader, &element, extraction)?,
            _ => reader.skip_current_element(&element)?,
        }
    }

    Ok(())
}

fn read_message(
    reader: &mut TsReader<'_>,
    message: &BytesStart<'_>,
    extraction: &mut Extraction,
) -> Result<()> {
    let id = reader.attribute(message, "id")?;
    let mut source = String::new();
    let mut translation = String::new();

    while let Some(element) = reader.next_child_element()? {
        match element.name().as_ref() {
            b"source" => source = reader.read_element_text(true)?,
            b"translation" => translation = reader.read_element_text(true)?,
            _ => reader.skip_current_element(&element)?,
        }
    }

    extraction.apply(id.as_deref(), &source, translation);

    Ok(())
}

/// Streaming element reader over translation file markup.
///
/// Self-closing elements are reported like empty start elements, so callers
/// never need to tell the two apart.
struct TsReader<'a> {
    reader: Reader<&'a [u8]>,
    pending_empty: bool,
}

impl<'a> TsReader<'a> {
    fn new(data: &'a str) -> Self {
        let mut reader = Reader::from_str(data);
        reader.config_mut().trim_text(true);

        Self {
            reader,
            pending_empty: false,
        }
    }

    /// Advance to next start element at any depth.
    fn next_start_element(&mut self) -> Result<Option<BytesStart<'a>>> {
        loop {
            match self.read_event()? {
                Event::Start(element) => {
                    self.pending_empty = false;
                    return Ok(Some(element));
                }
                Event::Empty(element) => {
                    self.pending_empty = true;
                    return Ok(Some(element));
                }
                Event::Eof => return Ok(None),
                _ => continue,
            }
        }
    }

    /// Advance to next child of current element.
    ///
    /// Returns `None` once the current element ends.
    fn next_child_element(&mut self) -> Result<Option<BytesStart<'a>>> {
        if self.pending_empty {
            self.pending_empty = false;
            return Ok(None);
        }

        loop {
            match self.read_event()? {
                Event::Start(element) => {
                    self.pending_empty = false;
                    return Ok(Some(element));
                }
                Event::Empty(element) => {
                    self.pending_empty = true;
                    return Ok(Some(element));
                }
                Event::End(_) => return Ok(None),
                Event::Eof => return Err(ExtractError::Truncated { path: Default::default() }),
                _ => continue,
            }
        }
    }

    /// Read text of current element, optionally skipping child elements.
    fn read_element_text(&mut self, skip_children: bool) -> Result<String> {
        if self.pending_empty {
            self.pending_empty = false;
            return Ok(String::new());
        }

        let mut text = String::new();
        loop {
            match self.read_event()? {
                Event::Text(content) => {
                    text.push_str(&content.unescape().map_err(|err| self.xml_error(err))?)
                }
                Event::CData(content) => text.push_str(&String::from_utf8_lossy(&content)),
                Event::Start(child) if skip_children => {
                    self.reader
                        .read_to_end(child.name())
                        .map_err(|err| self.xml_error(err))?;
                }
                Event::Start(_) => return Err(ExtractError::UnexpectedChild { path: Default::default() }),
                Event::End(_) => return Ok(text),
                Event::Eof => return Err(ExtractError::Truncated { path: Default::default() }),
                _ => continue,
            }
        }
    }

    /// Skip current element along with all of its children.
    fn skip_current_element(&mut self, element: &BytesStart<'_>) -> Result<()> {
        if self.pending_empty {
            self.pending_empty = false;
            return Ok(());
        }

        self.reader
            .read_to_end(element.name())
            .map_err(|err| self.xml_error(err))?;

        Ok(())
    }

    /// Unescaped value of attribute on element.
    fn attribute(&self, element: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
        let attribute = element
            .try_get_attribute(name)
            .map_err(|err| self.xml_error(err.into()))?;

        match attribute {
            Some(attribute) => {
                let value = attribute
                    .unescape_value()
                    .map_err(|err| self.xml_error(err))?;
                Ok(Some(value.into_owned()))
            }
            None => Ok(None),
        }
    }

    fn read_event(&mut self) -> Result<Event<'a>> {
        self.reader.read_event().map_err(|err| self.xml_error(err))
    }

    fn xml_error(&self, err: quick_xml::Error) -> ExtractError {
        ExtractError::Xml {
            source: err,
            position: self.reader.buffer_position() as u64,
            path: Default::default(),
        }
    }
}

/// Translation file extraction error types.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Translation file cannot be read.
    #[error("failed to read translation file {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    /// Translation file markup is malformed.
    #[error("malformed translation file {:?} at byte {position}", path.display())]
    Xml {
        #[source]
        source: quick_xml::Error,
        position: u64,
        path: std::path::PathBuf,
    },

    /// Translation file ends inside an element.
    #[error("translation file {:?} ends unexpectedly", path.display())]
    Truncated { path: std::path::PathBuf },

    /// Text element holds unexpected child element.
    #[error("translation file {:?} has unexpected child element in text", path.display())]
    UnexpectedChild { path: std::path::PathBuf },
}

impl ExtractError {
    /// Attach translation file path to error.
    fn at(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            Self::Xml { source, position, .. } => Self::Xml {
                source,
                position,
                path,
            },
            Self::Truncated { .. } => Self::Truncated { path },
            Self::UnexpectedChild { .. } => Self::UnexpectedChild { path },
            read @ Self::Read { .. } => read,
        }
    }
}

/// Friendly result alias :3
type Result<T, E = ExtractError> = std::result::Result<T, E>;
