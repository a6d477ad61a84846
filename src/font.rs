use std::{io::Read, ops::Deref};

use crate::{
    VeroCmapError,
    tables::{
        Tag, TableDirectory, TableDirectoryError,
        cmap::{CmapDirectory, CmapResolver},
    },
};

/// The whole font file, loaded once and never mutated.
///
/// Everything parsed from it borrows these bytes, so the buffer outlives
/// every directory, subtable and resolver built on top of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontBuffer {
    data: Box<[u8]>,
}

impl FontBuffer {
    /// Reads the entire font from anything which implements read,
    /// the most obvious use case would be a File
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, VeroCmapError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;

        log::debug!("loaded {} bytes of font data", data.len());

        Ok(Self::from(data))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for FontBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self {
            data: data.into_boxed_slice(),
        }
    }
}

impl Deref for FontBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

/// A parsed font, the table directory plus the bytes it indexes
#[derive(Debug, Clone)]
pub struct Font<'a> {
    data: &'a [u8],
    directory: TableDirectory,
}

impl<'a> Font<'a> {
    /// Parses the table directory of a loaded font
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use vero_cmap::{Font, FontBuffer, SubtableSelector};
    ///
    /// # fn main() -> Result<(), vero_cmap::VeroCmapError> {
    /// let buffer = FontBuffer::from_reader(File::open("Inconsolata-Regular.ttf")?)?;
    /// let font = Font::parse(&buffer)?;
    ///
    /// let windows_bmp = SubtableSelector::Encoding { platform_id: 3, encoding_id: 1 };
    /// let glyphs = font.resolver()?.resolve(windows_bmp, "Hello".chars().map(u32::from))?;
    /// println!("{glyphs:?}");
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse(buffer: &'a FontBuffer) -> Result<Self, VeroCmapError> {
        Self::from_bytes(buffer.as_bytes())
    }

    pub fn from_bytes(data: &'a [u8]) -> Result<Self, VeroCmapError> {
        Ok(Self {
            data,
            directory: TableDirectory::parse(data)?,
        })
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn directory(&self) -> &TableDirectory {
        &self.directory
    }

    /// Locates and parses the cmap table
    ///
    /// # Errors
    ///
    /// * `TableDirectoryError::MissingTable` if the font has no cmap table.
    /// * Anything [`CmapDirectory::parse`] reports.
    pub fn cmap(&self) -> Result<CmapDirectory<'a>, VeroCmapError> {
        let record = self
            .directory
            .lookup(Tag::CMAP)
            .ok_or(TableDirectoryError::MissingTable(Tag::CMAP))?;

        CmapDirectory::parse(self.data, &record)
    }

    pub fn resolver(&self) -> Result<CmapResolver<'a>, VeroCmapError> {
        Ok(CmapResolver::new(self.cmap()?))
    }
}
