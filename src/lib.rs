//! Character to glyph mapping for TrueType / OpenType fonts.
//!
//! Parses the sfnt table directory, the `cmap` table and it's format 0 and
//! format 4 subtables straight from an in-memory font file. Every read goes
//! through [`buffer::ByteCursor`], so malformed fonts surface as errors.

use std::io;

use buffer::ByteCursorError;
use tables::{TableDirectoryError, cmap::CmapError};
use thiserror::Error;

pub mod buffer;
pub mod font;
pub mod tables;

pub use font::{Font, FontBuffer};
pub use tables::{
    Tag, TableDirectory, TableRecord,
    cmap::{CmapDirectory, CmapResolver, EncodingRecord, Format, Subtable, SubtableSelector},
};

#[derive(Debug, Error)]
pub enum VeroCmapError {
    #[error(transparent)]
    ByteCursor(#[from] ByteCursorError),

    #[error(transparent)]
    TableDirectory(#[from] TableDirectoryError),

    #[error(transparent)]
    Cmap(#[from] CmapError),

    #[error(transparent)]
    ReadError(#[from] io::Error),
}
