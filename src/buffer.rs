use thiserror::Error;

macro_rules! impl_read {
    ($fn_name:ident, $peek_name:ident, $typ:ty) => {
        pub fn $fn_name(&mut self) -> Result<$typ, ByteCursorError> {
            let value = self.$peek_name(self.pos)?;
            self.pos += size_of::<$typ>();

            Ok(value)
        }

        pub fn $peek_name(&self, offset: usize) -> Result<$typ, ByteCursorError> {
            let bytes = self.bytes_at(offset, size_of::<$typ>())?;
            let mut raw = [0u8; size_of::<$typ>()];
            raw.copy_from_slice(bytes);

            Ok(<$typ>::from_be_bytes(raw))
        }
    };
}

/// Represents the possible errors that can occur when using `ByteCursor`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ByteCursorError {
    /// A read of `size` bytes at `offset` would go past the end of a
    /// buffer holding `len` bytes.
    #[error("Read of {size} bytes at offset {offset} is out of bounds for a buffer of {len} bytes")]
    OutOfBounds {
        offset: usize,
        size: usize,
        len: usize,
    },
}

/// A bounds checked, big-endian reader over an immutable byte slice.
///
/// Every read converts from the file's big-endian order to native order and
/// validates `position + size <= len` before touching the data, so a corrupt
/// offset surfaces as [`ByteCursorError::OutOfBounds`] instead of a panic.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Returns a new cursor positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns a new cursor positioned at `offset` within `data`
    ///
    /// # Examples
    ///
    /// ```
    /// use vero_cmap::buffer::ByteCursor;
    ///
    /// let data = [0, 0, 0, 10, 0, 0, 0, 20]; // two u32 values: 10 and 20 in big-endian
    /// let mut cursor = ByteCursor::at(&data, 4).unwrap();
    ///
    /// assert_eq!(cursor.read_u32().unwrap(), 20);
    /// assert!(cursor.read_u32().is_err());
    /// ```
    pub fn at(data: &'a [u8], offset: usize) -> Result<Self, ByteCursorError> {
        let mut cursor = Self::new(data);
        cursor.seek_to(offset)?;

        Ok(cursor)
    }

    /// Moves the cursor to an absolute position from the start of the buffer.
    /// Seeking to exactly the end of the buffer is allowed.
    pub fn seek_to(&mut self, pos: usize) -> Result<(), ByteCursorError> {
        if pos > self.data.len() {
            return Err(self.out_of_bounds(pos, 0));
        }

        self.pos = pos;
        Ok(())
    }

    /// Skips n bytes from the CURRENT cursor position
    ///
    /// # Examples
    ///
    /// ```
    /// use vero_cmap::buffer::ByteCursor;
    ///
    /// let data = [0, 0, 0, 10, 0, 0, 0, 20];
    /// let mut cursor = ByteCursor::new(&data);
    ///
    /// assert_eq!(cursor.read_u32().unwrap(), 10);
    ///
    /// // Skip the second u32, reading past it must fail
    /// cursor.skip(4).unwrap();
    /// assert!(cursor.read_u32().is_err());
    /// ```
    pub fn skip(&mut self, n: usize) -> Result<(), ByteCursorError> {
        let target = self
            .pos
            .checked_add(n)
            .ok_or_else(|| self.out_of_bounds(self.pos, n))?;

        self.seek_to(target)
            .map_err(|_| self.out_of_bounds(self.pos, n))
    }

    /// Reads `n` raw bytes and advances past them
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ByteCursorError> {
        let bytes = self.bytes_at(self.pos, n)?;
        self.pos += n;

        Ok(bytes)
    }

    /// Random access u16 read at an absolute offset, the cursor does not move.
    pub fn peek_at(&self, offset: usize) -> Result<u16, ByteCursorError> {
        self.peek_u16_at(offset)
    }

    /// Returns `n` bytes starting at the absolute `offset` without moving the cursor
    pub fn bytes_at(&self, offset: usize, n: usize) -> Result<&'a [u8], ByteCursorError> {
        let end = offset
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| self.out_of_bounds(offset, n))?;

        Ok(&self.data[offset..end])
    }

    /// The current position, in bytes from the start of the buffer
    pub fn position(&self) -> usize {
        self.pos
    }

    /// How many bytes are left between the cursor and the end of the buffer
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// The whole underlying buffer
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    fn out_of_bounds(&self, offset: usize, size: usize) -> ByteCursorError {
        ByteCursorError::OutOfBounds {
            offset,
            size,
            len: self.data.len(),
        }
    }

    impl_read!(read_u8, peek_u8_at, u8);
    impl_read!(read_u16, peek_u16_at, u16);
    impl_read!(read_i16, peek_i16_at, i16);
    impl_read!(read_u32, peek_u32_at, u32);
}
