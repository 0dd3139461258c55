//! Wire layout of an encrypted frame.
//!
//! ```text
//! offset 0                  : MAC        (mac_len bytes)
//! offset mac_len            : nonce      (nonce_len bytes)
//! offset mac_len+nonce_len  : ciphertext (text_len bytes)
//! ```
//!
//! Total length is fixed for a configured plaintext size, so real frames and
//! cover frames cannot be told apart by length.

use std::ops::Range;

use crate::error::CipherError;

/// Field sizes and offsets of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    mac_len: usize,
    nonce_len: usize,
    text_len: usize,
}

/// Borrowed view of the three frame fields.
#[derive(Debug, Clone, Copy)]
pub struct FrameParts<'a> {
    /// Embedded MAC
    pub mac: &'a [u8],
    /// Full nonce field
    pub nonce: &'a [u8],
    /// Ciphertext segment
    pub text: &'a [u8],
}

/// Mutable view of the three frame fields, used while assembling a frame.
#[derive(Debug)]
pub struct FramePartsMut<'a> {
    /// MAC field
    pub mac: &'a mut [u8],
    /// Nonce field
    pub nonce: &'a mut [u8],
    /// Ciphertext segment
    pub text: &'a mut [u8],
}

impl FrameLayout {
    /// Layout for the given field sizes.
    pub const fn new(mac_len: usize, nonce_len: usize, text_len: usize) -> Self {
        Self { mac_len, nonce_len, text_len }
    }

    /// Byte range of the MAC field.
    pub const fn mac_range(&self) -> Range<usize> {
        0..self.mac_len
    }

    /// Byte range of the nonce field.
    pub const fn nonce_range(&self) -> Range<usize> {
        self.mac_len..self.mac_len + self.nonce_len
    }

    /// Byte range of the ciphertext segment.
    pub const fn text_range(&self) -> Range<usize> {
        self.mac_len + self.nonce_len..self.total_len()
    }

    /// Length of the ciphertext segment (equals the plaintext size).
    pub const fn text_len(&self) -> usize {
        self.text_len
    }

    /// Total frame length.
    pub const fn total_len(&self) -> usize {
        self.mac_len + self.nonce_len + self.text_len
    }

    /// Split a frame into its fields.
    ///
    /// # Errors
    ///
    /// - `InvalidFrameLength` if `frame.len() != self.total_len()`
    pub fn split<'a>(&self, frame: &'a [u8]) -> Result<FrameParts<'a>, CipherError> {
        self.check_len(frame.len())?;
        let (mac, rest) = frame.split_at(self.mac_len);
        let (nonce, text) = rest.split_at(self.nonce_len);
        Ok(FrameParts { mac, nonce, text })
    }

    /// Split a frame buffer into mutable fields.
    ///
    /// # Errors
    ///
    /// - `InvalidFrameLength` if `frame.len() != self.total_len()`
    pub fn split_mut<'a>(&self, frame: &'a mut [u8]) -> Result<FramePartsMut<'a>, CipherError> {
        self.check_len(frame.len())?;
        let (mac, rest) = frame.split_at_mut(self.mac_len);
        let (nonce, text) = rest.split_at_mut(self.nonce_len);
        Ok(FramePartsMut { mac, nonce, text })
    }

    fn check_len(&self, actual: usize) -> Result<(), CipherError> {
        if actual == self.total_len() {
            Ok(())
        } else {
            Err(CipherError::InvalidFrameLength { expected: self.total_len(), actual })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_packet_offsets() {
        let layout = FrameLayout::new(16, 16, 1455);

        assert_eq!(layout.mac_range(), 0..16);
        assert_eq!(layout.nonce_range(), 16..32);
        assert_eq!(layout.text_range(), 32..1487);
        assert_eq!(layout.total_len(), 1487);
    }

    #[test]
    fn split_returns_fields_in_order() {
        let layout = FrameLayout::new(2, 3, 4);
        let frame = [1, 1, 2, 2, 2, 3, 3, 3, 3];

        let parts = layout.split(&frame).unwrap();
        assert_eq!(parts.mac, &[1, 1]);
        assert_eq!(parts.nonce, &[2, 2, 2]);
        assert_eq!(parts.text, &[3, 3, 3, 3]);
    }

    #[test]
    fn split_mut_writes_through() {
        let layout = FrameLayout::new(1, 1, 2);
        let mut frame = [0u8; 4];

        let parts = layout.split_mut(&mut frame).unwrap();
        parts.mac.fill(9);
        parts.text.fill(7);

        assert_eq!(frame, [9, 0, 7, 7]);
    }

    #[test]
    fn split_rejects_wrong_length() {
        let layout = FrameLayout::new(16, 16, 10);
        let result = layout.split(&[0u8; 41]);

        assert!(matches!(
            result,
            Err(CipherError::InvalidFrameLength { expected: 42, actual: 41 })
        ));
    }
}
