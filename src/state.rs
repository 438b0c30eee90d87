//! Save state support.
//!
//! Every hardware component that needs to survive a save/restore cycle
//! implements [`StateComponent`], serializing its fields into a flat,
//! self-describing byte buffer. The format is implementation-defined:
//! it only needs to round-trip within this emulator, not interoperate
//! with any external save-state standard.

use crate::error::Error;

/// Selects the wire format used by [`StateComponent::state`] and
/// [`StateComponent::set_state`]. Only one format exists today, but the
/// parameter keeps the door open for a more compact encoding later
/// without breaking the trait signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateFormat {
    #[default]
    Bin,
}

/// Implemented by every component whose internal state must be
/// captured by [`crate::gb::GameBoy::save_state`] and restored by
/// [`crate::gb::GameBoy::load_state`].
pub trait StateComponent {
    fn state(&self, format: Option<StateFormat>) -> Result<Vec<u8>, Error>;
    fn set_state(&mut self, data: &[u8], format: Option<StateFormat>) -> Result<(), Error>;
}

pub(crate) fn write_u8(buffer: &mut Vec<u8>, value: u8) {
    buffer.push(value);
}

pub(crate) fn write_u16(buffer: &mut Vec<u8>, value: u16) {
    buffer.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_bool(buffer: &mut Vec<u8>, value: bool) {
    buffer.push(u8::from(value));
}

pub(crate) fn write_u32(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn read_u8(cursor: &mut std::io::Cursor<&[u8]>) -> Result<u8, Error> {
    use std::io::Read;
    let mut byte = [0u8; 1];
    cursor
        .read_exact(&mut byte)
        .map_err(|_| Error::StateIncompatible)?;
    Ok(byte[0])
}

pub(crate) fn read_u16(cursor: &mut std::io::Cursor<&[u8]>) -> Result<u16, Error> {
    use std::io::Read;
    let mut bytes = [0u8; 2];
    cursor
        .read_exact(&mut bytes)
        .map_err(|_| Error::StateIncompatible)?;
    Ok(u16::from_le_bytes(bytes))
}

pub(crate) fn read_bool(cursor: &mut std::io::Cursor<&[u8]>) -> Result<bool, Error> {
    Ok(read_u8(cursor)? != 0)
}

pub(crate) fn read_u32(cursor: &mut std::io::Cursor<&[u8]>) -> Result<u32, Error> {
    use std::io::Read;
    let mut bytes = [0u8; 4];
    cursor
        .read_exact(&mut bytes)
        .map_err(|_| Error::StateIncompatible)?;
    Ok(u32::from_le_bytes(bytes))
}

pub(crate) fn write_bytes(buffer: &mut Vec<u8>, value: &[u8]) {
    buffer.extend_from_slice(value);
}

pub(crate) fn read_bytes(cursor: &mut std::io::Cursor<&[u8]>, len: usize) -> Result<Vec<u8>, Error> {
    use std::io::Read;
    let mut bytes = vec![0u8; len];
    cursor
        .read_exact(&mut bytes)
        .map_err(|_| Error::StateIncompatible)?;
    Ok(bytes)
}
