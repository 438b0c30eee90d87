//! Assorted utility functions and structures.

use std::{
    fs::File,
    io::{Read, Write},
    sync::{Arc, Mutex},
};

use crate::error::Error;

/// Shared thread type able to be passed between threads, used to hand
/// the global [`crate::gb::GameBoyConfig`] to every subcomponent without
/// tying their lifetimes to the owning [`crate::gb::GameBoy`].
pub type SharedThread<T> = Arc<Mutex<T>>;

/// Reads the contents of the file at the given path into a vector of bytes.
pub fn read_file(path: &str) -> Result<Vec<u8>, Error> {
    let mut file = File::open(path)
        .map_err(|_| Error::CustomError(format!("Failed to open file: {}", path)))?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)
        .map_err(|_| Error::CustomError(format!("Failed to read from file: {}", path)))?;
    Ok(data)
}

/// Writes the given data to the file at the given path.
pub fn write_file(path: &str, data: &[u8], flush: Option<bool>) -> Result<(), Error> {
    let mut file = File::create(path)
        .map_err(|_| Error::CustomError(format!("Failed to create file: {}", path)))?;
    file.write_all(data)
        .map_err(|_| Error::CustomError(format!("Failed to write to file: {}", path)))?;
    if flush.unwrap_or(true) {
        file.flush()
            .map_err(|_| Error::CustomError(format!("Failed to flush file: {}", path)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{read_file, write_file};
    use std::env::temp_dir;

    #[test]
    fn test_write_read_roundtrip() {
        let path = temp_dir().join("rboy_dmg_util_test.bin");
        let path = path.to_str().unwrap();
        write_file(path, &[1, 2, 3, 4], None).unwrap();
        let data = read_file(path).unwrap();
        assert_eq!(data, vec![1, 2, 3, 4]);
        std::fs::remove_file(path).unwrap();
    }
}
