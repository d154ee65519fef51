use serde::{de::DeserializeOwned, Serialize};
use std::{fs, io, path::Path};

/// An error that occurred during reading or writing a TOML file.
#[derive(thiserror::Error, Debug)]
pub enum TomlFileError {
    #[error("I/O error while reading/writing TOML file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML deserialization error while reading TOML file: {0}")]
    TomlDeserializationError(#[from] toml::de::Error),

    #[error("TOML serialization error while writing TOML file: {0}")]
    TomlSerializationError(#[from] toml::ser::Error),
}

/// Serializes the given value as TOML and writes it to the given file path.
///
/// Intermediate directories are created as needed, since exchange artifacts
/// are often written before the phase that owns their directory ran.
///
/// # Errors
///
/// Will return `Err` if the file couldn't be written or the value couldn't be serialized as a TOML string.
pub fn write_toml_file(
    value: &impl Serialize,
    path: impl AsRef<Path>,
) -> Result<(), TomlFileError> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml::to_string(value)?)?;

    Ok(())
}

/// Reads the file at the given path and parses it as `A`.
///
/// # Errors
///
/// Will return `Err` if the file couldn't be read or its contents couldn't be deserialized.
pub fn read_toml_file<A: DeserializeOwned>(path: impl AsRef<Path>) -> Result<A, TomlFileError> {
    let contents = fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

/// Reads the file at the given path and parses it as `A`, treating a missing
/// file as the empty document.
///
/// The buildpack exchange protocol specifies that absent documents are
/// equivalent to empty ones, so most exchange files are read through this
/// function rather than [`read_toml_file`].
///
/// # Errors
///
/// Will return `Err` if the file exists but couldn't be read or deserialized.
pub fn read_optional_toml_file<A: DeserializeOwned + Default>(
    path: impl AsRef<Path>,
) -> Result<A, TomlFileError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(io_error) if io_error.kind() == io::ErrorKind::NotFound => Ok(A::default()),
        Err(io_error) => Err(io_error.into()),
    }
}
