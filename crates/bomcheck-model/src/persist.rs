//! Shared YAML persistence for the stores: missing or empty files load as
//! the default value, saves go through an atomic replace.

use crate::StoreError;
use atomicwrites::{AtomicFile, OverwriteBehavior};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::Path;

pub(crate) fn load<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    if !path.exists() {
        log::debug!("{} not found, starting empty", path.display());
        return Ok(T::default());
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_yaml::from_str(&content)?)
}

pub(crate) fn save<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let yaml = serde_yaml::to_string(value)?;
    let file = AtomicFile::new(path, OverwriteBehavior::AllowOverwrite);
    match file.write(|f| f.write_all(yaml.as_bytes())) {
        Ok(()) => Ok(()),
        Err(atomicwrites::Error::Internal(e)) | Err(atomicwrites::Error::User(e)) => {
            Err(StoreError::Io(e))
        }
    }
}
