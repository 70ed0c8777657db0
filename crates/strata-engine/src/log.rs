//! Append-only log: every write is a `[key_len][value_len][key][value]`
//! record; a zero-length value is a tombstone. Reopening a store replays
//! the whole log to rebuild the in-memory index, the same convention
//! `compact` relies on when it rewrites the log with only live entries.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{Error, Result};

const MAX_RECORD_KEY_LEN: u32 = 1024;
const MAX_RECORD_VALUE_LEN: u32 = 64 * 1024 * 1024;

pub(crate) struct Log {
    pub(crate) path: PathBuf,
    file: File,
}

impl Log {
    pub(crate) fn open(path: &Path, io_perms: u32, io_flags: i32) -> Result<Self> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }

        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(io_perms);
            options.custom_flags(io_flags);
        }
        #[cfg(not(unix))]
        let _ = (io_perms, io_flags);

        let file = options.open(path)?;
        file.try_lock_exclusive().map_err(|_| Error::FileLocked)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Replays every record, returning the resulting ordered-by-insertion
    /// `(key, value)` pairs a caller can fold into its own index; a
    /// zero-length value means "delete this key", matching `write_entry`.
    pub(crate) fn replay(&mut self) -> Result<Vec<(Vec<u8>, Option<Vec<u8>>)>> {
        let file_len = self.file.metadata()?.len();
        let mut reader = BufReader::new(&mut self.file);
        let mut pos = reader.seek(SeekFrom::Start(0))?;
        let mut records = Vec::new();

        let mut len_buf = [0u8; 4];
        while pos < file_len {
            reader.read_exact(&mut len_buf).map_err(|e| {
                Error::Corrupted(format!("truncated key length at offset {pos}: {e}"))
            })?;
            let key_len = u32::from_be_bytes(len_buf);

            reader.read_exact(&mut len_buf).map_err(|e| {
                Error::Corrupted(format!("truncated value length at offset {}: {e}", pos + 4))
            })?;
            let value_len = u32::from_be_bytes(len_buf);

            if key_len > MAX_RECORD_KEY_LEN || value_len > MAX_RECORD_VALUE_LEN {
                return Err(Error::Corrupted(format!(
                    "implausible record lengths at offset {pos} (key {key_len}, value {value_len})"
                )));
            }

            let mut key = vec![0u8; key_len as usize];
            reader
                .read_exact(&mut key)
                .map_err(|e| Error::Corrupted(format!("truncated key at offset {pos}: {e}")))?;

            let value = if value_len == 0 {
                None
            } else {
                let mut value = vec![0u8; value_len as usize];
                reader.read_exact(&mut value).map_err(|e| {
                    Error::Corrupted(format!("truncated value at offset {pos}: {e}"))
                })?;
                Some(value)
            };

            pos += 8 + key_len as u64 + value_len as u64;
            records.push((key, value));
        }

        Ok(records)
    }

    pub(crate) fn append(&mut self, key: &[u8], value: Option<&[u8]>, sync: bool) -> Result<u64> {
        let value = value.unwrap_or(&[]);
        if key.len() as u64 > MAX_RECORD_KEY_LEN as u64 || value.len() as u64 > MAX_RECORD_VALUE_LEN as u64 {
            return Err(Error::EntryTooLarge);
        }

        let mut buffer = Vec::with_capacity(8 + key.len() + value.len());
        buffer.extend_from_slice(&(key.len() as u32).to_be_bytes());
        buffer.extend_from_slice(&(value.len() as u32).to_be_bytes());
        buffer.extend_from_slice(key);
        buffer.extend_from_slice(value);

        self.file.seek(SeekFrom::End(0))?;
        {
            let mut writer = BufWriter::with_capacity(buffer.len().max(4096), &mut self.file);
            writer.write_all(&buffer)?;
            writer.flush()?;
        }
        if sync {
            self.file.sync_all()?;
        }

        Ok(self.file.metadata()?.len())
    }

    pub(crate) fn len_bytes(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub(crate) fn sync(&mut self) -> Result<()> {
        self.file.sync_all().map_err(Error::from)
    }

    pub(crate) fn truncate(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        Ok(())
    }
}

impl Drop for Log {
    fn drop(&mut self) {
        let _ = self.file.sync_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_replay_reconstructs_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.bin");
        {
            let mut log = Log::open(&path, 0o644, 0).unwrap();
            log.append(b"a", Some(b"1"), true).unwrap();
            log.append(b"b", Some(b"2"), true).unwrap();
            log.append(b"a", None, true).unwrap();
        }
        let mut log = Log::open(&path, 0o644, 0).unwrap();
        let records = log.replay().unwrap();
        assert_eq!(
            records,
            vec![
                (b"a".to_vec(), Some(b"1".to_vec())),
                (b"b".to_vec(), Some(b"2".to_vec())),
                (b"a".to_vec(), None),
            ]
        );
    }
}
