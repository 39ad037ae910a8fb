//! Async batch decoding module
//!
//! This module decodes many save files concurrently. Files are read with
//! `tokio::fs`, decoded on the blocking pool, and share one immutable
//! [`TableSet`].

#[cfg(feature = "async")]
/// Concurrent save decoding with a configurable concurrency limit
pub mod decoder {
    use crate::save::{decode_character, decode_stash, read_header};
    use crate::save::{Character, CharacterHeader, Stash};
    use crate::{D2SaveError, Result, TableSet, CHARACTER_MAGIC};
    use futures::stream::{self, Stream, StreamExt, TryStreamExt};
    use log::debug;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    /// Result of decoding one file, by detected file kind
    #[derive(Debug, Clone)]
    pub enum DecodedFile {
        /// A character file
        Character(Box<Character>),
        /// A shared stash file
        Stash(Stash),
    }

    /// Concurrent decoder for batches of save files
    #[derive(Debug, Clone)]
    pub struct AsyncBatchDecoder {
        tables: Arc<TableSet>,
        concurrency_limit: usize,
    }

    impl AsyncBatchDecoder {
        /// Create a batch decoder sharing the given tables
        pub fn new(tables: Arc<TableSet>) -> Self {
            Self {
                tables,
                concurrency_limit: num_cpus::get(),
            }
        }

        /// Set the concurrency limit
        pub fn with_concurrency(mut self, limit: usize) -> Self {
            self.concurrency_limit = limit.max(1);
            self
        }

        /// Decode character files, failing on the first error
        ///
        /// Results come back in completion order, paired with their path.
        pub async fn decode_characters<P: AsRef<Path> + Send + Sync>(
            &self,
            files: Vec<P>,
        ) -> Result<Vec<(PathBuf, Character)>> {
            stream::iter(files.into_iter().map(|path| {
                let decoder = self.clone();
                async move { decoder.decode_character_file(path).await }
            }))
            .buffer_unordered(self.concurrency_limit)
            .try_collect()
            .await
        }

        /// Read only the headers of many character files
        pub async fn read_headers<P: AsRef<Path> + Send + Sync>(
            &self,
            files: Vec<P>,
        ) -> Result<Vec<(PathBuf, CharacterHeader)>> {
            stream::iter(files.into_iter().map(read_header_file))
                .buffer_unordered(self.concurrency_limit)
                .try_collect()
                .await
        }

        /// Stream results as they complete, one per file
        ///
        /// The file kind is detected from its leading magic: character files
        /// start with `AA 55 AA 55`, anything else is decoded as a stash.
        pub fn decode_files_streaming<P: AsRef<Path> + Send + Sync + 'static>(
            &self,
            files: Vec<P>,
        ) -> impl Stream<Item = (PathBuf, Result<DecodedFile>)> + '_ {
            stream::iter(files.into_iter().map(move |path| {
                let decoder = self.clone();
                async move {
                    let path = path.as_ref().to_path_buf();
                    let result = decoder.decode_any(&path).await;
                    (path, result)
                }
            }))
            .buffer_unordered(self.concurrency_limit)
        }

        async fn decode_character_file<P: AsRef<Path>>(
            &self,
            path: P,
        ) -> Result<(PathBuf, Character)> {
            let path = path.as_ref().to_path_buf();
            let data = tokio::fs::read(&path).await?;
            let tables = Arc::clone(&self.tables);
            let character =
                spawn_decode(move || decode_character(&data, tables.as_ref())).await?;
            debug!("decoded {}", path.display());
            Ok((path, character))
        }

        async fn decode_any(&self, path: &Path) -> Result<DecodedFile> {
            let data = tokio::fs::read(path).await?;
            let tables = Arc::clone(&self.tables);
            spawn_decode(move || {
                if data.starts_with(&CHARACTER_MAGIC) {
                    decode_character(&data, tables.as_ref())
                        .map(|character| DecodedFile::Character(Box::new(character)))
                } else {
                    decode_stash(&data, tables.as_ref()).map(DecodedFile::Stash)
                }
            })
            .await
        }
    }

    async fn read_header_file<P: AsRef<Path>>(path: P) -> Result<(PathBuf, CharacterHeader)> {
        let path = path.as_ref().to_path_buf();
        let data = tokio::fs::read(&path).await?;
        let header = read_header(&data)?;
        Ok((path, header))
    }

    /// Run a decode on the blocking pool
    async fn spawn_decode<T, F>(decode: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        tokio::task::spawn_blocking(decode)
            .await
            .map_err(|err| D2SaveError::Io(std::io::Error::other(err)))?
    }

}

#[cfg(feature = "async")]
pub use decoder::{AsyncBatchDecoder, DecodedFile};
