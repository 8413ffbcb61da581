//! Line sources feeding the `.env` parser
//!
//! A [`LineSource`] is anything that can be (re)opened to yield raw text
//! lines. Opening happens once per parse pass so every pass starts from the
//! first line again.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Boxed stream of raw lines; an `Err` item is a mid-stream read failure
pub type Lines<'a> = Box<dyn Iterator<Item = io::Result<String>> + 'a>;

/// A restartable provider of raw text lines
pub trait LineSource {
    /// Human-readable name used in error messages
    fn name(&self) -> String;

    /// Open the source from its first line
    fn open(&self) -> io::Result<Lines<'_>>;
}

/// `.env` file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineSource for FileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> io::Result<Lines<'_>> {
        let file = File::open(&self.path)?;
        Ok(Box::new(BufReader::new(file).lines()))
    }
}

/// In-memory `.env` content, mostly useful for tests and embedded defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrSource {
    name: String,
    content: String,
}

impl StrSource {
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            name: "<memory>".to_string(),
            content: content.into(),
        }
    }

    /// Override the name reported in errors
    pub fn named<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }
}

impl LineSource for StrSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn open(&self) -> io::Result<Lines<'_>> {
        Ok(Box::new(self.content.lines().map(|line| Ok(line.to_string()))))
    }
}

impl<S: LineSource + ?Sized> LineSource for &S {
    fn name(&self) -> String {
        (**self).name()
    }

    fn open(&self) -> io::Result<Lines<'_>> {
        (**self).open()
    }
}
