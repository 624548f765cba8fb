//! Line-oriented corpus files: one document per line, whitespace-separated
//! tokens.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};

use crate::dictionary::{Bow, Dictionary};
use crate::error::{Error, Result};

/// Longest run of tokens yielded as a single sentence.
pub const MAX_SENTENCE_LENGTH: usize = 10_000;

/// Append a single line to `path`, creating the file if needed.
pub fn append_line(path: &Path, line: &str) -> Result<()> {
    append_lines(path, std::iter::once(line)).map(|_| ())
}

/// Append every line to `path`, creating the file if needed. Existing
/// content is never truncated.
pub fn append_lines<I, S>(path: &Path, lines: I) -> Result<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);

    let mut written = 0;
    for line in lines {
        writeln!(writer, "{}", line.as_ref()).map_err(|e| Error::io(path, e))?;
        written += 1;
    }
    writer.flush().map_err(|e| Error::io(path, e))?;

    Ok(written)
}

/// Restartable stream of token lists read from a processed corpus file.
///
/// Every call to [`LineSentence::iter`] reopens the file, so a corpus can be
/// walked as many times as needed without holding it in memory. Blank lines
/// produce no sentence and lines longer than `max_sentence_length` tokens are
/// split into consecutive chunks.
#[derive(Debug, Clone)]
pub struct LineSentence {
    path: PathBuf,
    max_sentence_length: usize,
    limit: Option<usize>,
}

impl LineSentence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LineSentence {
            path: path.into(),
            max_sentence_length: MAX_SENTENCE_LENGTH,
            limit: None,
        }
    }

    pub fn max_sentence_length(mut self, max: usize) -> Self {
        self.max_sentence_length = max.max(1);
        self
    }

    /// Read at most `limit` lines.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn iter(&self) -> Result<Sentences> {
        let file = File::open(&self.path).map_err(|e| Error::io(&self.path, e))?;
        Ok(Sentences {
            lines: BufReader::new(file).lines(),
            path: self.path.clone(),
            max_sentence_length: self.max_sentence_length,
            lines_left: self.limit,
            pending: VecDeque::new(),
        })
    }
}

pub struct Sentences {
    lines: Lines<BufReader<File>>,
    path: PathBuf,
    max_sentence_length: usize,
    lines_left: Option<usize>,
    pending: VecDeque<Vec<String>>,
}

impl Iterator for Sentences {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(sentence) = self.pending.pop_front() {
                return Some(Ok(sentence));
            }

            if let Some(left) = self.lines_left.as_mut() {
                if *left == 0 {
                    return None;
                }
                *left -= 1;
            }

            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(Error::io(&self.path, e))),
            };

            let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            for chunk in tokens.chunks(self.max_sentence_length) {
                self.pending.push_back(chunk.to_vec());
            }
        }
    }
}

/// Bag-of-words view of a processed corpus against a fixed dictionary.
///
/// Like [`LineSentence`], iteration can be restarted by calling `iter` again.
pub struct BowCorpus<'a> {
    dictionary: &'a Dictionary,
    sentences: LineSentence,
}

impl<'a> BowCorpus<'a> {
    pub fn new(dictionary: &'a Dictionary, sentences: LineSentence) -> Self {
        BowCorpus {
            dictionary,
            sentences,
        }
    }

    pub fn iter(&self) -> Result<impl Iterator<Item = Result<Bow>> + 'a> {
        let dictionary = self.dictionary;
        Ok(self
            .sentences
            .iter()?
            .map(move |sentence| sentence.map(|tokens| dictionary.doc2bow(&tokens))))
    }
}
