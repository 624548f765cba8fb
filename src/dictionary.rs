//! Vocabulary dictionary mapping tokens to dense integer ids.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use counter::Counter;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Sparse document: `(token_id, count)` pairs sorted by token id.
pub type Bow = Vec<(usize, usize)>;

/// Default cap on the number of tokens kept by [`Dictionary::filter_extremes`].
pub const DEFAULT_KEEP_N: usize = 100_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    token2id: HashMap<String, usize>,
    id2token: BTreeMap<usize, String>,
    /// Number of documents each token id appears in
    dfs: BTreeMap<usize, usize>,
    /// Total occurrences of each token id
    cfs: BTreeMap<usize, usize>,
    num_docs: usize,
    num_pos: usize,
    num_nnz: usize,
}

impl Dictionary {
    pub fn new() -> Self {
        Dictionary::default()
    }

    /// Build a dictionary from tokenized documents.
    pub fn from_documents<I, D>(documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[String]>,
    {
        let mut dictionary = Dictionary::new();
        dictionary.add_documents(documents);
        if dictionary.num_docs == 0 {
            return Err(Error::NoDocuments);
        }
        Ok(dictionary)
    }

    pub fn add_documents<I, D>(&mut self, documents: I)
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[String]>,
    {
        for document in documents {
            self.add_document(document.as_ref());
        }
        info!(
            unique_tokens = self.len(),
            documents = self.num_docs,
            corpus_positions = self.num_pos,
            "Built dictionary"
        );
    }

    /// Register one document, assigning ids to unseen tokens, and return its
    /// bag-of-words.
    pub fn add_document(&mut self, document: &[String]) -> Bow {
        let counts: Counter<&str> = document.iter().map(String::as_str).collect();

        // New tokens get ids in alphabetical order so ids don't depend on
        // hash iteration order.
        let mut missing: Vec<&str> = counts
            .keys()
            .filter(|token| !self.token2id.contains_key(**token))
            .copied()
            .collect();
        missing.sort_unstable();
        for token in missing {
            let id = self.next_id();
            self.token2id.insert(token.to_string(), id);
            self.id2token.insert(id, token.to_string());
        }

        let mut bow: Bow = counts
            .iter()
            .map(|(token, &count)| (self.token2id[*token], count))
            .collect();
        bow.sort_unstable();

        self.num_docs += 1;
        self.num_nnz += bow.len();
        for &(id, count) in &bow {
            *self.dfs.entry(id).or_insert(0) += 1;
            *self.cfs.entry(id).or_insert(0) += count;
            self.num_pos += count;
        }

        bow
    }

    fn next_id(&self) -> usize {
        self.id2token.keys().next_back().map_or(0, |max| max + 1)
    }

    /// Encode a document against the current vocabulary. Unknown tokens are
    /// ignored.
    pub fn doc2bow<S: AsRef<str>>(&self, document: &[S]) -> Bow {
        let counts: Counter<usize> = document
            .iter()
            .filter_map(|token| self.token2id.get(token.as_ref()).copied())
            .collect();

        let mut bow: Bow = counts.into_iter().collect();
        bow.sort_unstable();
        bow
    }

    /// Map each token to its id, `None` for unknown tokens.
    pub fn doc2idx<S: AsRef<str>>(&self, document: &[S]) -> Vec<Option<usize>> {
        document
            .iter()
            .map(|token| self.token2id.get(token.as_ref()).copied())
            .collect()
    }

    /// Remove tokens found in fewer than `no_below` documents or in more than
    /// `no_above` (a fraction) of all documents, keep at most `keep_n` of the
    /// most frequent survivors, then compactify the ids.
    pub fn filter_extremes(&mut self, no_below: usize, no_above: f64, keep_n: Option<usize>) {
        let no_above_abs = (no_above * self.num_docs as f64) as usize;

        let mut good_ids: Vec<usize> = self
            .token2id
            .values()
            .copied()
            .filter(|id| {
                let df = self.dfs.get(id).copied().unwrap_or(0);
                no_below <= df && df <= no_above_abs
            })
            .collect();
        good_ids.sort_unstable_by(|a, b| self.doc_freq(*b).cmp(&self.doc_freq(*a)).then(a.cmp(b)));
        if let Some(keep_n) = keep_n {
            good_ids.truncate(keep_n);
        }

        let before = self.len();
        self.filter_tokens(None, Some(good_ids.as_slice()));
        self.compactify();

        info!(
            kept = self.len(),
            removed = before - self.len(),
            no_below,
            no_above,
            "Filtered dictionary extremes"
        );
    }

    /// Drop `bad_ids`, or everything not in `good_ids`. Ids are left as they
    /// are; call [`Dictionary::compactify`] to close the gaps.
    pub fn filter_tokens(&mut self, bad_ids: Option<&[usize]>, good_ids: Option<&[usize]>) {
        if let Some(bad_ids) = bad_ids {
            let bad: HashSet<usize> = bad_ids.iter().copied().collect();
            self.retain_ids(|id| !bad.contains(&id));
        }
        if let Some(good_ids) = good_ids {
            let good: HashSet<usize> = good_ids.iter().copied().collect();
            self.retain_ids(|id| good.contains(&id));
        }
    }

    fn retain_ids<F: Fn(usize) -> bool>(&mut self, keep: F) {
        self.token2id.retain(|_, id| keep(*id));
        self.id2token.retain(|id, _| keep(*id));
        self.dfs.retain(|id, _| keep(*id));
        self.cfs.retain(|id, _| keep(*id));
    }

    /// Reassign ids so they run contiguously from 0, preserving their order.
    pub fn compactify(&mut self) {
        let idmap: HashMap<usize, usize> = self
            .id2token
            .keys()
            .enumerate()
            .map(|(new_id, &old_id)| (old_id, new_id))
            .collect();

        self.token2id = std::mem::take(&mut self.token2id)
            .into_iter()
            .map(|(token, id)| (token, idmap[&id]))
            .collect();
        self.id2token = self.token2id.iter().map(|(t, &id)| (id, t.clone())).collect();
        self.dfs = std::mem::take(&mut self.dfs)
            .into_iter()
            .filter_map(|(id, df)| idmap.get(&id).map(|&new_id| (new_id, df)))
            .collect();
        self.cfs = std::mem::take(&mut self.cfs)
            .into_iter()
            .filter_map(|(id, cf)| idmap.get(&id).map(|&new_id| (new_id, cf)))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.token2id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token2id.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&str> {
        self.id2token.get(&id).map(String::as_str)
    }

    pub fn token_id(&self, token: &str) -> Option<usize> {
        self.token2id.get(token).copied()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.token2id.contains_key(token)
    }

    /// Tokens indexed by id. Gaps left by an uncompacted filter are empty
    /// strings.
    pub fn terms(&self) -> Vec<String> {
        let size = self.id2token.keys().next_back().map_or(0, |max| max + 1);
        let mut terms = vec![String::new(); size];
        for (&id, token) in &self.id2token {
            terms[id] = token.clone();
        }
        terms
    }

    pub fn doc_freq(&self, id: usize) -> usize {
        self.dfs.get(&id).copied().unwrap_or(0)
    }

    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    pub fn num_pos(&self) -> usize {
        self.num_pos
    }

    pub fn num_nnz(&self) -> usize {
        self.num_nnz
    }

    /// The `n` tokens with the highest total count.
    pub fn most_common(&self, n: usize) -> Vec<(String, usize)> {
        let mut by_count: Vec<(String, usize)> = self
            .cfs
            .iter()
            .filter_map(|(id, &cf)| self.id2token.get(id).map(|token| (token.clone(), cf)))
            .collect();
        by_count.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        by_count.truncate(n);
        by_count
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush().map_err(|e| Error::io(path, e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Write the plain-text form: document count on the first line, then
    /// `id<TAB>token<TAB>doc_freq` per token, sorted by token.
    pub fn save_as_text(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);

        let mut entries: Vec<(&String, &usize)> = self.token2id.iter().collect();
        entries.sort();

        writeln!(writer, "{}", self.num_docs).map_err(|e| Error::io(path, e))?;
        for (token, &id) in entries {
            writeln!(writer, "{}\t{}\t{}", id, token, self.doc_freq(id))
                .map_err(|e| Error::io(path, e))?;
        }
        writer.flush().map_err(|e| Error::io(path, e))
    }

    pub fn load_from_text(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut dictionary = Dictionary::new();
        let mut id_lines: BTreeMap<usize, usize> = BTreeMap::new();

        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| Error::io(path, e))?;
            let parse_error = |reason: String| Error::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                reason,
            };

            if index == 0 && !line.contains('\t') {
                dictionary.num_docs = line
                    .trim()
                    .parse()
                    .map_err(|e| parse_error(format!("bad document count: {}", e)))?;
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 3 {
                return Err(parse_error(format!("expected 3 fields, found {}", fields.len())));
            }
            let id: usize = fields[0]
                .parse()
                .map_err(|e| parse_error(format!("bad id: {}", e)))?;
            let df: usize = fields[2]
                .parse()
                .map_err(|e| parse_error(format!("bad document frequency: {}", e)))?;
            let token = fields[1].to_string();

            if dictionary.token2id.contains_key(&token) {
                return Err(parse_error(format!("duplicate token {:?}", token)));
            }
            if dictionary.id2token.contains_key(&id) {
                return Err(parse_error(format!("duplicate id {}", id)));
            }
            dictionary.token2id.insert(token.clone(), id);
            dictionary.id2token.insert(id, token);
            dictionary.dfs.insert(id, df);
            id_lines.insert(id, index + 1);
        }

        // Ids must run 0..len so that id-indexed tables can be built from them
        let size = dictionary.len();
        if let Some((&id, &line)) = id_lines.iter().find(|&(&id, _)| id >= size) {
            return Err(Error::Parse {
                path: path.to_path_buf(),
                line,
                reason: format!("id {} is outside 0..{}", id, size),
            });
        }

        Ok(dictionary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn docs(raw: &[&str]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|line| line.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_ids_are_assigned_per_document_in_token_order() {
        let dictionary = Dictionary::from_documents(docs(&["sat cat", "dog cat"])).unwrap();
        assert_eq!(dictionary.token_id("cat"), Some(0));
        assert_eq!(dictionary.token_id("sat"), Some(1));
        assert_eq!(dictionary.token_id("dog"), Some(2));
        assert_eq!(dictionary.doc_freq(0), 2);
        assert_eq!(dictionary.num_docs(), 2);
        assert_eq!(dictionary.num_pos(), 4);
        assert_eq!(dictionary.num_nnz(), 4);
    }

    #[test]
    fn test_no_documents_is_an_error() {
        let empty: Vec<Vec<String>> = Vec::new();
        assert!(matches!(Dictionary::from_documents(empty), Err(Error::NoDocuments)));
    }

    #[test]
    fn test_doc2bow_counts_known_tokens() {
        let dictionary = Dictionary::from_documents(docs(&["cat dog", "fish"])).unwrap();
        let bow = dictionary.doc2bow(&["dog", "cat", "dog", "zebra"]);
        assert_eq!(bow, vec![(0, 1), (1, 2)]);
        assert!(dictionary.doc2bow(&["zebra"]).is_empty());
        assert_eq!(dictionary.doc2idx(&["fish", "zebra"]), vec![Some(2), None]);
    }

    #[test]
    fn test_filter_extremes_then_ids_are_contiguous() {
        let corpus = docs(&[
            "common rare1 mid",
            "common mid",
            "common mid other",
            "common other",
            "common",
        ]);
        let mut dictionary = Dictionary::from_documents(corpus).unwrap();
        let before = dictionary.len();

        // no_above 0.6 of 5 docs => at most 3 documents
        dictionary.filter_extremes(2, 0.6, None);

        assert!(dictionary.len() <= before);
        assert!(!dictionary.contains("common"));
        assert!(!dictionary.contains("rare1"));
        assert!(dictionary.contains("mid"));
        assert!(dictionary.contains("other"));

        let mut ids: Vec<usize> = ["mid", "other"]
            .iter()
            .filter_map(|t| dictionary.token_id(t))
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(dictionary.terms().len(), 2);
        assert_eq!(dictionary.doc_freq(dictionary.token_id("mid").unwrap()), 3);
    }

    #[test]
    fn test_keep_n_prefers_frequent_tokens() {
        let corpus = docs(&["a b c", "a b", "a"]);
        let mut dictionary = Dictionary::from_documents(corpus).unwrap();
        dictionary.filter_extremes(1, 1.0, Some(2));
        assert_eq!(dictionary.len(), 2);
        assert!(dictionary.contains("a"));
        assert!(dictionary.contains("b"));
    }

    #[test]
    fn test_filter_tokens_leaves_gaps_until_compactify() {
        let mut dictionary = Dictionary::from_documents(docs(&["a b c"])).unwrap();
        dictionary.filter_tokens(Some(&[1][..]), None);
        assert_eq!(dictionary.terms(), vec!["a".to_string(), String::new(), "c".to_string()]);

        dictionary.compactify();
        assert_eq!(dictionary.terms(), vec!["a".to_string(), "c".to_string()]);
        assert_eq!(dictionary.get(1), Some("c"));
    }

    #[test]
    fn test_most_common() {
        let dictionary = Dictionary::from_documents(docs(&["b a b", "b c"])).unwrap();
        assert_eq!(
            dictionary.most_common(2),
            vec![("b".to_string(), 3), ("a".to_string(), 1)]
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reviews.dict");
        let dictionary = Dictionary::from_documents(docs(&["cat sat", "dog ran"])).unwrap();

        dictionary.save(&path).unwrap();
        assert_eq!(Dictionary::load(&path).unwrap(), dictionary);
    }

    #[test]
    fn test_text_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reviews.txt");
        let dictionary = Dictionary::from_documents(docs(&["cat sat", "dog cat"])).unwrap();

        dictionary.save_as_text(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "2\n0\tcat\t2\n2\tdog\t1\n1\tsat\t1\n");

        let loaded = Dictionary::load_from_text(&path).unwrap();
        assert_eq!(loaded.num_docs(), 2);
        assert_eq!(loaded.token_id("dog"), Some(2));
        assert_eq!(loaded.doc_freq(0), 2);
    }

    #[test]
    fn test_text_format_rejects_bad_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.txt");
        std::fs::write(&path, "1\n0\tcat\n").unwrap();
        assert!(matches!(
            Dictionary::load_from_text(&path),
            Err(Error::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_text_format_rejects_out_of_range_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("huge_id.txt");
        std::fs::write(&path, format!("1\n{}\tcat\t1\n", usize::MAX)).unwrap();
        assert!(matches!(
            Dictionary::load_from_text(&path),
            Err(Error::Parse { line: 2, .. })
        ));

        std::fs::write(&path, "2\n0\tcat\t1\n2\tdog\t1\n").unwrap();
        assert!(matches!(
            Dictionary::load_from_text(&path),
            Err(Error::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn test_text_format_rejects_duplicate_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("duplicate_id.txt");
        std::fs::write(&path, "2\n0\tcat\t1\n0\tdog\t1\n").unwrap();
        assert!(matches!(
            Dictionary::load_from_text(&path),
            Err(Error::Parse { line: 3, .. })
        ));
    }
}
