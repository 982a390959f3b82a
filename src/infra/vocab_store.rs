// ============================================================
// Layer 6 - Vocabulary Store
// ============================================================
// Manages the token-hash table the tokenizer adapter consumes.
//
// Two paths:
//   - a tokenizer.json already exists in the store directory
//     (shipped with a pretrained encoder, or persisted by an
//     earlier run): load it as-is
//   - nothing exists yet: build a word-level vocabulary from the
//     training corpus, write it in HuggingFace tokenizer JSON
//     format, and load it back
//
// The pad token always has id 0; the cased/uncased choice of the
// encoder variant controls the lowercase normalizer flag.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokenizers::Tokenizer;

/// Reserved ids at the bottom of every built vocabulary.
const PAD_TOKEN: &str = "[PAD]";
const UNK_TOKEN: &str = "[UNK]";
const RESERVED_SLOTS: usize = 2;

pub struct VocabStore {
    dir: PathBuf,
}

impl VocabStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    fn tokenizer_path(&self) -> PathBuf {
        self.dir.join("tokenizer.json")
    }

    /// Load an existing tokenizer or build one from `texts`.
    pub fn load_or_build(
        &self,
        texts:      &[String],
        vocab_size: usize,
        lowercase:  bool,
    ) -> Result<Tokenizer> {
        if self.tokenizer_path().exists() {
            tracing::info!("Loading existing tokenizer from '{}'", self.dir.display());
            self.load()
        } else {
            tracing::info!("Building word-level tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(texts, vocab_size, lowercase)
        }
    }

    /// Load a previously saved tokenizer JSON file.
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.tokenizer_path();
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!("cannot load tokenizer from '{}': {e}", path.display()))
    }

    /// Build a word-level vocabulary from corpus word frequencies
    /// and write a tokenizer JSON that Tokenizer::from_file accepts.
    fn build_and_save(
        &self,
        texts:      &[String],
        vocab_size: usize,
        lowercase:  bool,
    ) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("cannot create '{}'", self.dir.display()))?;

        // Count word frequencies over the corpus
        use std::collections::HashMap;
        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for word in text.split_whitespace() {
                let w = if lowercase { word.to_lowercase() } else { word.to_string() };
                let w = w.trim_matches(|c: char| !c.is_alphanumeric());
                if !w.is_empty() {
                    *freq.entry(w.to_string()).or_insert(0) += 1;
                }
            }
        }

        // Most frequent words first; ties broken alphabetically so
        // the built vocabulary is deterministic across runs
        let mut words: Vec<(String, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(vocab_size.saturating_sub(RESERVED_SLOTS));

        // Pad at 0, unknown at 1, corpus words after
        let mut vocab = serde_json::json!({
            PAD_TOKEN: 0,
            UNK_TOKEN: 1,
        });
        let mut next_id = RESERVED_SLOTS;
        for (word, _) in &words {
            if vocab.get(word).is_none() {
                vocab[word] = serde_json::json!(next_id);
                next_id += 1;
            }
        }

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": 0, "content": PAD_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 1, "content": UNK_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": lowercase
            },
            "pre_tokenizer": {
                "type": "Whitespace"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let path = self.tokenizer_path();
        std::fs::write(&path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("cannot write '{}'", path.display()))?;

        tracing::info!(
            "Tokenizer built with {} entries, saved to '{}'",
            next_id,
            path.display()
        );

        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!("cannot reload built tokenizer: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "Alice emailed Bob".to_string(),
            "Bob phoned Alice twice".to_string(),
        ]
    }

    #[test]
    fn test_builds_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path().to_str().unwrap());
        let tok = store.load_or_build(&corpus(), 32, true).unwrap();

        let enc = tok.encode("alice emailed", false).unwrap();
        assert_eq!(enc.get_ids().len(), 2);
        // No id collides with the pad slot
        assert!(enc.get_ids().iter().all(|&id| id != 0));
    }

    #[test]
    fn test_second_call_loads_the_same_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path().to_str().unwrap());
        let first = store.load_or_build(&corpus(), 32, true).unwrap();
        let ids_first = first.encode("bob phoned", false).unwrap().get_ids().to_vec();

        // A different corpus must not matter: the stored file wins
        let second = store
            .load_or_build(&["entirely different words".to_string()], 32, true)
            .unwrap();
        let ids_second = second.encode("bob phoned", false).unwrap().get_ids().to_vec();
        assert_eq!(ids_first, ids_second);
    }

    #[test]
    fn test_uncased_build_folds_case() {
        let dir = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path().to_str().unwrap());
        let tok = store.load_or_build(&corpus(), 32, true).unwrap();
        let upper = tok.encode("ALICE", false).unwrap().get_ids().to_vec();
        let lower = tok.encode("alice", false).unwrap().get_ids().to_vec();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_unknown_word_maps_to_unk() {
        let dir = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path().to_str().unwrap());
        let tok = store.load_or_build(&corpus(), 32, true).unwrap();
        let ids = tok.encode("zzzunseen", false).unwrap().get_ids().to_vec();
        assert_eq!(ids, vec![1]);
    }
}
