// ============================================================
// Layer 4 - Tokenizer Adapter
// ============================================================
// Converts raw text into fixed-shape numeric sequences:
//
//   input_ids:      [seq_len] vocabulary indices
//   attention_mask: [seq_len] 1 = real token, 0 = padding
//
// Contract:
//   - every output row has exactly `seq_len` entries
//   - text longer than seq_len tokens is truncated (silent, by
//     policy); no begin/end marker tokens are inserted
//   - shorter text is right-padded with the pad id (0) and the
//     mask is 0 over the padded suffix
//   - an empty string yields an all-zero mask row; the model
//     must tolerate that downstream
//
// The adapter is a pure function of (vocabulary, seq_len): the
// same text always produces the same row, and a whole dataset
// can be encoded in one call.

use anyhow::Result;
use tokenizers::Tokenizer;

/// Padding id; the vocabulary reserves index 0 for [PAD].
pub const PAD_ID: u32 = 0;

/// One encoded row, pre-padded to the configured length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedText {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
}

/// Wraps a vocabulary and a fixed sequence length.
pub struct TokenEncoder {
    tokenizer: Tokenizer,
    seq_len:   usize,
}

impl TokenEncoder {
    pub fn new(tokenizer: Tokenizer, seq_len: usize) -> Self {
        Self { tokenizer, seq_len }
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Encode a single text into a fixed-length row.
    pub fn encode(&self, text: &str) -> Result<EncodedText> {
        // Second argument: do not add special tokens
        let enc = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("tokenisation error: {e}"))?;
        Ok(self.fix_length(enc.get_ids()))
    }

    /// Encode a whole slice of texts in one call. The output has
    /// one row per input, all of identical length.
    pub fn encode_all(&self, texts: &[String]) -> Result<Vec<EncodedText>> {
        let inputs: Vec<&str> = texts.iter().map(|t| t.as_str()).collect();
        let encodings = self
            .tokenizer
            .encode_batch(inputs, false)
            .map_err(|e| anyhow::anyhow!("batch tokenisation error: {e}"))?;
        Ok(encodings
            .iter()
            .map(|enc| self.fix_length(enc.get_ids()))
            .collect())
    }

    /// Truncate to seq_len, then right-pad ids with PAD_ID and the
    /// mask with 0. Padding always occupies the suffix.
    fn fix_length(&self, ids: &[u32]) -> EncodedText {
        let real = ids.len().min(self.seq_len);

        let mut input_ids = Vec::with_capacity(self.seq_len);
        input_ids.extend_from_slice(&ids[..real]);
        input_ids.resize(self.seq_len, PAD_ID);

        let mut attention_mask = vec![1u32; real];
        attention_mask.resize(self.seq_len, 0);

        EncodedText { input_ids, attention_mask }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::vocab_store::VocabStore;

    // A tiny word-level vocabulary is enough to exercise the
    // shape contract; semantics of the ids are irrelevant here.
    fn encoder(seq_len: usize) -> TokenEncoder {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = VocabStore::new(dir.path().to_str().unwrap());
        let corpus = vec![
            "alice emailed bob yesterday".to_string(),
            "phone home before midnight".to_string(),
        ];
        let tokenizer = store
            .load_or_build(&corpus, 64, false)
            .expect("build vocab");
        TokenEncoder::new(tokenizer, seq_len)
    }

    #[test]
    fn test_output_shape_is_fixed() {
        let enc = encoder(8);
        let rows = enc
            .encode_all(&["alice emailed bob".to_string(), "phone".to_string()])
            .unwrap();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.input_ids.len(), 8);
            assert_eq!(row.attention_mask.len(), 8);
        }
    }

    #[test]
    fn test_short_text_is_right_padded() {
        let enc = encoder(6);
        let row = enc.encode("alice emailed").unwrap();
        // Two real tokens then pad suffix
        assert_eq!(&row.attention_mask[..2], &[1, 1]);
        assert_eq!(&row.attention_mask[2..], &[0, 0, 0, 0]);
        assert_eq!(&row.input_ids[2..], &[PAD_ID; 4]);
    }

    #[test]
    fn test_long_text_is_truncated() {
        let enc = encoder(3);
        let row = enc.encode("alice emailed bob yesterday before midnight").unwrap();
        assert_eq!(row.input_ids.len(), 3);
        assert_eq!(row.attention_mask, vec![1, 1, 1]);
    }

    #[test]
    fn test_empty_string_yields_all_zero_mask() {
        let enc = encoder(5);
        let row = enc.encode("").unwrap();
        assert_eq!(row.input_ids, vec![PAD_ID; 5]);
        assert_eq!(row.attention_mask, vec![0; 5]);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let enc = encoder(8);
        let a = enc.encode("alice emailed bob").unwrap();
        let b = enc.encode("alice emailed bob").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_batch_matches_single_encoding() {
        let enc = encoder(8);
        let single = enc.encode("phone home").unwrap();
        let batch = enc.encode_all(&["phone home".to_string()]).unwrap();
        assert_eq!(batch[0], single);
    }
}
