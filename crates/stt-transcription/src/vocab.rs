//! SentencePiece vocabulary and detokenization.

use std::path::Path;

use crate::types::{ResultExt, TranscriptionError};

/// SentencePiece word-boundary marker.
const WORD_BOUNDARY: char = '\u{2581}';

/// Name of the CTC blank token in NeMo exports.
const BLANK_TOKEN: &str = "<blk>";

/// Token table for a CTC model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<String>,
    blank_idx: usize,
}

impl Vocabulary {
    /// Build from tokens in ID order.
    ///
    /// The blank is the `<blk>` token when present, otherwise the index one
    /// past the last token.
    pub fn new(tokens: Vec<String>) -> Self {
        let blank_idx = tokens
            .iter()
            .position(|t| t == BLANK_TOKEN)
            .unwrap_or(tokens.len());
        Self { tokens, blank_idx }
    }

    /// Parse `vocab.txt` content.
    ///
    /// Lines are either `token` (ID = line number) or `token id`. IDs must be
    /// below the file's line count.
    pub fn parse(content: &str) -> Result<Self, TranscriptionError> {
        let line_count = content.lines().count();
        let mut indexed: Vec<(usize, String)> = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let entry = match line.rsplit_once(' ') {
                Some((token, id)) if !token.is_empty() => match id.parse::<usize>() {
                    Ok(id) => (id, token.to_string()),
                    Err(_) => (line_no, line.to_string()),
                },
                _ => (line_no, line.to_string()),
            };
            if entry.0 >= line_count {
                return Err(TranscriptionError::ModelNotAvailable(format!(
                    "vocab.txt: token id {} out of range for {line_count} lines",
                    entry.0
                )));
            }
            indexed.push(entry);
        }

        let size = indexed.iter().map(|(id, _)| id + 1).max().unwrap_or(0);
        let mut tokens = vec![String::new(); size];
        for (id, token) in indexed {
            if !tokens[id].is_empty() {
                return Err(TranscriptionError::ModelNotAvailable(format!(
                    "vocab.txt: duplicate token id {id}"
                )));
            }
            tokens[id] = token;
        }
        if tokens.is_empty() {
            return Err(TranscriptionError::ModelNotAvailable(
                "vocab.txt is empty".into(),
            ));
        }
        Ok(Self::new(tokens))
    }

    /// Read and parse a `vocab.txt` file.
    pub fn load(path: &Path) -> Result<Self, TranscriptionError> {
        let content = std::fs::read_to_string(path).model("read vocab.txt")?;
        Self::parse(&content)
    }

    /// Number of tokens, excluding an implicit trailing blank.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the table has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Index of the CTC blank.
    pub fn blank_idx(&self) -> usize {
        self.blank_idx
    }

    /// Width of the model's output distribution.
    pub fn output_size(&self) -> usize {
        self.tokens.len().max(self.blank_idx + 1)
    }

    /// Token string for `id`, if any.
    pub fn token(&self, id: usize) -> Option<&str> {
        self.tokens.get(id).map(String::as_str)
    }

    /// Join token pieces into text.
    ///
    /// `▁` becomes a space, special `<...>` tokens are dropped and the result
    /// is trimmed.
    pub fn detokenize(&self, ids: &[usize]) -> String {
        let joined: String = ids
            .iter()
            .filter_map(|&id| self.token(id))
            .filter(|t| !is_special(t))
            .collect();
        joined
            .replace(WORD_BOUNDARY, " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn is_special(token: &str) -> bool {
    token.len() > 2 && token.starts_with('<') && token.ends_with('>')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(tokens: &[&str]) -> Vocabulary {
        Vocabulary::new(tokens.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn blank_defaults_to_vocab_size() {
        let v = vocab(&["<unk>", "▁he", "llo"]);
        assert_eq!(v.blank_idx(), 3);
        assert_eq!(v.output_size(), 4);
    }

    #[test]
    fn explicit_blank_token() {
        let v = vocab(&["<unk>", "▁a", "<blk>"]);
        assert_eq!(v.blank_idx(), 2);
        assert_eq!(v.output_size(), 3);
    }

    #[test]
    fn parse_plain_lines() {
        let v = Vocabulary::parse("<unk>\n▁the\ns\n").unwrap();
        assert_eq!(v.len(), 3);
        assert_eq!(v.token(1), Some("▁the"));
    }

    #[test]
    fn parse_token_id_lines_out_of_order() {
        let v = Vocabulary::parse("▁the 1\n<unk> 0\n<blk> 2\n").unwrap();
        assert_eq!(v.token(0), Some("<unk>"));
        assert_eq!(v.token(1), Some("▁the"));
        assert_eq!(v.blank_idx(), 2);
    }

    #[test]
    fn parse_rejects_duplicate_ids() {
        assert!(Vocabulary::parse("a 0\nb 0\n").is_err());
    }

    #[test]
    fn parse_rejects_out_of_range_ids() {
        let err = Vocabulary::parse("a 18446744073709551615\n").unwrap_err();
        assert!(matches!(err, TranscriptionError::ModelNotAvailable(msg) if msg.contains("out of range")));
        assert!(Vocabulary::parse("a 0\nb 4000000000\n").is_err());
        assert!(Vocabulary::parse("a 0\nb 2\n").is_err());
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(Vocabulary::parse("").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.txt");
        std::fs::write(&path, "<unk>\n▁hi\n").unwrap();
        let v = Vocabulary::load(&path).unwrap();
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn load_missing_file_is_model_error() {
        let err = Vocabulary::load(Path::new("/nonexistent/vocab.txt")).unwrap_err();
        assert!(matches!(err, TranscriptionError::ModelNotAvailable(_)));
    }

    #[test]
    fn detokenize_word_boundaries() {
        let v = vocab(&["<unk>", "▁Hel", "lo", "▁world", "."]);
        assert_eq!(v.detokenize(&[1, 2, 3, 4]), "Hello world.");
    }

    #[test]
    fn detokenize_drops_specials_and_unknown_ids() {
        let v = vocab(&["<unk>", "▁a", "▁b"]);
        assert_eq!(v.detokenize(&[0, 1, 99, 2]), "a b");
    }

    #[test]
    fn detokenize_empty() {
        let v = vocab(&["▁a"]);
        assert_eq!(v.detokenize(&[]), "");
    }
}
