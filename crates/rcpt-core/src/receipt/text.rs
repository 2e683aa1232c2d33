//! Line segmentation of OCR transcripts.

/// One non-blank, trimmed line of a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptLine<'a> {
    /// Position among the non-blank lines (0-based).
    pub index: usize,
    /// Byte offset of `text` in the raw transcript.
    pub offset: usize,
    pub text: &'a str,
}

impl ReceiptLine<'_> {
    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A raw transcript together with its line segmentation.
#[derive(Debug, Clone)]
pub struct ReceiptText<'a> {
    raw: &'a str,
    lines: Vec<ReceiptLine<'a>>,
}

impl<'a> ReceiptText<'a> {
    pub fn new(raw: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut line_start = 0;

        for segment in raw.split('\n') {
            let trimmed = segment.trim();
            if !trimmed.is_empty() {
                let leading = segment.len() - segment.trim_start().len();
                lines.push(ReceiptLine {
                    index: lines.len(),
                    offset: line_start + leading,
                    text: trimmed,
                });
            }
            line_start += segment.len() + 1;
        }

        Self { raw, lines }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn lines(&self) -> &[ReceiptLine<'a>] {
        &self.lines
    }

    /// True when the transcript holds no visible text.
    pub fn is_blank(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_segmentation_drops_blank_lines() {
        let text = ReceiptText::new("  SHOP  \n\n \t\nTotal 5.00\r\n");
        let lines: Vec<&str> = text.lines().iter().map(|l| l.text).collect();

        assert_eq!(lines, vec!["SHOP", "Total 5.00"]);
        assert_eq!(text.lines()[1].index, 1);
    }

    #[test]
    fn test_offsets_point_into_raw_text() {
        let raw = "A\n   Bcd\n\nEf";
        let text = ReceiptText::new(raw);

        for line in text.lines() {
            assert_eq!(&raw[line.offset..line.offset + line.text.len()], line.text);
        }
    }

    #[test]
    fn test_blank_input() {
        assert!(ReceiptText::new("").is_blank());
        assert!(ReceiptText::new("   \n\n  ").is_blank());
    }

    #[test]
    fn test_char_len_counts_characters() {
        let text = ReceiptText::new("Reçu");
        assert_eq!(text.lines()[0].char_len(), 4);
    }
}
