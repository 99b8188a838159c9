use miette::SourceSpan;

use crate::tokens::SYMBOLS;

/// Splits pre-cleaned lines into raw token strings. Purely textual, nothing is classified here.
pub fn scan<L: AsRef<str>>(lines: &[L]) -> Vec<String> {
    let mut scanner = Scanner::new();
    let mut offset = 0;
    for (idx, line) in lines.iter().enumerate() {
        let text = line.as_ref();
        scanner.scan_line(idx + 1, offset, text);
        offset += text.len() + 1;
    }
    scanner.take_tokens()
}

/// Accumulates tokens line by line, remembering where in the source each token came from.
#[derive(Debug, Default)]
pub struct Scanner {
    tokens: Vec<String>,
    lines: Vec<usize>,
    spans: Vec<SourceSpan>,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans one line whose first byte sits at `offset` in the source.
    pub fn scan_line(&mut self, line_number: usize, offset: usize, text: &str) {
        for (start, word) in words(text) {
            for (idx, token) in split_word(word) {
                self.tokens.push(token.to_string());
                self.lines.push(line_number);
                self.spans
                    .push(SourceSpan::from((offset + start + idx, token.len())));
            }
        }
    }

    /// Source line of the token at `index`.
    pub fn line_of(&self, index: usize) -> Option<usize> {
        self.lines.get(index).copied()
    }

    /// Byte span of the token at `index`.
    pub fn span_of(&self, index: usize) -> Option<SourceSpan> {
        self.spans.get(index).copied()
    }

    /// Hands out the tokens. Line and span lookups keep working afterwards.
    pub fn take_tokens(&mut self) -> Vec<String> {
        std::mem::take(&mut self.tokens)
    }
}

fn words(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_whitespace()
        .map(move |word| (word.as_ptr() as usize - text.as_ptr() as usize, word))
}

fn split_word(word: &str) -> Vec<(usize, &str)> {
    let mut cuts: Vec<usize> = SYMBOLS
        .iter()
        .flat_map(|symbol| word.match_indices(*symbol).map(|(idx, _)| idx))
        .collect();
    cuts.sort_unstable();

    let mut pieces = Vec::with_capacity(cuts.len() * 2 + 1);
    let mut start = 0;
    for idx in cuts {
        if idx > start {
            pieces.push((start, &word[start..idx]));
        }
        // Symbols are all single byte.
        pieces.push((idx, &word[idx..idx + 1]));
        start = idx + 1;
    }
    if start < word.len() {
        pieces.push((start, &word[start..]));
    }
    pieces
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn splits_on_whitespace_runs() {
        assert_eq!(scan(&["class  Main\t{"]), ["class", "Main", "{"]);
    }

    #[test]
    fn multiple_symbols_in_one_word() {
        assert_eq!(scan(&["a[1]"]), ["a", "[", "1", "]"]);
        assert_eq!(
            scan(&["do Output.printInt(-x);"]),
            ["do", "Output", ".", "printInt", "(", "-", "x", ")", ";"]
        );
        assert_eq!(scan(&["(~(a<b))"]), ["(", "~", "(", "a", "<", "b", ")", ")"]);
    }

    #[test]
    fn symbols_only() {
        assert_eq!(scan(&["{}"]), ["{", "}"]);
        assert_eq!(scan(&[";"]), [";"]);
    }

    #[test]
    fn no_classification_happens() {
        assert_eq!(scan(&["9abc $ a-b"]), ["9abc", "$", "a", "-", "b"]);
    }

    #[test]
    fn strings_are_split_like_anything_else() {
        assert_eq!(scan(&["\"hi\";"]), ["\"hi\"", ";"]);
        assert_eq!(scan(&["\"a b\""]), ["\"a", "b\""]);
    }

    #[test]
    fn remembers_lines_and_spans() {
        let mut scanner = Scanner::new();
        scanner.scan_line(3, 10, "let  x=1;");
        scanner.scan_line(7, 40, "}");
        let tokens = scanner.take_tokens();
        assert_eq!(tokens, ["let", "x", "=", "1", ";", "}"]);

        assert_eq!(scanner.line_of(0), Some(3));
        assert_eq!(scanner.line_of(4), Some(3));
        assert_eq!(scanner.line_of(5), Some(7));
        assert_eq!(scanner.line_of(6), None);

        let spans: Vec<_> = (0..tokens.len())
            .map(|idx| scanner.span_of(idx).map(|s| (s.offset(), s.len())))
            .collect();
        assert_eq!(
            spans,
            [
                Some((10, 3)),
                Some((15, 1)),
                Some((16, 1)),
                Some((17, 1)),
                Some((18, 1)),
                Some((40, 1)),
            ]
        );
        assert_eq!(scanner.span_of(6), None);
    }

    #[test]
    fn empty_input() {
        let lines: [&str; 0] = [];
        assert!(scan(&lines).is_empty());
        assert!(scan(&["   "]).is_empty());
    }
}
