/// Clause splitting for AQL statements
///
/// Statements are cut into clauses at a handful of keywords (FROM, WHERE,
/// SET, VALUES, INTO), at parenthesised lists and at top-level `,` / `=`.
/// Splitting runs over tokens rather than raw text, so delimiters inside a
/// single-quoted literal never split it. Every token keeps its byte span
/// and a clause's text is always the original source between its first and
/// last token; unquoted multi-word values therefore reach literal coercion
/// exactly as typed.

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Any run of characters that is not whitespace or punctuation
    Word,
    /// Single-quoted literal, quotes included. An unterminated quote runs to end of input.
    Quoted,
    Comma,
    Equals,
    LeftParen,
    RightParen,
}

/// Token with its byte span in the statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Character lexer
struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn current(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current() {
            self.pos += ch.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let start = self.pos;
        self.advance();
        Token {
            kind,
            start,
            end: self.pos,
        }
    }

    fn read_quoted(&mut self) -> Token {
        let start = self.pos;
        self.advance(); // opening quote
        while let Some(ch) = self.current() {
            self.advance();
            if ch == '\'' {
                break;
            }
        }
        Token {
            kind: TokenKind::Quoted,
            start,
            end: self.pos,
        }
    }

    fn read_word(&mut self) -> Token {
        let start = self.pos;
        while let Some(ch) = self.current() {
            if ch.is_whitespace() || is_punctuation(ch) {
                break;
            }
            self.advance();
        }
        Token {
            kind: TokenKind::Word,
            start,
            end: self.pos,
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();

        match self.current()? {
            ',' => Some(self.single(TokenKind::Comma)),
            '=' => Some(self.single(TokenKind::Equals)),
            '(' => Some(self.single(TokenKind::LeftParen)),
            ')' => Some(self.single(TokenKind::RightParen)),
            '\'' => Some(self.read_quoted()),
            _ => Some(self.read_word()),
        }
    }
}

fn is_punctuation(ch: char) -> bool {
    matches!(ch, ',' | '=' | '(' | ')' | '\'')
}

/// Tokenize a statement. Never fails: every character ends up in some token
/// or is skipped as whitespace.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tokens
}

/// Statement text plus its tokens
#[derive(Debug, Clone)]
pub struct TokenStream<'a> {
    source: &'a str,
    tokens: Vec<Token>,
}

impl<'a> TokenStream<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: tokenize(source),
        }
    }

    /// View over all tokens
    pub fn segment(&self) -> Segment<'_> {
        Segment {
            source: self.source,
            tokens: &self.tokens,
        }
    }
}

/// A contiguous run of tokens - one clause, list item or operand
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    source: &'a str,
    tokens: &'a [Token],
}

impl<'a> Segment<'a> {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, idx: usize) -> Option<&'a Token> {
        self.tokens.get(idx)
    }

    /// Source text covered by the segment, empty for an empty segment
    pub fn text(&self) -> &'a str {
        match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => &self.source[first.start..last.end],
            _ => "",
        }
    }

    /// Text of the token at `idx`
    pub fn text_at(&self, idx: usize) -> Option<&'a str> {
        self.tokens.get(idx).map(|t| t.text(self.source))
    }

    /// True if the token at `idx` is a word equal to `keyword` ignoring case
    pub fn is_keyword_at(&self, idx: usize, keyword: &str) -> bool {
        self.tokens
            .get(idx)
            .map(|t| t.kind == TokenKind::Word && t.text(self.source).eq_ignore_ascii_case(keyword))
            .unwrap_or(false)
    }

    /// True if the segment is exactly one word
    pub fn single_word(&self) -> Option<&'a str> {
        match self.tokens {
            [t] if t.kind == TokenKind::Word => Some(t.text(self.source)),
            _ => None,
        }
    }

    /// Sub-segment `[from, to)`
    pub fn slice(&self, from: usize, to: usize) -> Segment<'a> {
        let to = to.min(self.tokens.len());
        let from = from.min(to);
        Segment {
            source: self.source,
            tokens: &self.tokens[from..to],
        }
    }

    /// Everything from `from` to the end
    pub fn tail(&self, from: usize) -> Segment<'a> {
        self.slice(from, self.tokens.len())
    }

    /// Positions of `keyword` outside parentheses
    pub fn keyword_positions(&self, keyword: &str) -> Vec<usize> {
        let mut depth = 0usize;
        let mut positions = Vec::new();
        for (idx, token) in self.tokens.iter().enumerate() {
            match token.kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => depth = depth.saturating_sub(1),
                TokenKind::Word if depth == 0 => {
                    if token.text(self.source).eq_ignore_ascii_case(keyword) {
                        positions.push(idx);
                    }
                }
                _ => {}
            }
        }
        positions
    }

    /// First position of `keyword` outside parentheses
    pub fn find_keyword(&self, keyword: &str) -> Option<usize> {
        self.keyword_positions(keyword).into_iter().next()
    }

    /// Split on every top-level token of `kind`. Always returns at least one
    /// piece; `n` delimiters give `n + 1` pieces, possibly empty.
    pub fn split_on(&self, kind: TokenKind) -> Vec<Segment<'a>> {
        let mut depth = 0usize;
        let mut pieces = Vec::new();
        let mut start = 0;
        for (idx, token) in self.tokens.iter().enumerate() {
            match token.kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => depth = depth.saturating_sub(1),
                k if k == kind && depth == 0 => {
                    pieces.push(self.slice(start, idx));
                    start = idx + 1;
                }
                _ => {}
            }
        }
        pieces.push(self.tail(start));
        pieces
    }

    /// Parenthesised list opening exactly at `open`.
    ///
    /// Returns the inner segment and the index just past the closing
    /// parenthesis, or `None` if `open` is not `(` or the list never closes.
    pub fn paren_group(&self, open: usize) -> Option<(Segment<'a>, usize)> {
        if self.tokens.get(open)?.kind != TokenKind::LeftParen {
            return None;
        }
        let mut depth = 0usize;
        for (idx, token) in self.tokens.iter().enumerate().skip(open) {
            match token.kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((self.slice(open + 1, idx), idx + 1));
                    }
                }
                _ => {}
            }
        }
        None
    }
}
