use super::token::{Token, TokenKind};
use crate::error::{Error, Position, Result};
use std::path::Path;
use tracing::trace;

/// Outcome of one recogniser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recognised {
    /// Consumed a token of this many bytes
    Matched(usize),
    /// Not this kind of token; nothing was consumed
    NoMatch,
    /// Input is exhausted
    End,
}

type Recogniser = fn(&mut Scanner) -> Recognised;

/// Recognisers in the order they are tried
const RECOGNISERS: [(Recogniser, TokenKind); 6] = [
    (Scanner::recognise_dollar_hex, TokenKind::DollarHex),
    (Scanner::recognise_hex, TokenKind::Hex),
    (Scanner::recognise_decimal, TokenKind::Decimal),
    (Scanner::recognise_integer, TokenKind::Integer),
    (Scanner::recognise_nil, TokenKind::Nil),
    (Scanner::recognise_name, TokenKind::Name),
];

/// Scanner for zerotape source text
///
/// Reads bytes one at a time with single-byte push-back. Column tracking
/// keeps one level of undo so that a newline can be pushed back.
pub struct Scanner {
    /// Source bytes
    source: Vec<u8>,
    /// Current position in source
    current: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// Column before the most recent newline
    prev_column: Option<usize>,
    /// Text of the token being recognised
    lexeme: Vec<u8>,
}

impl Scanner {
    /// Creates a new scanner over in-memory source text
    pub fn new(source: &str) -> Self {
        Self::from_bytes(source.as_bytes().to_vec())
    }

    /// Creates a scanner over raw bytes
    pub fn from_bytes(source: Vec<u8>) -> Self {
        Scanner {
            source,
            current: 0,
            line: 1,
            column: 1,
            prev_column: None,
            lexeme: Vec::new(),
        }
    }

    /// Reads the whole file and creates a scanner over it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read(path).map_err(|source| Error::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_bytes(source))
    }

    /// Byte offset of the next unread byte
    pub fn cursor(&self) -> usize {
        self.current
    }

    /// Bytes not yet consumed
    pub fn pending(&self) -> usize {
        self.source.len() - self.current
    }

    /// Current position (where the next byte will be read)
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Text of the most recently recognised token
    pub fn lexeme(&self) -> &str {
        std::str::from_utf8(&self.lexeme).unwrap_or_default()
    }

    /// Scans all tokens, appending a trailing `Eof`
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.line,
            self.column,
        ));
        Ok(tokens)
    }

    /// Produces the next token, or `None` at end of input
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        if !self.skip_blanks() {
            return Ok(None);
        }

        for (recognise, kind) in RECOGNISERS {
            match recognise(self) {
                Recognised::End => return Ok(None),
                Recognised::NoMatch => continue,
                Recognised::Matched(len) => {
                    let token = Token::new(
                        kind,
                        self.lexeme().to_string(),
                        self.line,
                        self.column - len,
                    );
                    trace!(?kind, lexeme = %token.lexeme, line = token.line, column = token.column, "token");
                    return Ok(Some(token));
                }
            }
        }

        let c = match self.get_c() {
            Some(c) => c,
            None => return Ok(None),
        };
        match TokenKind::punctuation(c) {
            Some(kind) => {
                let token = Token::new(kind, String::new(), self.line, self.column - 1);
                trace!(?kind, line = token.line, column = token.column, "token");
                Ok(Some(token))
            }
            None => {
                self.unget_c(c);
                Err(Error::Parse {
                    message: format!(
                        "unexpected character '{}'",
                        (c as char).escape_default()
                    ),
                    position: self.position(),
                })
            }
        }
    }

    /// Skips whitespace and `//` comments. Returns false at end of input.
    fn skip_blanks(&mut self) -> bool {
        loop {
            loop {
                match self.get_c() {
                    None => return false,
                    Some(c) if c.is_ascii_whitespace() => {}
                    Some(c) => {
                        self.unget_c(c);
                        break;
                    }
                }
            }

            match self.get_c() {
                None => return false,
                Some(b'/') => {}
                Some(c) => {
                    self.unget_c(c);
                    return true;
                }
            }
            match self.get_c() {
                Some(b'/') => {}
                other => {
                    if let Some(c) = other {
                        self.unget_c(c);
                    }
                    self.unget_c(b'/');
                    return true;
                }
            }

            loop {
                match self.get_c() {
                    None => return false,
                    Some(b'\n') => {
                        self.unget_c(b'\n');
                        break;
                    }
                    Some(_) => {}
                }
            }
        }
    }

    fn get_c(&mut self) -> Option<u8> {
        let c = *self.source.get(self.current)?;
        self.current += 1;
        if c == b'\n' {
            self.line += 1;
            self.prev_column = Some(self.column);
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn unget_c(&mut self, c: u8) {
        debug_assert!(self.current > 0);
        debug_assert_eq!(self.source[self.current - 1], c);
        if c == b'\n' {
            self.line -= 1;
            self.column = self.prev_column.take().unwrap_or(1);
        } else {
            self.column -= 1;
        }
        self.current -= 1;
    }

    /// Pushes back every byte of the partial lexeme
    fn undo_lexeme(&mut self) {
        while let Some(c) = self.lexeme.pop() {
            self.unget_c(c);
        }
    }

    /// Reads bytes matching `accept` into the lexeme, pushing back the first
    /// byte that does not match
    fn take_while(&mut self, accept: fn(u8) -> bool) {
        loop {
            match self.get_c() {
                Some(c) if accept(c) => self.lexeme.push(c),
                Some(c) => {
                    self.unget_c(c);
                    break;
                }
                None => break,
            }
        }
    }

    /// Reads one byte into the lexeme if `accept` allows it, else pushes it back
    fn take_exact(&mut self, accept: fn(u8) -> bool) -> bool {
        match self.get_c() {
            Some(c) if accept(c) => {
                self.lexeme.push(c);
                true
            }
            Some(c) => {
                self.unget_c(c);
                false
            }
            None => false,
        }
    }

    /// `$` followed by one or more hex digits
    pub fn recognise_dollar_hex(&mut self) -> Recognised {
        self.lexeme.clear();
        match self.get_c() {
            None => return Recognised::End,
            Some(b'$') => self.lexeme.push(b'$'),
            Some(c) => {
                self.unget_c(c);
                return Recognised::NoMatch;
            }
        }
        self.take_while(|c| c.is_ascii_hexdigit());
        if self.lexeme.len() < 2 {
            self.undo_lexeme();
            return Recognised::NoMatch;
        }
        Recognised::Matched(self.lexeme.len())
    }

    /// `0x` followed by one or more hex digits
    pub fn recognise_hex(&mut self) -> Recognised {
        self.lexeme.clear();
        match self.get_c() {
            None => return Recognised::End,
            Some(b'0') => self.lexeme.push(b'0'),
            Some(c) => {
                self.unget_c(c);
                return Recognised::NoMatch;
            }
        }
        if !self.take_exact(|c| c == b'x') {
            self.undo_lexeme();
            return Recognised::NoMatch;
        }
        self.take_while(|c| c.is_ascii_hexdigit());
        if self.lexeme.len() < 3 {
            self.undo_lexeme();
            return Recognised::NoMatch;
        }
        Recognised::Matched(self.lexeme.len())
    }

    /// One digit, `.`, then exactly two digits
    pub fn recognise_decimal(&mut self) -> Recognised {
        self.lexeme.clear();
        match self.get_c() {
            None => return Recognised::End,
            Some(c) if c.is_ascii_digit() => self.lexeme.push(c),
            Some(c) => {
                self.unget_c(c);
                return Recognised::NoMatch;
            }
        }
        let rest: [fn(u8) -> bool; 3] = [
            |c| c == b'.',
            |c| c.is_ascii_digit(),
            |c| c.is_ascii_digit(),
        ];
        for accept in rest {
            if !self.take_exact(accept) {
                self.undo_lexeme();
                return Recognised::NoMatch;
            }
        }
        Recognised::Matched(self.lexeme.len())
    }

    /// One or more decimal digits
    pub fn recognise_integer(&mut self) -> Recognised {
        self.lexeme.clear();
        match self.get_c() {
            None => return Recognised::End,
            Some(c) if c.is_ascii_digit() => self.lexeme.push(c),
            Some(c) => {
                self.unget_c(c);
                return Recognised::NoMatch;
            }
        }
        self.take_while(|c| c.is_ascii_digit());
        Recognised::Matched(self.lexeme.len())
    }

    /// The literal `nil`
    pub fn recognise_nil(&mut self) -> Recognised {
        self.lexeme.clear();
        match self.get_c() {
            None => return Recognised::End,
            Some(b'n') => self.lexeme.push(b'n'),
            Some(c) => {
                self.unget_c(c);
                return Recognised::NoMatch;
            }
        }
        if !self.take_exact(|c| c == b'i') || !self.take_exact(|c| c == b'l') {
            self.undo_lexeme();
            return Recognised::NoMatch;
        }
        Recognised::Matched(3)
    }

    /// `[A-Za-z_][A-Za-z0-9_]*`
    pub fn recognise_name(&mut self) -> Recognised {
        self.lexeme.clear();
        match self.get_c() {
            None => return Recognised::End,
            Some(c) if c.is_ascii_alphabetic() || c == b'_' => self.lexeme.push(c),
            Some(c) => {
                self.unget_c(c);
                return Recognised::NoMatch;
            }
        }
        self.take_while(|c| c.is_ascii_alphanumeric() || c == b'_');
        Recognised::Matched(self.lexeme.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::new(source)
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn recogniser_table() {
        use Recognised::{End, Matched, NoMatch};
        let cases: &[(&str, Recogniser, Recognised, &str, usize)] = &[
            ("", Scanner::recognise_dollar_hex, End, "", 0),
            (" ", Scanner::recognise_dollar_hex, NoMatch, "", 0),
            ("$", Scanner::recognise_dollar_hex, NoMatch, "", 0),
            ("$$", Scanner::recognise_dollar_hex, NoMatch, "", 0),
            ("$d", Scanner::recognise_dollar_hex, Matched(2), "$d", 2),
            ("$d$", Scanner::recognise_dollar_hex, Matched(2), "$d", 2),
            ("$dae", Scanner::recognise_dollar_hex, Matched(4), "$dae", 4),
            ("$DAVE", Scanner::recognise_dollar_hex, Matched(3), "$DA", 3),
            ("", Scanner::recognise_hex, End, "", 0),
            (" ", Scanner::recognise_hex, NoMatch, "", 0),
            ("0", Scanner::recognise_hex, NoMatch, "", 0),
            ("x", Scanner::recognise_hex, NoMatch, "", 0),
            ("0x", Scanner::recognise_hex, NoMatch, "", 0),
            ("0xx", Scanner::recognise_hex, NoMatch, "", 0),
            ("0x0x", Scanner::recognise_hex, Matched(3), "0x0", 3),
            ("0xd", Scanner::recognise_hex, Matched(3), "0xd", 3),
            ("0xDg", Scanner::recognise_hex, Matched(3), "0xD", 3),
            ("0xDEF", Scanner::recognise_hex, Matched(5), "0xDEF", 5),
            ("", Scanner::recognise_decimal, End, "", 0),
            (" ", Scanner::recognise_decimal, NoMatch, "", 0),
            (".", Scanner::recognise_decimal, NoMatch, "", 0),
            ("..", Scanner::recognise_decimal, NoMatch, "", 0),
            (".1", Scanner::recognise_decimal, NoMatch, "", 0),
            ("1", Scanner::recognise_decimal, NoMatch, "", 0),
            ("1.2", Scanner::recognise_decimal, NoMatch, "", 0),
            ("1.23", Scanner::recognise_decimal, Matched(4), "1.23", 4),
            ("1.23.", Scanner::recognise_decimal, Matched(4), "1.23", 4),
            ("1.234", Scanner::recognise_decimal, Matched(4), "1.23", 4),
            ("", Scanner::recognise_integer, End, "", 0),
            (" ", Scanner::recognise_integer, NoMatch, "", 0),
            ("-1", Scanner::recognise_integer, NoMatch, "", 0),
            ("0", Scanner::recognise_integer, Matched(1), "0", 1),
            ("1", Scanner::recognise_integer, Matched(1), "1", 1),
            ("23", Scanner::recognise_integer, Matched(2), "23", 2),
            ("23 ", Scanner::recognise_integer, Matched(2), "23", 2),
            ("45678", Scanner::recognise_integer, Matched(5), "45678", 5),
            ("", Scanner::recognise_name, End, "", 0),
            (" ", Scanner::recognise_name, NoMatch, "", 0),
            ("0", Scanner::recognise_name, NoMatch, "", 0),
            ("A", Scanner::recognise_name, Matched(1), "A", 1),
            ("_", Scanner::recognise_name, Matched(1), "_", 1),
            ("a0", Scanner::recognise_name, Matched(2), "a0", 2),
            ("A0$", Scanner::recognise_name, Matched(2), "A0", 2),
            ("a0_", Scanner::recognise_name, Matched(3), "a0_", 3),
            ("ni", Scanner::recognise_nil, NoMatch, "", 0),
            ("nill", Scanner::recognise_nil, Matched(3), "nil", 3),
        ];

        for (i, (input, recognise, expected, lexeme, cursor)) in cases.iter().enumerate() {
            let mut scanner = Scanner::new(input);
            let got = recognise(&mut scanner);
            assert_eq!(got, *expected, "case {} ({:?})", i, input);
            if let Recognised::Matched(_) = got {
                assert_eq!(scanner.lexeme(), *lexeme, "case {} ({:?})", i, input);
            }
            assert_eq!(scanner.cursor(), *cursor, "case {} ({:?})", i, input);
            // a failed match must also restore the column
            if got == Recognised::NoMatch {
                assert_eq!(scanner.position(), Position::new(1, 1), "case {}", i);
            }
        }
    }

    #[test]
    fn empty_input_is_end() {
        let mut scanner = Scanner::new("");
        assert!(scanner.next_token().unwrap().is_none());
        assert_eq!(kinds("   \n\t "), vec![TokenKind::Eof]);
    }

    #[test]
    fn literal_forms() {
        let tokens = Scanner::new("$FF 1.23 1.234 nil nill 0x1f 42")
            .scan_tokens()
            .unwrap();
        let got: Vec<(TokenKind, &str)> = tokens
            .iter()
            .map(|t| (t.kind, t.lexeme.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                (TokenKind::DollarHex, "$FF"),
                (TokenKind::Decimal, "1.23"),
                (TokenKind::Decimal, "1.23"),
                (TokenKind::Integer, "4"),
                (TokenKind::Nil, "nil"),
                (TokenKind::Nil, "nil"),
                (TokenKind::Name, "l"),
                (TokenKind::Hex, "0x1f"),
                (TokenKind::Integer, "42"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn punctuation() {
        assert_eq!(
            kinds("( ) * + , - / : ; = [ ] { }"),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Star,
                TokenKind::Plus,
                TokenKind::Comma,
                TokenKind::Minus,
                TokenKind::Slash,
                TokenKind::Colon,
                TokenKind::Semicolon,
                TokenKind::Equals,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn positions_report_token_start() {
        let tokens = Scanner::new("alpha = 12;\n  beta=$1F;").scan_tokens().unwrap();
        let positions: Vec<(usize, usize)> = tokens.iter().map(|t| (t.line, t.column)).collect();
        assert_eq!(
            &positions[..8],
            &[(1, 1), (1, 7), (1, 9), (1, 11), (2, 3), (2, 7), (2, 8), (2, 11)]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("// header\na = 1; // trailing\n// last line without newline"),
            vec![
                TokenKind::Name,
                TokenKind::Equals,
                TokenKind::Integer,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn single_slash_is_punctuation() {
        assert_eq!(
            kinds("/ a"),
            vec![TokenKind::Slash, TokenKind::Name, TokenKind::Eof]
        );
        assert_eq!(kinds("/"), vec![TokenKind::Slash, TokenKind::Eof]);
    }

    #[test]
    fn unknown_character_stops_with_position() {
        let mut scanner = Scanner::new("a = 1;\nb = #;");
        let err = scanner.scan_tokens().unwrap_err();
        match err {
            Error::Parse { message, position } => {
                assert!(message.contains('#'));
                assert_eq!(position, Position::new(2, 5));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn newline_push_back_restores_column() {
        let mut scanner = Scanner::new("ab\ncd");
        let first = scanner.next_token().unwrap().unwrap();
        assert_eq!((first.line, first.column), (1, 1));
        let second = scanner.next_token().unwrap().unwrap();
        assert_eq!((second.line, second.column, second.lexeme.as_str()), (2, 1, "cd"));
    }

    #[test]
    fn missing_file_is_file_open_error() {
        let err = Scanner::from_file("/definitely/not/here.zt").err().unwrap();
        assert!(matches!(err, Error::FileOpen { .. }));
    }
}
