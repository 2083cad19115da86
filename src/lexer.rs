use compact_str::CompactString;

#[derive(PartialEq, Eq, Debug)]
pub(crate) struct Token {
    pub line: usize,
    pub kind: TokenKind,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub(crate) enum TokenKind {
    LCurly,
    RCurly,
    Keyword(Keyword),
    String(CompactString),
    Number(i64),
}

/// Reserved words of the configuration grammar. The parser dispatches on
/// these; an identifier not found in [KEYWORDS] is a lexical error.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub(crate) enum Keyword {
    Odissey,
    Yes,
    No,
    On,
    Off,
    Daemonize,
    LogVerbosity,
    LogFile,
    PidFile,
    Syslog,
    SyslogIdent,
    SyslogFacility,
    Pooling,
    Listen,
    Host,
    Port,
    Backlog,
    Nodelay,
    Keepalive,
    Workers,
    ClientMax,
    Server,
    Routing,
    Default,
    Route,
    Mode,
    Database,
    User,
    Password,
    Ttl,
    PoolMin,
    PoolMax,
    Users,
}

static KEYWORDS: &[(&str, Keyword)] = &[
    ("odissey", Keyword::Odissey),
    ("yes", Keyword::Yes),
    ("no", Keyword::No),
    ("on", Keyword::On),
    ("off", Keyword::Off),
    ("daemonize", Keyword::Daemonize),
    ("log_verbosity", Keyword::LogVerbosity),
    ("log_file", Keyword::LogFile),
    ("pid_file", Keyword::PidFile),
    ("syslog", Keyword::Syslog),
    ("syslog_ident", Keyword::SyslogIdent),
    ("syslog_facility", Keyword::SyslogFacility),
    ("pooling", Keyword::Pooling),
    ("listen", Keyword::Listen),
    ("host", Keyword::Host),
    ("port", Keyword::Port),
    ("backlog", Keyword::Backlog),
    ("nodelay", Keyword::Nodelay),
    ("keepalive", Keyword::Keepalive),
    ("workers", Keyword::Workers),
    ("client_max", Keyword::ClientMax),
    ("server", Keyword::Server),
    ("routing", Keyword::Routing),
    ("default", Keyword::Default),
    ("route", Keyword::Route),
    ("mode", Keyword::Mode),
    ("database", Keyword::Database),
    ("user", Keyword::User),
    ("password", Keyword::Password),
    ("ttl", Keyword::Ttl),
    ("pool_min", Keyword::PoolMin),
    ("pool_max", Keyword::PoolMax),
    ("users", Keyword::Users),
];

impl Keyword {
    pub(crate) fn name(&self) -> &'static str {
        match KEYWORDS.iter().find(|tup| tup.1 == *self) {
            Some((name, _)) => name,
            None => unreachable!(),
        }
    }
}

#[derive(PartialEq, Eq, Debug)]
pub(crate) struct LexError {
    pub line: usize,
    pub kind: LexErrorKind,
}

#[derive(PartialEq, Eq, Debug)]
pub(crate) enum LexErrorKind {
    UnterminatedString,
    BadNumber,
    UnknownKeyword(CompactString),
    UnknownCharacter(char),
}

impl std::fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            LexErrorKind::UnterminatedString => write!(f, "unterminated string"),
            LexErrorKind::BadNumber => write!(f, "bad number"),
            LexErrorKind::UnknownKeyword(ref w) => write!(f, "unknown keyword '{}'", w),
            LexErrorKind::UnknownCharacter(c) => write!(f, "unknown character '{}'", c),
        }
    }
}

fn token(line: usize, kind: TokenKind) -> Token {
    Token { line, kind }
}

fn lex_error(line: usize, kind: LexErrorKind) -> LexError {
    LexError { line, kind }
}

/// Forward-only token stream over the raw configuration text. Lines are
/// 1-based; `line` is read by the parser to locate end-of-input errors,
/// where no token exists to carry a position.
#[derive(PartialEq, Eq, Debug, Clone)]
pub(crate) struct TokenIter<'s> {
    inp: &'s str,
    pub(crate) line: usize,
}

pub(crate) fn lex(inp: &str) -> TokenIter<'_> {
    TokenIter { inp, line: 1 }
}

impl<'s> TokenIter<'s> {
    fn next_token(&mut self) -> Option<Result<Token, LexError>> {
        loop {
            match *self.inp.as_bytes() {
                [] => return None,
                [b'\n', ..] => {
                    self.line += 1;
                    self.inp = &self.inp[1..];
                }
                [b'{', ..] => {
                    self.inp = &self.inp[1..];
                    return Some(Ok(token(self.line, TokenKind::LCurly)));
                }
                [b'}', ..] => {
                    self.inp = &self.inp[1..];
                    return Some(Ok(token(self.line, TokenKind::RCurly)));
                }
                [b'#', ..] => {
                    // leave the newline for the outer loop so it is counted once
                    self.inp = take_until_byte(self.inp, b'\n');
                }
                [b'"', ..] => return Some(self.munch_string()),
                [b'-', ..] => return Some(self.munch_number()),
                [b, ..] if b.is_ascii_digit() => return Some(self.munch_number()),
                [b, ..] if b.is_ascii_alphabetic() || b == b'_' => {
                    return Some(self.munch_word())
                }
                [b, ..] if (b as char).is_whitespace() => {
                    self.inp = &self.inp[1..];
                }
                [_, ..] => {
                    // decode the full char so multi-byte input is not mangled
                    let c = match self.inp.chars().next() {
                        Some(c) => c,
                        None => unreachable!(),
                    };
                    return Some(Err(lex_error(
                        self.line,
                        LexErrorKind::UnknownCharacter(c),
                    )));
                }
            }
        }
    }

    // strings are raw spans between double quotes, no escapes; a newline
    // before the closing quote makes the string unterminated
    fn munch_string(&mut self) -> Result<Token, LexError> {
        let line = self.line;
        let rest = &self.inp[1..];
        let mut i = 0;
        loop {
            match rest.as_bytes().get(i).copied() {
                Some(b'"') => break,
                Some(b'\n') | None => {
                    return Err(lex_error(line, LexErrorKind::UnterminatedString))
                }
                Some(_) => i += 1,
            }
        }
        let value: CompactString = rest[..i].into();
        self.inp = &rest[i + 1..];
        Ok(token(line, TokenKind::String(value)))
    }

    fn munch_number(&mut self) -> Result<Token, LexError> {
        let line = self.line;
        let mut i = 0;
        if let Some(b'-') = self.inp.as_bytes().first().copied() {
            i += 1;
        }
        while let Some(b'0'..=b'9') = self.inp.as_bytes().get(i).copied() {
            i += 1;
        }
        // digits running straight into a word, e.g. `6432x`
        if let Some(b) = self.inp.as_bytes().get(i).copied() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                return Err(lex_error(line, LexErrorKind::BadNumber));
            }
        }
        // also covers a bare `-` and values outside i64
        let num = self.inp[..i]
            .parse::<i64>()
            .map_err(|_| lex_error(line, LexErrorKind::BadNumber))?;
        self.inp = &self.inp[i..];
        Ok(token(line, TokenKind::Number(num)))
    }

    fn munch_word(&mut self) -> Result<Token, LexError> {
        let line = self.line;
        let inp = self.inp;
        let mut i = 0;
        loop {
            match inp.as_bytes().get(i).copied() {
                Some(b) if b.is_ascii_alphanumeric() || b == b'_' => i += 1,
                _ => break,
            }
        }
        let word = &inp[..i];
        // consume the word either way, so iterating past an error advances
        self.inp = &inp[i..];
        match KEYWORDS.iter().find(|tup| tup.0 == word) {
            Some((_, kw)) => Ok(token(line, TokenKind::Keyword(*kw))),
            None => Err(lex_error(line, LexErrorKind::UnknownKeyword(word.into()))),
        }
    }
}

impl<'s> Iterator for TokenIter<'s> {
    type Item = Result<Token, LexError>;
    fn next(&mut self) -> Option<Self::Item> {
        TokenIter::next_token(self)
    }
}

fn take_until_byte(mut inp: &str, b: u8) -> &str {
    loop {
        match *inp.as_bytes() {
            [] => return "",
            [f, ..] => {
                if f == b {
                    return inp;
                } else {
                    inp = &inp[1..];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(inp: &str) -> Vec<TokenKind> {
        lex(inp).map(|tok| tok.unwrap().kind).collect()
    }

    #[test]
    fn punctuation_keywords_and_values() {
        let toks = kinds("odissey { port 6432 host \"0.0.0.0\" }");
        assert_eq!(
            toks,
            vec![
                TokenKind::Keyword(Keyword::Odissey),
                TokenKind::LCurly,
                TokenKind::Keyword(Keyword::Port),
                TokenKind::Number(6432),
                TokenKind::Keyword(Keyword::Host),
                TokenKind::String("0.0.0.0".into()),
                TokenKind::RCurly,
            ]
        );
    }

    #[test]
    fn lines_are_one_based_and_counted() {
        let mut iter = lex("listen\n{\n}\n");
        assert_eq!(iter.next().unwrap().unwrap().line, 1);
        assert_eq!(iter.next().unwrap().unwrap().line, 2);
        assert_eq!(iter.next().unwrap().unwrap().line, 3);
        assert!(iter.next().is_none());
        assert_eq!(iter.line, 4);
    }

    #[test]
    fn comments_are_stripped() {
        let toks = kinds("# header\nport 1 # trailing\nttl 2\n");
        assert_eq!(
            toks,
            vec![
                TokenKind::Keyword(Keyword::Port),
                TokenKind::Number(1),
                TokenKind::Keyword(Keyword::Ttl),
                TokenKind::Number(2),
            ]
        );
    }

    #[test]
    fn negative_number() {
        assert_eq!(kinds("-1"), vec![TokenKind::Number(-1)]);
    }

    #[test]
    fn empty_string_token() {
        assert_eq!(kinds("\"\""), vec![TokenKind::String("".into())]);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = lex("host \"0.0.0.0\nport 1").nth(1).unwrap().unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.kind.to_string(), "unterminated string");
    }

    #[test]
    fn unknown_identifier_is_an_error() {
        let err = lex("bogus").next().unwrap().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnknownKeyword("bogus".into()));
    }

    #[test]
    fn stream_advances_past_an_unknown_keyword() {
        let mut iter = lex("bogus port");
        assert!(iter.next().unwrap().is_err());
        let tok = iter.next().unwrap().unwrap();
        assert_eq!(tok.kind, TokenKind::Keyword(Keyword::Port));
    }

    #[test]
    fn unknown_character_is_an_error() {
        let err = lex("port = 1").nth(1).unwrap().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnknownCharacter('='));
    }

    #[test]
    fn unknown_character_keeps_multi_byte_chars_whole() {
        let err = lex("é").next().unwrap().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnknownCharacter('é'));
    }

    #[test]
    fn number_glued_to_word_is_an_error() {
        let err = lex("6432x").next().unwrap().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::BadNumber);
    }

    #[test]
    fn every_keyword_round_trips_through_its_name() {
        for &(text, kw) in KEYWORDS.iter() {
            assert_eq!(kw.name(), text);
            assert_eq!(kinds(text), vec![TokenKind::Keyword(kw)]);
        }
    }
}
