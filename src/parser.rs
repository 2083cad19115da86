use compact_str::CompactString;

use crate::lexer::{self, Keyword, Token, TokenKind};
use crate::scheme::Scheme;

/// One recognized token-kind the grammar can require next. Carries no
/// payload so a mismatch message can name what was wanted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum TokenShape {
    LCurly,
    String,
    Number,
    Keyword(Keyword),
}

impl TokenShape {
    fn matches(&self, kind: &TokenKind) -> bool {
        match *self {
            TokenShape::LCurly => matches!(kind, TokenKind::LCurly),
            TokenShape::String => matches!(kind, TokenKind::String(_)),
            TokenShape::Number => matches!(kind, TokenKind::Number(_)),
            TokenShape::Keyword(kw) => matches!(kind, TokenKind::Keyword(k) if *k == kw),
        }
    }

    fn symbol(&self) -> &'static str {
        match *self {
            TokenShape::LCurly => "{",
            TokenShape::String => "string",
            TokenShape::Number => "number",
            TokenShape::Keyword(kw) => kw.name(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseError {
    line: usize,
    kind: ParseErrorKind,
}

impl ParseError {
    /// One-based line of the input on which the error occurred.
    pub fn line(&self) -> usize {
        self.line
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ParseErrorKind {
    Lex(lexer::LexErrorKind),
    UnexpectedEof,
    UnknownOption,
    ExpectedYesNo,
    Expected(TokenShape),
}

impl std::error::Error for ParseError {}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            // the token source's diagnostic, verbatim
            ParseErrorKind::Lex(ref e) => write!(f, "{}", e),
            ParseErrorKind::UnexpectedEof => write!(f, "unexpected end of config file"),
            ParseErrorKind::UnknownOption => write!(f, "unknown option"),
            ParseErrorKind::ExpectedYesNo => write!(f, "expected yes/no"),
            ParseErrorKind::Expected(shape) => write!(f, "expected '{}'", shape.symbol()),
        }
    }
}

impl From<lexer::LexError> for ParseError {
    fn from(e: lexer::LexError) -> ParseError {
        ParseError {
            line: e.line,
            kind: ParseErrorKind::Lex(e.kind),
        }
    }
}

fn parse_error(line: usize, kind: ParseErrorKind) -> ParseError {
    ParseError { line, kind }
}

// end of input has no token to carry a line, so use the stream's counter
fn next_not_eof(iter: &mut lexer::TokenIter<'_>) -> Result<Token, ParseError> {
    match iter.next() {
        Some(tok) => Ok(tok?),
        None => Err(parse_error(iter.line, ParseErrorKind::UnexpectedEof)),
    }
}

fn expect(iter: &mut lexer::TokenIter<'_>, shape: TokenShape) -> Result<Token, ParseError> {
    let tok = next_not_eof(iter)?;
    if shape.matches(&tok.kind) {
        Ok(tok)
    } else {
        Err(parse_error(tok.line, ParseErrorKind::Expected(shape)))
    }
}

fn munch_string(iter: &mut lexer::TokenIter<'_>) -> Result<CompactString, ParseError> {
    let tok = expect(iter, TokenShape::String)?;
    match tok.kind {
        TokenKind::String(s) => Ok(s),
        _ => unreachable!(),
    }
}

fn munch_number(iter: &mut lexer::TokenIter<'_>) -> Result<i64, ParseError> {
    let tok = expect(iter, TokenShape::Number)?;
    match tok.kind {
        TokenKind::Number(n) => Ok(n),
        _ => unreachable!(),
    }
}

// boolean options accept yes/on and no/off; anything else is a failure,
// and unlike `expect` a lexical error in the value position is reported
// as "expected yes/no" too, not as the lexer's diagnostic
fn munch_yes_no(iter: &mut lexer::TokenIter<'_>) -> Result<bool, ParseError> {
    let tok = match iter.next() {
        Some(Ok(tok)) => tok,
        Some(Err(e)) => return Err(parse_error(e.line, ParseErrorKind::ExpectedYesNo)),
        None => return Err(parse_error(iter.line, ParseErrorKind::UnexpectedEof)),
    };
    match tok.kind {
        TokenKind::Keyword(Keyword::Yes) | TokenKind::Keyword(Keyword::On) => Ok(true),
        TokenKind::Keyword(Keyword::No) | TokenKind::Keyword(Keyword::Off) => Ok(false),
        _ => Err(parse_error(tok.line, ParseErrorKind::ExpectedYesNo)),
    }
}

// listen { host "..." port n backlog n nodelay yes/no keepalive n client_max n workers n }
fn parse_listen(iter: &mut lexer::TokenIter<'_>, scheme: &mut Scheme) -> Result<(), ParseError> {
    expect(iter, TokenShape::LCurly)?;
    loop {
        let tok = next_not_eof(iter)?;
        match tok.kind {
            TokenKind::Keyword(Keyword::Host) => scheme.host = Some(munch_string(iter)?),
            TokenKind::Keyword(Keyword::Port) => scheme.port = munch_number(iter)?,
            TokenKind::Keyword(Keyword::Backlog) => scheme.backlog = munch_number(iter)?,
            TokenKind::Keyword(Keyword::Nodelay) => scheme.nodelay = munch_yes_no(iter)?,
            TokenKind::Keyword(Keyword::Keepalive) => scheme.keepalive = munch_number(iter)?,
            TokenKind::Keyword(Keyword::ClientMax) => scheme.client_max = munch_number(iter)?,
            TokenKind::Keyword(Keyword::Workers) => scheme.workers = munch_number(iter)?,
            TokenKind::RCurly => return Ok(()),
            _ => return Err(parse_error(tok.line, ParseErrorKind::UnknownOption)),
        }
    }
}

// server "name" { host "..." port n }
fn parse_server(iter: &mut lexer::TokenIter<'_>, scheme: &mut Scheme) -> Result<(), ParseError> {
    // the name sits between the keyword and the opening brace
    let name = munch_string(iter)?;
    expect(iter, TokenShape::LCurly)?;
    let server = scheme.add_server();
    server.name = name;
    loop {
        let tok = next_not_eof(iter)?;
        match tok.kind {
            TokenKind::Keyword(Keyword::Host) => server.host = Some(munch_string(iter)?),
            TokenKind::Keyword(Keyword::Port) => server.port = munch_number(iter)?,
            TokenKind::RCurly => return Ok(()),
            _ => return Err(parse_error(tok.line, ParseErrorKind::UnknownOption)),
        }
    }
}

// the body of a named or default route; `name` is None for `default`
fn parse_route(
    iter: &mut lexer::TokenIter<'_>,
    scheme: &mut Scheme,
    name: Option<CompactString>,
) -> Result<(), ParseError> {
    expect(iter, TokenShape::LCurly)?;
    let route = scheme.add_route();
    match name {
        Some(target) => route.target = target,
        None => route.is_default = true,
    }
    loop {
        let tok = next_not_eof(iter)?;
        match tok.kind {
            TokenKind::Keyword(Keyword::Route) => route.route = Some(munch_string(iter)?),
            TokenKind::Keyword(Keyword::ClientMax) => route.client_max = munch_number(iter)?,
            TokenKind::Keyword(Keyword::PoolMin) => route.pool_min = munch_number(iter)?,
            TokenKind::Keyword(Keyword::PoolMax) => route.pool_max = munch_number(iter)?,
            TokenKind::Keyword(Keyword::Database) => route.database = Some(munch_string(iter)?),
            TokenKind::Keyword(Keyword::User) => route.user = Some(munch_string(iter)?),
            TokenKind::Keyword(Keyword::Password) => route.password = Some(munch_string(iter)?),
            TokenKind::Keyword(Keyword::Ttl) => route.ttl = munch_number(iter)?,
            TokenKind::RCurly => return Ok(()),
            _ => return Err(parse_error(tok.line, ParseErrorKind::UnknownOption)),
        }
    }
}

// routing { mode "..." "db" { ... } default { ... } }
// a bare string at this level starts a named route
fn parse_routing(iter: &mut lexer::TokenIter<'_>, scheme: &mut Scheme) -> Result<(), ParseError> {
    expect(iter, TokenShape::LCurly)?;
    loop {
        let tok = next_not_eof(iter)?;
        match tok.kind {
            TokenKind::Keyword(Keyword::Mode) => scheme.routing = Some(munch_string(iter)?),
            TokenKind::String(name) => parse_route(iter, scheme, Some(name))?,
            TokenKind::Keyword(Keyword::Default) => parse_route(iter, scheme, None)?,
            TokenKind::RCurly => return Ok(()),
            _ => return Err(parse_error(tok.line, ParseErrorKind::UnknownOption)),
        }
    }
}

// "username" { password "..." }
fn parse_user(
    iter: &mut lexer::TokenIter<'_>,
    scheme: &mut Scheme,
    name: CompactString,
) -> Result<(), ParseError> {
    expect(iter, TokenShape::LCurly)?;
    let user = scheme.add_user();
    user.user = name;
    loop {
        let tok = next_not_eof(iter)?;
        match tok.kind {
            TokenKind::Keyword(Keyword::Password) => user.password = Some(munch_string(iter)?),
            TokenKind::RCurly => return Ok(()),
            _ => return Err(parse_error(tok.line, ParseErrorKind::UnknownOption)),
        }
    }
}

fn parse_users(iter: &mut lexer::TokenIter<'_>, scheme: &mut Scheme) -> Result<(), ParseError> {
    expect(iter, TokenShape::LCurly)?;
    loop {
        let tok = next_not_eof(iter)?;
        match tok.kind {
            TokenKind::String(name) => parse_user(iter, scheme, name)?,
            TokenKind::RCurly => return Ok(()),
            _ => return Err(parse_error(tok.line, ParseErrorKind::UnknownOption)),
        }
    }
}

/// Drive the whole grammar: `odissey { ... }`. The scheme may be left
/// partially populated on failure and must be discarded by the caller.
pub(crate) fn parse(iter: &mut lexer::TokenIter<'_>, scheme: &mut Scheme) -> Result<(), ParseError> {
    expect(iter, TokenShape::Keyword(Keyword::Odissey))?;
    expect(iter, TokenShape::LCurly)?;
    loop {
        let tok = next_not_eof(iter)?;
        match tok.kind {
            TokenKind::Keyword(Keyword::Daemonize) => scheme.daemonize = munch_yes_no(iter)?,
            TokenKind::Keyword(Keyword::LogVerbosity) => {
                scheme.log_verbosity = munch_number(iter)?
            }
            TokenKind::Keyword(Keyword::LogFile) => scheme.log_file = Some(munch_string(iter)?),
            TokenKind::Keyword(Keyword::PidFile) => scheme.pid_file = Some(munch_string(iter)?),
            TokenKind::Keyword(Keyword::Syslog) => scheme.syslog = munch_yes_no(iter)?,
            TokenKind::Keyword(Keyword::SyslogIdent) => {
                scheme.syslog_ident = Some(munch_string(iter)?)
            }
            TokenKind::Keyword(Keyword::SyslogFacility) => {
                scheme.syslog_facility = Some(munch_string(iter)?)
            }
            TokenKind::Keyword(Keyword::Pooling) => scheme.pooling = Some(munch_string(iter)?),
            TokenKind::Keyword(Keyword::Listen) => parse_listen(iter, scheme)?,
            TokenKind::Keyword(Keyword::Server) => parse_server(iter, scheme)?,
            TokenKind::Keyword(Keyword::Routing) => parse_routing(iter, scheme)?,
            TokenKind::Keyword(Keyword::Users) => parse_users(iter, scheme)?,
            TokenKind::RCurly => return Ok(()),
            _ => return Err(parse_error(tok.line, ParseErrorKind::UnknownOption)),
        }
    }
}
