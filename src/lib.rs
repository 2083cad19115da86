//! Parser for the pooler's block-structured configuration language.
//!
//! Turns raw configuration text into a validated [Scheme] tree. Parsing is
//! single-pass and fail-fast: the first lexical or syntax error aborts with
//! a `file:line message` diagnostic, reported through `tracing` and carried
//! in the returned [Error].
#![deny(elided_lifetimes_in_paths)]

mod lexer;
mod parser;
mod scheme;

pub use parser::ParseError;
pub use scheme::{Scheme, SchemeRoute, SchemeServer, SchemeUser};

#[derive(Debug)]
pub struct Error(Error_);

#[derive(Debug)]
struct Error_ {
    filename: String,
    kind: ErrorKind,
}

#[derive(Debug)]
enum ErrorKind {
    Io(std::io::Error),
    Syntax(parser::ParseError),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.kind {
            ErrorKind::Io(ref e) => write!(f, "{}: {}", self.0.filename, e),
            ErrorKind::Syntax(ref e) => {
                write!(f, "{}:{} {}", self.0.filename, e.line(), e)
            }
        }
    }
}

impl Error {
    /// The configuration file the error occurred in.
    pub fn filename(&self) -> &str {
        self.0.filename.as_str()
    }

    /// The syntax error, if parsing got past reading the file.
    pub fn syntax(&self) -> Option<&ParseError> {
        match self.0.kind {
            ErrorKind::Io(_) => None,
            ErrorKind::Syntax(ref e) => Some(e),
        }
    }
}

// every failed parse reports its location exactly once before returning
fn report(filename: &str, e: &parser::ParseError) {
    tracing::error!("{}:{} {}", filename, e.line(), e);
}

/// Parse configuration text. `name` labels the source in diagnostics only.
pub fn parse_str(name: impl AsRef<str>, inp: &str) -> Result<Scheme, Error> {
    let name = name.as_ref();
    let mut scheme = Scheme::default();
    scheme.config_file = Some(name.into());
    let mut iter = lexer::lex(inp);
    match parser::parse(&mut iter, &mut scheme) {
        Ok(()) => Ok(scheme),
        Err(e) => {
            report(name, &e);
            Err(Error(Error_ {
                filename: name.to_string(),
                kind: ErrorKind::Syntax(e),
            }))
        }
    }
}

/// Read and parse the given configuration file.
pub fn parse_file(p: impl AsRef<str>) -> Result<Scheme, Error> {
    let path = camino::Utf8PathBuf::from(p.as_ref());
    let contents = std::fs::read_to_string(path.as_str()).map_err(|e| {
        tracing::error!("failed to open config file '{}'", path);
        Error(Error_ {
            filename: path.to_string(),
            kind: ErrorKind::Io(e),
        })
    })?;
    parse_str(path.as_str(), contents.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_str_end_to_end() {
        let scheme = parse_str(
            "odissey.conf",
            r#"
odissey {
    listen { host "0.0.0.0" port 6432 }
    users { "alice" { password "secret" } }
    routing { default { pool_max 5 } }
}
"#,
        )
        .unwrap();
        assert_eq!(scheme.config_file.as_deref(), Some("odissey.conf"));
        assert_eq!(scheme.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(scheme.port, 6432);
        assert_eq!(scheme.users.len(), 1);
        assert_eq!(scheme.users[0].user, "alice");
        assert_eq!(scheme.users[0].password.as_deref(), Some("secret"));
        assert_eq!(scheme.routes.len(), 1);
        assert!(scheme.routes[0].is_default);
        assert_eq!(scheme.routes[0].pool_max, 5);
    }

    #[test]
    fn syntax_error_carries_file_and_line() {
        let err = parse_str("pool.conf", "odissey {\n  daemonize 1\n}").unwrap_err();
        assert_eq!(err.filename(), "pool.conf");
        let syntax = err.syntax().unwrap();
        assert_eq!(syntax.line(), 2);
        assert_eq!(err.to_string(), "pool.conf:2 expected yes/no");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = parse_file("/no/such/file.conf").unwrap_err();
        assert_eq!(err.filename(), "/no/such/file.conf");
        assert!(err.syntax().is_none());
    }
}
