use compact_str::CompactString;

/// The configuration tree produced by a successful parse.
///
/// Scalar globals mirror the top-level and `listen` options; `servers`,
/// `routes` and `users` are append-only and keep declaration order. String
/// options are `None` until assigned; numeric options default to zero.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Scheme {
    /// Path of the parsed file, recorded at parse start for error messages.
    pub config_file: Option<CompactString>,
    pub daemonize: bool,
    pub log_verbosity: i64,
    pub log_file: Option<CompactString>,
    pub pid_file: Option<CompactString>,
    pub syslog: bool,
    pub syslog_ident: Option<CompactString>,
    pub syslog_facility: Option<CompactString>,
    /// Pooling mode name, e.g. "session" or "transaction".
    pub pooling: Option<CompactString>,
    /// Routing mode name from `routing { mode ... }`.
    pub routing: Option<CompactString>,
    pub host: Option<CompactString>,
    pub port: i64,
    pub backlog: i64,
    pub nodelay: bool,
    pub keepalive: i64,
    pub client_max: i64,
    pub workers: i64,
    pub servers: Vec<SchemeServer>,
    pub routes: Vec<SchemeRoute>,
    pub users: Vec<SchemeUser>,
}

/// A backend server declaration: `server "name" { host ... port ... }`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SchemeServer {
    pub name: CompactString,
    pub host: Option<CompactString>,
    pub port: i64,
}

/// One routing policy entry. A named route targets the database whose name
/// it carries; the `default` route has an empty target and `is_default` set.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SchemeRoute {
    pub target: CompactString,
    pub is_default: bool,
    /// Alias from the `route` option, naming the server to forward to.
    pub route: Option<CompactString>,
    pub client_max: i64,
    pub pool_min: i64,
    pub pool_max: i64,
    pub database: Option<CompactString>,
    pub user: Option<CompactString>,
    pub password: Option<CompactString>,
    pub ttl: i64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SchemeUser {
    pub user: CompactString,
    pub password: Option<CompactString>,
}

impl Scheme {
    /// Append an empty server entry and hand back a handle to fill in.
    pub fn add_server(&mut self) -> &mut SchemeServer {
        self.servers.push(SchemeServer::default());
        self.servers.last_mut().unwrap()
    }

    pub fn add_route(&mut self) -> &mut SchemeRoute {
        self.routes.push(SchemeRoute::default());
        self.routes.last_mut().unwrap()
    }

    pub fn add_user(&mut self) -> &mut SchemeUser {
        self.users.push(SchemeUser::default());
        self.users.last_mut().unwrap()
    }
}
