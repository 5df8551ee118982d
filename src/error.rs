//! Rich diagnostic error types for the T32 roster engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so operators know exactly
//! what went wrong and how to fix it.
//!
//! Most graph failures never reach these types' callers: resolution, attribute
//! and aggregation lookups recover locally to `None`. Only a graph that cannot be
//! reached at all is fatal.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the T32 roster engine.
#[derive(Debug, Error, Diagnostic)]
pub enum T32Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Enrich(#[from] EnrichError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("cannot reach SPARQL endpoint {endpoint}: {message}")]
    #[diagnostic(
        code(t32::graph::transport),
        help(
            "The knowledge-graph service did not answer. Check the `graph.endpoint` \
             URL, your network connection, and raise `graph.timeout_secs` if the \
             service is slow."
        )
    )]
    Transport { endpoint: String, message: String },

    #[error("SPARQL endpoint returned HTTP {status}: {message}")]
    #[diagnostic(
        code(t32::graph::endpoint),
        help(
            "The endpoint rejected the query. A 401/403 usually means the \
             `graph.email`/`graph.password` credentials are wrong; a 400 means the \
             query did not parse on the server."
        )
    )]
    Endpoint { status: u16, message: String },

    #[error("malformed SPARQL results: {message}")]
    #[diagnostic(
        code(t32::graph::response),
        help("The endpoint must answer with `application/sparql-results+json`.")
    )]
    Response { message: String },

    #[error("SPARQL query error: {message}")]
    #[diagnostic(
        code(t32::graph::sparql),
        help(
            "The SPARQL query failed on the local store. Check the query syntax and \
             that every prefix it uses is declared in `graph.prefixes`."
        )
    )]
    Sparql { message: String },

    #[error("failed to load RDF data from {path}: {message}")]
    #[diagnostic(
        code(t32::graph::load),
        help(
            "Use a file extension oxigraph recognizes (.ttl, .nt, .nq, .trig, .rdf, \
             .n3) and check the file for syntax errors."
        )
    )]
    Load { path: String, message: String },

    #[error("query parameter `{name}` has an invalid value \"{value}\": {reason}")]
    #[diagnostic(
        code(t32::graph::invalid_param),
        help("IRIs must be absolute, predicates must be `prefix:local` or `<iri>`.")
    )]
    InvalidParam {
        name: String,
        value: String,
        reason: String,
    },

    #[error("query template references unbound parameter `{name}`")]
    #[diagnostic(
        code(t32::graph::missing_param),
        help("Supply every `{{{{name}}}}` placeholder of the template in the Params map.")
    )]
    MissingParam { name: String },
}

// ---------------------------------------------------------------------------
// Roster errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RosterError {
    #[error("failed to read roster: {path}")]
    #[diagnostic(
        code(t32::roster::read),
        help("Ensure the roster file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("roster has no header row")]
    #[diagnostic(
        code(t32::roster::no_header),
        help("The first non-empty line of the roster must name its columns.")
    )]
    MissingHeader,

    #[error("roster header lacks required column \"{column}\"")]
    #[diagnostic(
        code(t32::roster::missing_column),
        help(
            "Add the column to the roster, or map it to an existing column name \
             under `[roster.columns]` in the configuration."
        )
    )]
    MissingColumn { column: String },

    #[error("unterminated quoted field on line {line}")]
    #[diagnostic(
        code(t32::roster::unterminated_quote),
        help("Close the quote, or double embedded quotes (\"\") inside quoted fields.")
    )]
    UnterminatedQuote { line: usize },
}

// ---------------------------------------------------------------------------
// Enrichment errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EnrichError {
    #[error("failed to start enrichment worker pool: {message}")]
    #[diagnostic(
        code(t32::enrich::worker_pool),
        help("Lower `enrich.workers`, or set it to 1 for sequential enrichment.")
    )]
    WorkerPool { message: String },
}

// ---------------------------------------------------------------------------
// Report errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ReportError {
    #[error("failed to write report: {source}")]
    #[diagnostic(
        code(t32::report::io),
        help("Check that the output directory exists and is writable.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {message}")]
    #[diagnostic(code(t32::report::serialize))]
    Serialization { message: String },

    #[error("unknown report format \"{format}\"")]
    #[diagnostic(
        code(t32::report::unknown_format),
        help("Supported formats are `rtf` and `json`.")
    )]
    UnknownFormat { format: String },
}

impl From<std::io::Error> for ReportError {
    fn from(source: std::io::Error) -> Self {
        ReportError::Io { source }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(t32::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(t32::config::parse),
        help("Check the TOML syntax and field names in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(t32::config::write),
        help("Ensure you have write permissions to the target directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no knowledge graph configured")]
    #[diagnostic(
        code(t32::config::no_graph),
        help(
            "Set `graph.endpoint` (or pass --endpoint) to query a SPARQL service, \
             or list RDF files in `graph.data_files` (or pass --data) to query a local snapshot."
        )
    )]
    NoGraph,
}

/// Convenience alias for functions returning T32 results.
pub type T32Result<T> = std::result::Result<T, T32Error>;
