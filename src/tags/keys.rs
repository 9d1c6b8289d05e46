//! Annotation vocabulary.
//!
//! The set of recognized keys is fixed and versioned with the tool. Keys not
//! listed here still survive parsing and folding; emitters decide whether
//! they mean anything.

// -- Transport selectors ------------------------------------------------------

pub const HTTP_SERVER: &str = "http-server";
pub const JSON_RPC_SERVER: &str = "jsonRPC-server";

// -- REST routing -------------------------------------------------------------

pub const HTTP_METHOD: &str = "http-method";
pub const HTTP_PATH: &str = "http-path";
pub const HTTP_PREFIX: &str = "http-prefix";
pub const HTTP_SUCCESS: &str = "http-success";
pub const HTTP_RESPONSE: &str = "http-response";
pub const HTTP_ARGS: &str = "http-args";
pub const HTTP_HEADERS: &str = "http-headers";
pub const HTTP_COOKIES: &str = "http-cookies";
pub const REQUEST_CONTENT_TYPE: &str = "requestContentType";
pub const RESPONSE_CONTENT_TYPE: &str = "responseContentType";

// -- Parameter scope ----------------------------------------------------------

/// Explicit wire location of a single parameter.
pub const IN: &str = "in";
/// Explicit wire name of a single parameter.
pub const NAME: &str = "name";

// -- Documentation ------------------------------------------------------------

pub const SUMMARY: &str = "summary";
pub const DESC: &str = "desc";
pub const TAGS: &str = "tags";
pub const SWAGGER_TAGS: &str = "swaggerTags";
pub const DEPRECATED: &str = "deprecated";
pub const EXPERIMENTAL: &str = "experimental";
pub const TITLE: &str = "title";
pub const VERSION: &str = "version";
pub const SERVERS: &str = "servers";
pub const AUTHOR: &str = "author";
pub const LICENSE: &str = "license";

// -- Observability ------------------------------------------------------------

pub const LOG: &str = "log";
pub const LOG_SKIP: &str = "log-skip";
pub const TRACE: &str = "trace";
pub const METRICS: &str = "metrics";

/// Keys whose values accumulate across folded scopes.
const LIST_KEYS: &[&str] = &[
    HTTP_ARGS,
    HTTP_HEADERS,
    HTTP_COOKIES,
    LOG_SKIP,
    TAGS,
    SWAGGER_TAGS,
];

const KNOWN_KEYS: &[&str] = &[
    HTTP_SERVER,
    JSON_RPC_SERVER,
    HTTP_METHOD,
    HTTP_PATH,
    HTTP_PREFIX,
    HTTP_SUCCESS,
    HTTP_RESPONSE,
    HTTP_ARGS,
    HTTP_HEADERS,
    HTTP_COOKIES,
    REQUEST_CONTENT_TYPE,
    RESPONSE_CONTENT_TYPE,
    IN,
    NAME,
    SUMMARY,
    DESC,
    TAGS,
    SWAGGER_TAGS,
    DEPRECATED,
    EXPERIMENTAL,
    TITLE,
    VERSION,
    SERVERS,
    AUTHOR,
    LICENSE,
    LOG,
    LOG_SKIP,
    TRACE,
    METRICS,
];

/// True if values for `key` accumulate instead of overriding.
pub fn is_list(key: &str) -> bool {
    LIST_KEYS.contains(&key)
}

/// True if `key` belongs to the recognized vocabulary.
pub fn is_known(key: &str) -> bool {
    KNOWN_KEYS.contains(&key)
}
