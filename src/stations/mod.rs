mod models;
mod name_key;
mod sanitize;
mod stream_url;

pub use models::{
    is_country_code, normalize_country, QueryMode, RadioRecord, SourceName, SourceQuery, DEFAULT_COUNTRY,
};
pub use name_key::{normalize_key, DedupKeys};
pub use sanitize::{absolute_http_url, upgrade_protocol_relative};
pub use stream_url::{normalize_stream, DEFAULT_STREAM_FILE};
