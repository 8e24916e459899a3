pub mod http_resolver;

pub use http_resolver::HttpGeolocationResolver;
