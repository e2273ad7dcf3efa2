pub mod url;

pub use url::{CreateUrlRequest, UrlMapping, UrlStats, VisitEvent};
