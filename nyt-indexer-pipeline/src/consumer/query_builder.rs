//! Request construction for the external API.
//!
//! Pure functions from a source descriptor and paging parameters to the URL
//! and query string of one API call. No I/O happens here.

use url::Url;

use crate::errors::PipelineError;
use nyt_indexer_shared::{PagingMode, SourceDescriptor, SourceKind};

/// Default base URL of the NYT developer APIs.
pub const DEFAULT_BASE_URL: &str = "https://api.nytimes.com/svc";

/// Name of the API key query parameter.
const API_KEY_PARAM: &str = "api-key";

/// Rows per page served by the offset-paginated endpoints. The API takes no
/// page size parameter, so offsets must step by exactly this much.
pub const API_PAGE_SIZE: u64 = 20;

/// Paging parameters of one request.
///
/// Which keys are required depends on the descriptor's paging mode:
/// `section` for section iteration, `offset` and `page_size` for offset
/// pagination, nothing for flat sources. `page_size` is validated against
/// [`API_PAGE_SIZE`] but not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub section: Option<String>,
    pub offset: Option<u64>,
    pub page_size: Option<u64>,
}

impl QueryParams {
    /// Parameters for a source that needs none.
    pub fn none() -> Self {
        Self::default()
    }

    /// Parameters of a section-scoped request.
    pub fn section(section: impl Into<String>) -> Self {
        Self {
            section: Some(section.into()),
            ..Self::default()
        }
    }

    /// Parameters of an offset-paginated request.
    pub fn page(offset: u64, page_size: u64) -> Self {
        Self {
            offset: Some(offset),
            page_size: Some(page_size),
            ..Self::default()
        }
    }
}

/// A fully formed external API request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    /// Endpoint URL without query string.
    pub url: Url,
    /// Query parameters in the order they are sent.
    pub query: Vec<(String, String)>,
}

impl RequestSpec {
    /// Endpoint URL with the query string appended.
    pub fn to_url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        url
    }

    /// Full URL with the API key masked, for logging.
    pub fn redacted(&self) -> String {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                if key == API_KEY_PARAM {
                    pairs.append_pair(key, "***");
                } else {
                    pairs.append_pair(key, value);
                }
            }
        }
        url.to_string()
    }

    /// Value of a query parameter, if present.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Builds requests for every source kind.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base_url: Url,
    api_key: String,
}

impl QueryBuilder {
    /// Create a builder for the given API base URL and key.
    ///
    /// # Returns
    ///
    /// * `Err(PipelineError::Config)` - If the URL cannot be a base or the key is empty
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, PipelineError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| PipelineError::config(format!("invalid API base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(PipelineError::config("API base URL cannot be a base"));
        }

        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PipelineError::config("API key is empty"));
        }

        Ok(Self { base_url, api_key })
    }

    /// Build the request for `descriptor` with `params`.
    ///
    /// # Returns
    ///
    /// * `Ok(RequestSpec)` - Endpoint plus query parameters, always including the API key
    /// * `Err(PipelineError::InvalidParameter)` - If a key required by the paging mode is missing
    pub fn build(
        &self,
        descriptor: &SourceDescriptor,
        params: &QueryParams,
    ) -> Result<RequestSpec, PipelineError> {
        let mut query = vec![(API_KEY_PARAM.to_string(), self.api_key.clone())];

        match descriptor.paging_mode {
            PagingMode::None => {}
            PagingMode::SectionIteration => {
                required_section(descriptor, params)?;
            }
            PagingMode::Offset => {
                let offset = params.offset.ok_or_else(|| {
                    PipelineError::invalid_parameter(format!(
                        "{} requires an offset",
                        descriptor.kind
                    ))
                })?;
                match params.page_size {
                    Some(API_PAGE_SIZE) => {}
                    Some(size) => {
                        return Err(PipelineError::invalid_parameter(format!(
                            "{} serves pages of {} rows, got page size {}",
                            descriptor.kind, API_PAGE_SIZE, size
                        )))
                    }
                    None => {
                        return Err(PipelineError::invalid_parameter(format!(
                            "{} requires a page size",
                            descriptor.kind
                        )))
                    }
                }
                query.push(("offset".to_string(), offset.to_string()));
            }
        }

        let url = self.endpoint(descriptor, params)?;

        Ok(RequestSpec { url, query })
    }

    fn endpoint(
        &self,
        descriptor: &SourceDescriptor,
        params: &QueryParams,
    ) -> Result<Url, PipelineError> {
        let segments: Vec<String> = match descriptor.kind {
            SourceKind::News => {
                let section = required_section(descriptor, params)?;
                vec![
                    "news".into(),
                    "v3".into(),
                    "content".into(),
                    "all".into(),
                    format!("{}.json", section),
                ]
            }
            SourceKind::NewsSections => vec![
                "news".into(),
                "v3".into(),
                "content".into(),
                "section-list.json".into(),
            ],
            SourceKind::Books => vec![
                "books".into(),
                "v3".into(),
                "lists".into(),
                "best-sellers".into(),
                "history.json".into(),
            ],
            SourceKind::Movies => vec![
                "movies".into(),
                "v2".into(),
                "reviews".into(),
                "search.json".into(),
            ],
        };

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PipelineError::config("API base URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn required_section<'a>(
    descriptor: &SourceDescriptor,
    params: &'a QueryParams,
) -> Result<&'a str, PipelineError> {
    match params.section.as_deref().map(str::trim) {
        Some(section) if !section.is_empty() => Ok(section),
        _ => Err(PipelineError::invalid_parameter(format!(
            "{} requires a section",
            descriptor.kind
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> QueryBuilder {
        QueryBuilder::new(DEFAULT_BASE_URL, "secret-key").unwrap()
    }

    #[test]
    fn test_build_news_section_request() {
        let request = builder()
            .build(&SourceDescriptor::news(), &QueryParams::section("world"))
            .unwrap();

        assert_eq!(
            request.url.as_str(),
            "https://api.nytimes.com/svc/news/v3/content/all/world.json"
        );
        assert_eq!(request.param("api-key"), Some("secret-key"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let params = QueryParams::page(40, 20);
        let first = builder().build(&SourceDescriptor::books(), &params).unwrap();
        let second = builder().build(&SourceDescriptor::books(), &params).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.to_url().as_str(),
            "https://api.nytimes.com/svc/books/v3/lists/best-sellers/history.json?api-key=secret-key&offset=40"
        );
    }

    #[test]
    fn test_build_movies_and_sections() {
        let movies = builder()
            .build(&SourceDescriptor::movies(), &QueryParams::page(0, 20))
            .unwrap();
        assert_eq!(movies.url.path(), "/svc/movies/v2/reviews/search.json");
        assert_eq!(movies.param("offset"), Some("0"));

        let sections = builder()
            .build(&SourceDescriptor::news_sections(), &QueryParams::none())
            .unwrap();
        assert_eq!(sections.url.path(), "/svc/news/v3/content/section-list.json");
        assert_eq!(sections.query.len(), 1);
    }

    #[test]
    fn test_missing_section_is_invalid() {
        let result = builder().build(&SourceDescriptor::news(), &QueryParams::none());
        assert!(matches!(result, Err(PipelineError::InvalidParameter(_))));

        let result = builder().build(&SourceDescriptor::news(), &QueryParams::section("  "));
        assert!(matches!(result, Err(PipelineError::InvalidParameter(_))));
    }

    #[test]
    fn test_missing_offset_or_page_size_is_invalid() {
        let descriptor = SourceDescriptor::books();

        let no_offset = QueryParams {
            page_size: Some(20),
            ..QueryParams::default()
        };
        assert!(matches!(
            builder().build(&descriptor, &no_offset),
            Err(PipelineError::InvalidParameter(_))
        ));

        let no_page_size = QueryParams {
            offset: Some(0),
            ..QueryParams::default()
        };
        assert!(matches!(
            builder().build(&descriptor, &no_page_size),
            Err(PipelineError::InvalidParameter(_))
        ));

        assert!(matches!(
            builder().build(&descriptor, &QueryParams::page(0, 0)),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_page_size_must_match_api_pages() {
        let result = builder().build(&SourceDescriptor::movies(), &QueryParams::page(0, 50));
        assert!(matches!(result, Err(PipelineError::InvalidParameter(_))));

        let request = builder()
            .build(&SourceDescriptor::movies(), &QueryParams::page(0, API_PAGE_SIZE))
            .unwrap();
        assert_eq!(request.param("offset"), Some("0"));
    }

    #[test]
    fn test_section_is_one_encoded_segment() {
        let request = builder()
            .build(&SourceDescriptor::news(), &QueryParams::section("arts/design"))
            .unwrap();
        assert!(request.url.path().ends_with("/all/arts%2Fdesign.json"));
    }

    #[test]
    fn test_base_url_with_trailing_slash() {
        let builder = QueryBuilder::new("http://localhost:8080/svc/", "k").unwrap();
        let request = builder
            .build(&SourceDescriptor::news_sections(), &QueryParams::none())
            .unwrap();
        assert_eq!(request.url.path(), "/svc/news/v3/content/section-list.json");
    }

    #[test]
    fn test_redacted_hides_api_key() {
        let request = builder()
            .build(&SourceDescriptor::movies(), &QueryParams::page(20, 20))
            .unwrap();
        let redacted = request.redacted();
        assert!(!redacted.contains("secret-key"));
        assert!(redacted.contains("offset=20"));
    }

    #[test]
    fn test_new_rejects_bad_config() {
        assert!(matches!(
            QueryBuilder::new("not a url", "k"),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            QueryBuilder::new(DEFAULT_BASE_URL, " "),
            Err(PipelineError::Config(_))
        ));
    }
}
