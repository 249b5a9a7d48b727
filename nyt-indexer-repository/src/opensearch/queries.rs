//! OpenSearch aggregation query builders.
//!
//! This module builds the fixed aggregation bodies behind the news analytics
//! endpoints. Every query filters on one section and returns no hits, only
//! aggregation buckets.

use serde_json::{json, Value};

use nyt_indexer_shared::{CalendarStep, DateRange};

/// Aggregation name of the top journalists query.
pub const ARTICLES_PER_AUTHOR: &str = "articles_per_author";
/// Aggregation name of the top persons query.
pub const PERSONS: &str = "persons";
/// Aggregation name of the articles histogram.
pub const ARTICLES_OVER_TIME: &str = "articles_over_time";

const TOP_JOURNALISTS_SIZE: u32 = 10;
const TOP_PERSONS_SIZE: u32 = 5;

/// Build the filter clauses for a section and an optional publication range.
///
/// Without a range only the section term is applied.
fn build_filters(section: &str, range: Option<DateRange>) -> Vec<Value> {
    let mut filters = vec![json!({ "term": { "section": section } })];

    if let Some(range) = range {
        filters.push(json!({
            "range": {
                "first_published_date": {
                    "gte": range.start.format("%Y-%m-%d").to_string(),
                    "lte": range.end.format("%Y-%m-%d").to_string()
                }
            }
        }));
    }

    filters
}

/// Build a hits-free terms aggregation over `field`.
fn build_terms_query(
    section: &str,
    range: Option<DateRange>,
    aggregation: &str,
    field: &str,
    size: u32,
) -> Value {
    json!({
        "query": {
            "bool": {
                "filter": build_filters(section, range)
            }
        },
        "size": 0,
        "aggs": {
            aggregation: {
                "terms": {
                    "field": field,
                    "size": size
                }
            }
        }
    })
}

/// Top 10 bylines by article count.
pub fn build_top_journalists_query(section: &str, range: Option<DateRange>) -> Value {
    build_terms_query(
        section,
        range,
        ARTICLES_PER_AUTHOR,
        "byline.keyword",
        TOP_JOURNALISTS_SIZE,
    )
}

/// Top 5 persons of the `per_facet` facet.
pub fn build_top_persons_query(section: &str, range: Option<DateRange>) -> Value {
    build_terms_query(section, range, PERSONS, "per_facet", TOP_PERSONS_SIZE)
}

/// Article counts bucketed by calendar step.
pub fn build_articles_count_query(section: &str, step: CalendarStep) -> Value {
    json!({
        "query": {
            "bool": {
                "filter": build_filters(section, None)
            }
        },
        "size": 0,
        "aggs": {
            ARTICLES_OVER_TIME: {
                "date_histogram": {
                    "field": "first_published_date",
                    "calendar_interval": step.as_str()
                }
            }
        }
    })
}
