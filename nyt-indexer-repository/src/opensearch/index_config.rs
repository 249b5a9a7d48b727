//! OpenSearch index settings and mappings.
//!
//! One definition per collection the harvester writes to. Fields not listed
//! here are mapped dynamically.

use serde_json::{json, Value};

use crate::types::IndexDefinition;
use nyt_indexer_shared::SourceKind;

fn default_settings() -> Value {
    json!({
        "number_of_shards": 1,
        "number_of_replicas": 1
    })
}

/// Text field with a `keyword` sub-field for terms aggregations.
fn text_with_keyword() -> Value {
    json!({
        "type": "text",
        "fields": {
            "keyword": { "type": "keyword", "ignore_above": 256 }
        }
    })
}

fn news_mappings() -> Value {
    json!({
        "properties": {
            "uri": { "type": "keyword" },
            "url": { "type": "keyword", "index": false },
            "section": { "type": "keyword" },
            "subsection": { "type": "keyword" },
            "title": text_with_keyword(),
            "abstract": { "type": "text" },
            "byline": text_with_keyword(),
            "source": { "type": "keyword" },
            "item_type": { "type": "keyword" },
            "material_type_facet": { "type": "keyword" },
            "des_facet": { "type": "keyword" },
            "org_facet": { "type": "keyword" },
            "per_facet": { "type": "keyword" },
            "geo_facet": { "type": "keyword" },
            "published_date": { "type": "date" },
            "first_published_date": { "type": "date" },
            "updated_date": { "type": "date" },
            "created_date": { "type": "date" }
        }
    })
}

fn news_sections_mappings() -> Value {
    json!({
        "properties": {
            "section": { "type": "keyword" },
            "display_name": text_with_keyword()
        }
    })
}

fn books_mappings() -> Value {
    json!({
        "properties": {
            "title": text_with_keyword(),
            "author": text_with_keyword(),
            "contributor": { "type": "text" },
            "description": { "type": "text" },
            "publisher": { "type": "keyword" },
            "age_group": { "type": "keyword" },
            "price": { "type": "keyword" },
            "isbns": {
                "properties": {
                    "isbn10": { "type": "keyword" },
                    "isbn13": { "type": "keyword" }
                }
            },
            "ranks_history": {
                "properties": {
                    "list_name": { "type": "keyword" },
                    "rank": { "type": "integer" },
                    "weeks_on_list": { "type": "integer" },
                    "published_date": { "type": "date" },
                    "bestsellers_date": { "type": "date" }
                }
            }
        }
    })
}

fn movies_mappings() -> Value {
    json!({
        "properties": {
            "display_title": text_with_keyword(),
            "mpaa_rating": { "type": "keyword" },
            "critics_pick": { "type": "integer" },
            "byline": text_with_keyword(),
            "headline": { "type": "text" },
            "summary_short": { "type": "text" },
            "publication_date": { "type": "date" },
            "opening_date": { "type": "date" },
            "date_updated": {
                "type": "date",
                "format": "yyyy-MM-dd HH:mm:ss||strict_date_optional_time"
            }
        }
    })
}

/// Index definition for the collection of a source kind.
pub fn index_definition(kind: SourceKind) -> IndexDefinition {
    let mappings = match kind {
        SourceKind::News => news_mappings(),
        SourceKind::NewsSections => news_sections_mappings(),
        SourceKind::Books => books_mappings(),
        SourceKind::Movies => movies_mappings(),
    };
    IndexDefinition::new(default_settings(), mappings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_mapping_supports_aggregations() {
        let definition = index_definition(SourceKind::News);
        let properties = &definition.mappings["properties"];

        assert_eq!(properties["section"]["type"], "keyword");
        assert_eq!(properties["per_facet"]["type"], "keyword");
        assert_eq!(properties["byline"]["fields"]["keyword"]["type"], "keyword");
        assert_eq!(properties["first_published_date"]["type"], "date");
    }

    #[test]
    fn test_every_kind_has_settings() {
        for kind in SourceKind::ALL {
            let body = index_definition(kind).to_body();
            assert!(body["settings"]["number_of_shards"].is_number());
            assert!(body["mappings"]["properties"].is_object());
        }
    }
}
