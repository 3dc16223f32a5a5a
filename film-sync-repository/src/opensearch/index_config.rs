//! OpenSearch index settings and mappings.
//!
//! Used only when the sync is allowed to create missing indexes; normally the
//! indexes are provisioned ahead of deployment with these same mappings.

use serde_json::{json, Value};

/// Which of the catalog indexes a mapping is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Movies,
    Persons,
    Genres,
}

/// Shared analysis settings: an english analyzer with stemming and stop words.
fn analysis_settings() -> Value {
    json!({
        "refresh_interval": "1s",
        "analysis": {
            "filter": {
                "english_stop": { "type": "stop", "stopwords": "_english_" },
                "english_stemmer": { "type": "stemmer", "language": "english" },
                "english_possessive_stemmer": { "type": "stemmer", "language": "possessive_english" }
            },
            "analyzer": {
                "catalog_analyzer": {
                    "tokenizer": "standard",
                    "filter": [
                        "lowercase",
                        "english_stop",
                        "english_stemmer",
                        "english_possessive_stemmer"
                    ]
                }
            }
        }
    })
}

fn named_ref_mapping() -> Value {
    json!({
        "type": "nested",
        "dynamic": "strict",
        "properties": {
            "id": { "type": "keyword" },
            "name": { "type": "text", "analyzer": "catalog_analyzer" }
        }
    })
}

/// Get the index settings and mappings for one of the catalog indexes.
///
/// Mappings are `strict`: a document carrying a field the mapping does not
/// declare is rejected instead of silently widening the schema.
pub fn get_index_settings(kind: IndexKind) -> Value {
    let properties = match kind {
        IndexKind::Movies => json!({
            "id": { "type": "keyword" },
            "imdb_rating": { "type": "float" },
            "type": { "type": "keyword" },
            "genre": { "type": "keyword" },
            "genres": named_ref_mapping(),
            "title": {
                "type": "text",
                "analyzer": "catalog_analyzer",
                "fields": { "raw": { "type": "keyword" } }
            },
            "description": { "type": "text", "analyzer": "catalog_analyzer" },
            "actors_names": { "type": "text", "analyzer": "catalog_analyzer" },
            "writers_names": { "type": "text", "analyzer": "catalog_analyzer" },
            "directors_names": { "type": "text", "analyzer": "catalog_analyzer" },
            "actors": named_ref_mapping(),
            "writers": named_ref_mapping(),
            "directors": named_ref_mapping()
        }),
        IndexKind::Persons => json!({
            "id": { "type": "keyword" },
            "full_name": {
                "type": "text",
                "analyzer": "catalog_analyzer",
                "fields": { "raw": { "type": "keyword" } }
            }
        }),
        IndexKind::Genres => json!({
            "id": { "type": "keyword" },
            "name": {
                "type": "text",
                "analyzer": "catalog_analyzer",
                "fields": { "raw": { "type": "keyword" } }
            }
        }),
    };

    json!({
        "settings": analysis_settings(),
        "mappings": {
            "dynamic": "strict",
            "properties": properties
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movies_mapping_covers_document_fields() {
        let settings = get_index_settings(IndexKind::Movies);
        let properties = &settings["mappings"]["properties"];

        for field in [
            "id",
            "title",
            "description",
            "imdb_rating",
            "type",
            "genre",
            "genres",
            "actors",
            "writers",
            "directors",
            "actors_names",
            "writers_names",
            "directors_names",
        ] {
            assert!(properties[field].is_object(), "missing mapping for {}", field);
        }
        assert_eq!(properties["actors"]["type"], "nested");
        assert_eq!(settings["mappings"]["dynamic"], "strict");
    }

    #[test]
    fn test_directory_mappings() {
        let persons = get_index_settings(IndexKind::Persons);
        let genres = get_index_settings(IndexKind::Genres);

        assert!(persons["mappings"]["properties"]["full_name"].is_object());
        assert!(genres["mappings"]["properties"]["name"].is_object());
        assert!(genres["settings"]["analysis"]["analyzer"]["catalog_analyzer"].is_object());
    }
}
