//! SQL shapes for the film catalog (`content` schema).
//!
//! Page queries are assembled with `QueryBuilder` because the keyset clause is
//! only present after the first page.

use sqlx::{Postgres, QueryBuilder};

use crate::types::{ChangeFeed, ChangeQuery, DirectoryQuery, SourceTable};

pub(crate) const PING_SQL: &str = "SELECT 1";

pub(crate) const ENRICH_SQL: &str = r#"
    SELECT
        fw.id,
        fw.title,
        fw.description,
        fw.rating,
        fw.type AS work_type,
        fw.modified,
        COALESCE(
            json_agg(
                DISTINCT jsonb_build_object('role', pfw.role, 'id', p.id, 'name', p.full_name)
            ) FILTER (WHERE p.id IS NOT NULL),
            '[]'
        ) AS persons,
        COALESCE(
            json_agg(
                DISTINCT jsonb_build_object('id', g.id, 'name', g.name)
            ) FILTER (WHERE g.id IS NOT NULL),
            '[]'
        ) AS genres
    FROM content.film_work fw
    LEFT JOIN content.person_film_work pfw ON pfw.film_work_id = fw.id
    LEFT JOIN content.person p ON p.id = pfw.person_id
    LEFT JOIN content.genre_film_work gfw ON gfw.film_work_id = fw.id
    LEFT JOIN content.genre g ON g.id = gfw.genre_id
    WHERE fw.id = ANY($1)
    GROUP BY fw.id
    ORDER BY fw.id
"#;

pub(crate) fn max_modified_sql(table: SourceTable) -> String {
    format!("SELECT max(modified) FROM content.{}", table.as_str())
}

/// Build one page of a change feed.
pub(crate) fn change_page(query: &ChangeQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = match query.feed {
        ChangeFeed::Work => {
            let mut b = QueryBuilder::new(
                "SELECT fw.id AS work_id, fw.id AS entity_id, fw.modified \
                 FROM content.film_work fw \
                 WHERE fw.modified >= ",
            );
            b.push_bind(query.since);
            if let Some(after) = query.after {
                b.push(" AND (fw.modified, fw.id) > (")
                    .push_bind(after.modified)
                    .push(", ")
                    .push_bind(after.entity_id)
                    .push(")");
            }
            b.push(" ORDER BY fw.modified, fw.id");
            b
        }
        ChangeFeed::Person => dependent_page(
            query,
            "SELECT DISTINCT fw.id AS work_id, p.id AS entity_id, p.modified \
             FROM content.person p \
             JOIN content.person_film_work pfw ON pfw.person_id = p.id \
             JOIN content.film_work fw ON fw.id = pfw.film_work_id \
             WHERE p.modified >= ",
            "p",
        ),
        ChangeFeed::Genre => dependent_page(
            query,
            "SELECT DISTINCT fw.id AS work_id, g.id AS entity_id, g.modified \
             FROM content.genre g \
             JOIN content.genre_film_work gfw ON gfw.genre_id = g.id \
             JOIN content.film_work fw ON fw.id = gfw.film_work_id \
             WHERE g.modified >= ",
            "g",
        ),
    };

    builder.push(" LIMIT ").push_bind(query.limit as i64);
    builder
}

/// Person and genre feeds: changes newer than the work row they hang off, on
/// works the work feed has already passed.
fn dependent_page(
    query: &ChangeQuery,
    select: &'static str,
    alias: &'static str,
) -> QueryBuilder<'static, Postgres> {
    let mut b = QueryBuilder::new(select);
    b.push_bind(query.since)
        .push(" AND fw.modified < ")
        .push_bind(query.work_upper_bound)
        .push(format!(" AND {alias}.modified > fw.modified"));

    if let Some(after) = query.after {
        b.push(format!(" AND ({alias}.modified, {alias}.id, fw.id) > ("))
            .push_bind(after.modified)
            .push(", ")
            .push_bind(after.entity_id)
            .push(", ")
            .push_bind(after.work_id)
            .push(")");
    }

    b.push(format!(" ORDER BY {alias}.modified, {alias}.id, fw.id"));
    b
}

/// Build one page of a flat person or genre table.
pub(crate) fn directory_page(query: &DirectoryQuery) -> QueryBuilder<'static, Postgres> {
    let (table, name_column) = match query.table {
        SourceTable::Person => ("person", "full_name"),
        SourceTable::Genre => ("genre", "name"),
        SourceTable::FilmWork => ("film_work", "title"),
    };

    let mut b = QueryBuilder::new(format!(
        "SELECT t.id, t.{name_column} AS name, t.modified FROM content.{table} t WHERE t.modified >= "
    ));
    b.push_bind(query.since);

    if let Some(after) = query.after {
        b.push(" AND (t.modified, t.id) > (")
            .push_bind(after.modified)
            .push(", ")
            .push_bind(after.entity_id)
            .push(")");
    }

    b.push(" ORDER BY t.modified, t.id LIMIT ")
        .push_bind(query.limit as i64);
    b
}
