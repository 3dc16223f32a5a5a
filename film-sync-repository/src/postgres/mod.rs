//! Postgres implementation of the source reader.
//!
//! Reads the `content` schema of the film catalog: `film_work`, `person`,
//! `genre` and the `person_film_work` / `genre_film_work` relations.

mod queries;
mod source_reader;

pub use source_reader::PostgresSourceReader;
