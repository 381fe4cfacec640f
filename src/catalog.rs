use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid catalog: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Movie {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailer: Option<String>,
    #[serde(default)]
    pub cast: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Actor {
    pub name: String,
    pub image_url: String,
    pub page_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    #[serde(default)]
    pub known_for: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Trailer {
    pub id: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    pub movies: Vec<Movie>,
    #[serde(default)]
    pub actors: Vec<Actor>,
    #[serde(default)]
    pub trailers: Vec<Trailer>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, CatalogError> {
        let catalog = serde_yaml::from_str::<Catalog>(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn movie(&self, id: &str) -> Option<&Movie> {
        self.movies.iter().find(|movie| movie.id == id)
    }

    pub fn actor(&self, name: &str) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.name == name)
    }

    pub fn trailer(&self, id: &str) -> Option<&Trailer> {
        self.trailers.iter().find(|trailer| trailer.id == id)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut movie_ids = HashSet::new();
        for movie in &self.movies {
            if movie.id.trim().is_empty() {
                return Err(CatalogError::Invalid("movie id cannot be empty".to_owned()));
            }
            if movie.title.trim().is_empty() {
                return Err(CatalogError::Invalid(format!(
                    "movie `{}` has an empty title",
                    movie.id
                )));
            }
            if !movie_ids.insert(movie.id.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate movie id `{}`",
                    movie.id
                )));
            }
        }

        let mut actor_names = HashSet::new();
        for actor in &self.actors {
            if actor.name.trim().is_empty() {
                return Err(CatalogError::Invalid("actor name cannot be empty".to_owned()));
            }
            if !actor_names.insert(actor.name.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate actor `{}`",
                    actor.name
                )));
            }
        }

        let mut trailer_ids = HashSet::new();
        for trailer in &self.trailers {
            if !trailer_ids.insert(trailer.id.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate trailer id `{}`",
                    trailer.id
                )));
            }
        }

        Ok(())
    }
}
