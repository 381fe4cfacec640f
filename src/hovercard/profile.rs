use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::dom::{Element, NodeSpec};

use super::cache::{ActorKey, ContentFetcher, Fragment};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("profile endpoint returned HTTP {status}")]
    HttpStatus { status: StatusCode },

    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("API base URL `{0}` cannot carry a path")]
    CannotBeABase(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActorProfile {
    pub name: String,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub known_for: Vec<String>,
}

/// Loads actor profiles from the catalog API and turns them into card content.
#[derive(Debug, Clone)]
pub struct ProfileContentFetcher {
    http_client: reqwest::Client,
    api_base_url: String,
}

impl ProfileContentFetcher {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_base_url: api_base_url.into(),
        }
    }

    pub fn profile_url(&self, name: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.api_base_url)?;
        url.path_segments_mut()
            .map_err(|()| FetchError::CannotBeABase(self.api_base_url.clone()))?
            .pop_if_empty()
            .extend(["api", "actors", name]);
        Ok(url)
    }

    async fn fetch_profile(&self, name: &str) -> Result<ActorProfile, FetchError> {
        let url = self.profile_url(name)?;
        debug!(url = %url, "requesting actor profile");

        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus { status });
        }
        Ok(response.json::<ActorProfile>().await?)
    }
}

impl ContentFetcher for ProfileContentFetcher {
    async fn fetch(&self, key: &ActorKey) -> Option<Fragment> {
        match self.fetch_profile(&key.name).await {
            Ok(profile) => Some(build_card_fragment(key, &profile)),
            Err(error) => {
                warn!(actor = %key.name, error = %error, "actor profile fetch failed");
                None
            }
        }
    }
}

pub fn build_card_fragment(key: &ActorKey, profile: &ActorProfile) -> Fragment {
    let mut message = NodeSpec::new(Element::new("div").with_class("hover-card-message"))
        .with_child(NodeSpec::new(
            Element::new("img")
                .with_class("hover-card-avatar")
                .with_attr("src", key.image_url.clone())
                .with_attr("alt", key.name.clone()),
        ))
        .with_child(NodeSpec::new(
            Element::new("a")
                .with_class("hover-card-name")
                .with_attr("href", key.page_url.clone())
                .with_text(profile.name.clone()),
        ));

    if let Some(biography) = profile
        .biography
        .as_deref()
        .map(str::trim)
        .filter(|bio| !bio.is_empty())
    {
        message = message.with_child(NodeSpec::new(
            Element::new("p")
                .with_class("hover-card-bio")
                .with_text(biography),
        ));
    }

    if !profile.known_for.is_empty() {
        let mut list = NodeSpec::new(Element::new("ul").with_class("hover-card-known-for"));
        for title in &profile.known_for {
            list = list.with_child(NodeSpec::new(Element::new("li").with_text(title.clone())));
        }
        message = message.with_child(list);
    }

    Fragment::new(vec![message])
}
