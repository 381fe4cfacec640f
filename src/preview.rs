//! Headless walk-through of a movie page: renders the poster and trailer,
//! then hovers one cast member and reports where the card landed.

use anyhow::{Context, Result, anyhow};
use tracing::info;

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::dom::{Document, Element, NodeId};
use crate::hovercard::cache::ContentFetcher;
use crate::hovercard::geometry::Rect;
use crate::hovercard::profile::ProfileContentFetcher;
use crate::hovercard::render::{CARD_BODY_CLASS, CONTAINER_CLASS, IMG_URL_ATTR, find_container};
use crate::hovercard::{HoverCard, HoverEvent, PageEvent};
use crate::media::{
    CachedTrailerSource, HttpTrailerSource, TrailerSource, render_poster, render_trailer,
};

const CAST_ROW_TOP: f64 = 520.0;
const CAST_LINK_WIDTH: f64 = 140.0;
const CARD_WIDTH: f64 = 320.0;
const CARD_HEIGHT: f64 = 180.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewReport {
    pub movie_title: String,
    pub poster_src: Option<String>,
    pub trailer_src: Option<String>,
    pub actor: String,
    pub card_visible: bool,
    pub card_text: String,
    pub card_top: Option<String>,
    pub card_left: Option<String>,
}

pub struct MoviePage {
    pub document: Document,
    pub poster_slot: NodeId,
    pub cast_links: Vec<(String, NodeId)>,
}

/// Lays out a movie page with one link per cast member that the catalog knows.
pub fn build_movie_page(catalog: &Catalog, movie_id: &str) -> Result<MoviePage> {
    let movie = catalog
        .movie(movie_id)
        .ok_or_else(|| anyhow!("unknown movie `{movie_id}`"))?;

    let mut document = Document::new();
    let root = document.root();
    let poster_slot = document.append(root, Element::new("figure").with_class("movie-poster-slot"));
    let cast_list = document.append(root, Element::new("ul").with_class("movie-cast"));

    let mut cast_links = Vec::new();
    for (index, actor) in movie
        .cast
        .iter()
        .filter_map(|name| catalog.actor(name))
        .enumerate()
    {
        let item = document.append(cast_list, Element::new("li"));
        let left = 40.0 + index as f64 * (CAST_LINK_WIDTH + 20.0);
        let link = document.append(
            item,
            Element::new("a")
                .with_attr(IMG_URL_ATTR, actor.image_url.clone())
                .with_attr("href", actor.page_url.clone())
                .with_text(actor.name.clone())
                .with_rect(Rect::new(left, CAST_ROW_TOP, CAST_LINK_WIDTH, 20.0)),
        );
        cast_links.push((actor.name.clone(), link));
    }

    let container = document.append(
        root,
        Element::new("div")
            .with_class(CONTAINER_CLASS)
            .with_rect(Rect::new(0.0, 0.0, CARD_WIDTH, CARD_HEIGHT)),
    );
    document.append(container, Element::new("div").with_class(CARD_BODY_CLASS));
    document.set_style(container, "display", "none");

    Ok(MoviePage {
        document,
        poster_slot,
        cast_links,
    })
}

pub async fn run_preview(settings: &Settings, movie_id: &str, actor: Option<&str>) -> Result<()> {
    let catalog = Catalog::load(&settings.catalog_path)
        .with_context(|| format!("failed to load catalog for preview of `{movie_id}`"))?;
    let fetcher = ProfileContentFetcher::new(settings.api_base_url.clone());
    let trailers = CachedTrailerSource::new(HttpTrailerSource::new(settings.api_base_url.clone()));

    let report = preview_movie(settings, &catalog, movie_id, actor, fetcher, &trailers).await?;
    info!(
        movie = %report.movie_title,
        actor = %report.actor,
        card_visible = report.card_visible,
        "preview finished"
    );

    println!("{}", report.movie_title);
    println!("  poster:  {}", report.poster_src.as_deref().unwrap_or("-"));
    println!("  trailer: {}", report.trailer_src.as_deref().unwrap_or("-"));
    if report.card_visible {
        println!(
            "  hover card for {} at top={} left={}: {}",
            report.actor,
            report.card_top.as_deref().unwrap_or("?"),
            report.card_left.as_deref().unwrap_or("?"),
            report.card_text
        );
    } else {
        println!("  no hover card content for {}", report.actor);
    }
    Ok(())
}

pub async fn preview_movie<F, S>(
    settings: &Settings,
    catalog: &Catalog,
    movie_id: &str,
    actor: Option<&str>,
    fetcher: F,
    trailers: &S,
) -> Result<PreviewReport>
where
    F: ContentFetcher + 'static,
    S: TrailerSource,
{
    let movie = catalog
        .movie(movie_id)
        .ok_or_else(|| anyhow!("unknown movie `{movie_id}`"))?;
    let MoviePage {
        mut document,
        poster_slot,
        cast_links,
    } = build_movie_page(catalog, movie_id)?;

    let poster = render_poster(&mut document, poster_slot, movie);
    let poster_src = poster.and_then(|node| first_child_attr(&document, node, "src"));
    let trailer = render_trailer(&mut document, movie, trailers).await;
    let trailer_src = trailer.and_then(|node| first_child_attr(&document, node, "src"));

    let (actor_name, link) = match actor {
        Some(wanted) => cast_links
            .into_iter()
            .find(|(name, _)| name == wanted)
            .ok_or_else(|| anyhow!("`{wanted}` is not in the cast of `{movie_id}`"))?,
        None => cast_links
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("`{movie_id}` has no known cast members"))?,
    };

    let card = HoverCard::new(document, fetcher, settings.hover_card_config());
    let pointer_x = card.with_document(|doc| {
        doc.get(link)
            .map(|element| element.bounding_rect())
            .map(|rect| rect.left + rect.width / 2.0)
            .unwrap_or_default()
    });
    card.dispatch(PageEvent::MouseMove { x: pointer_x }).await;
    card.dispatch(PageEvent::TargetMouseOver(HoverEvent::mouse(link, pointer_x)))
        .await;

    let (card_visible, card_text, card_top, card_left) = card.with_document(|doc| {
        let Some(container) = find_container(doc) else {
            return (false, String::new(), None, None);
        };
        let visible = !doc.is_hidden(container)
            && doc
                .first_child(container)
                .and_then(|body| doc.get(body))
                .is_some_and(|body| !body.children().is_empty());
        (
            visible,
            doc.text_content(container),
            doc.style(container, "top").map(str::to_owned),
            doc.style(container, "left").map(str::to_owned),
        )
    });

    Ok(PreviewReport {
        movie_title: movie.title.clone(),
        poster_src,
        trailer_src,
        actor: actor_name,
        card_visible,
        card_text,
        card_top,
        card_left,
    })
}

fn first_child_attr(document: &Document, node: NodeId, name: &str) -> Option<String> {
    let child = document.first_child(node)?;
    document.get(child)?.attr(name).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use crate::catalog::Catalog;
    use crate::config::{Protocol, Settings};
    use crate::media::{TrailerInfo, TrailerSource};
    use crate::test_support::{SAMPLE_CATALOG_YAML, StaticFetcher};

    use super::{build_movie_page, preview_movie};

    struct CatalogTrailers(Catalog);

    impl TrailerSource for CatalogTrailers {
        async fn trailer(&self, url: &str) -> Option<TrailerInfo> {
            let id = url.rsplit('/').next()?;
            self.0.trailer(id).map(|trailer| TrailerInfo {
                mime_type: trailer.mime_type.clone(),
                url: trailer.url.clone(),
            })
        }
    }

    fn settings() -> Settings {
        Settings {
            host: "127.0.0.1".to_owned(),
            port: 0,
            protocol: Protocol::Http,
            catalog_path: "unused.yaml".into(),
            api_base_url: "http://localhost:0".to_owned(),
            activate_delay_ms: 250,
            deactivate_delay_ms: 100,
            file_log: None,
        }
    }

    #[test]
    fn movie_page_links_known_cast_members() {
        let catalog = Catalog::from_yaml(SAMPLE_CATALOG_YAML).expect("sample should parse");
        let page = build_movie_page(&catalog, "analytical-engine").expect("page builds");

        let names = page
            .cast_links
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["Ada Lovelace", "Charles Babbage"]);
        assert!(build_movie_page(&catalog, "missing").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn preview_renders_media_and_hover_card() {
        let catalog = Catalog::from_yaml(SAMPLE_CATALOG_YAML).expect("sample should parse");
        let trailers = CatalogTrailers(catalog.clone());

        let report = preview_movie(
            &settings(),
            &catalog,
            "analytical-engine",
            Some("Charles Babbage"),
            StaticFetcher::default(),
            &trailers,
        )
        .await
        .expect("preview should succeed");

        assert_eq!(report.poster_src.as_deref(), Some("/posters/analytical-engine.jpg"));
        assert_eq!(
            report.trailer_src.as_deref(),
            Some("/media/analytical-engine.mp4")
        );
        assert!(report.card_visible);
        assert_eq!(report.card_text, "Charles Babbage");
        assert!(report.card_top.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn preview_without_trailer_or_poster_uses_fallbacks() {
        let catalog = Catalog::from_yaml(SAMPLE_CATALOG_YAML).expect("sample should parse");
        let trailers = CatalogTrailers(catalog.clone());

        let report = preview_movie(
            &settings(),
            &catalog,
            "compiler",
            None,
            StaticFetcher::default(),
            &trailers,
        )
        .await
        .expect("preview should succeed");

        assert_eq!(
            report.poster_src.as_deref(),
            Some(crate::media::NOT_FOUND_POSTER)
        );
        assert_eq!(report.trailer_src, None);
        assert_eq!(report.actor, "Grace Hopper");
    }
}
