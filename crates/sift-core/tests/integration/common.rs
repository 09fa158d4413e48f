use std::collections::HashMap;
use std::sync::Arc;

use sift_core::{AppError, Fetcher};

/// Fetcher serving fixed HTML per URL; anything else is a 404.
#[derive(Clone, Default)]
pub struct StaticFetcher {
    pages: Arc<HashMap<String, String>>,
}

impl StaticFetcher {
    pub fn new<I, U, H>(pages: I) -> Self
    where
        I: IntoIterator<Item = (U, H)>,
        U: Into<String>,
        H: Into<String>,
    {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(url, html)| (url.into(), html.into()))
                    .collect(),
            ),
        }
    }
}

impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        tokio::task::yield_now().await;
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::HttpError(format!("HTTP 404 for {url}")))
    }
}

/// A listing page with `items` product cards plus one empty card.
pub fn catalog_page(page: i64, items: usize) -> String {
    let mut cards = String::new();
    for i in 0..items {
        cards.push_str(&format!(
            r#"<div class="card"><h3 class="name">Product {page}.{i}</h3><a href="/p/{page}/{i}">details</a><span class="price">{i}.99</span></div>"#
        ));
    }
    cards.push_str(r#"<div class="card"></div>"#);
    format!(
        "<html><head><title>Catalog {page}</title><script>track()</script></head><body>{cards}</body></html>"
    )
}
