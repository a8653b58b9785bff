//! CSS selector based handler
//!
//! Extracts one item per element matching an item selector and, optionally,
//! one successor GET request per link matching a follow selector.

use crate::handler::{Handler, Item, Outcome};
use crate::http::{Request, Response};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

/// A value extracted from a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extracted {
    /// URL of the page the value came from
    pub url: String,

    /// The attribute value or trimmed text of the matched element
    pub value: String,
}

impl Item for Extracted {
    fn content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.value.clone())
    }
}

/// Handler driven by CSS selectors
pub struct SelectorHandler {
    item_selector: Selector,
    attribute: Option<String>,
    follow_selector: Option<Selector>,
}

impl SelectorHandler {
    /// Creates a handler extracting the text of every `item_selector` match
    ///
    /// # Example
    ///
    /// ```
    /// use driftnet::handler::SelectorHandler;
    ///
    /// let handler = SelectorHandler::new("h3 > a")
    ///     .unwrap()
    ///     .attribute("href")
    ///     .follow("a.next_page")
    ///     .unwrap();
    /// ```
    pub fn new(item_selector: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            item_selector: parse_selector(item_selector)?,
            attribute: None,
            follow_selector: None,
        })
    }

    /// Extracts the named attribute instead of the element text
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute = Some(name.into());
        self
    }

    /// Follows the `href` of every element matching `selector`
    pub fn follow(mut self, selector: &str) -> Result<Self, ConfigError> {
        self.follow_selector = Some(parse_selector(selector)?);
        Ok(self)
    }

    fn extract_value(&self, element: ElementRef<'_>) -> Option<String> {
        let value = match &self.attribute {
            Some(name) => element.value().attr(name)?.trim().to_string(),
            None => element.text().collect::<String>().trim().to_string(),
        };
        (!value.is_empty()).then_some(value)
    }

    fn follow_links(&self, document: &Html, base: &Url) -> Vec<Request> {
        let Some(selector) = &self.follow_selector else {
            return Vec::new();
        };

        document
            .select(selector)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| match base.join(href) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::debug!("Failed to resolve link {} against {}: {}", href, base, e);
                    None
                }
            })
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .map(Request::get)
            .collect()
    }
}

impl Handler for SelectorHandler {
    fn handle(&self, request: &Request, response: Response) -> Outcome {
        let page = match response.into_result() {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Crawl request {} failed: {}", request.description(), e);
                return Outcome::empty();
            }
        };

        if !page.status.is_success() {
            tracing::warn!(
                "Crawl request {} returned HTTP {}",
                request.description(),
                page.status.as_u16()
            );
            return Outcome::empty();
        }

        let document = Html::parse_document(&page.text());
        let url = page.url.to_string();

        let items: Vec<Box<dyn Item>> = document
            .select(&self.item_selector)
            .filter_map(|element| self.extract_value(element))
            .map(|value| {
                Box::new(Extracted {
                    url: url.clone(),
                    value,
                }) as Box<dyn Item>
            })
            .collect();

        let successors = self.follow_links(&document, &page.url);

        tracing::debug!(
            "Extracted {} items and {} links from {}",
            items.len(),
            successors.len(),
            request.description()
        );

        Outcome { items, successors }
    }
}

/// Parses a CSS selector, mapping failures to a configuration error
pub fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    if selector.trim().is_empty() {
        return Err(ConfigError::InvalidSelector(
            "selector cannot be empty".to_string(),
        ));
    }
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}
