use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::error::ConfigError;
use crate::identity::stable_id;
use crate::models::Product;
use crate::price::parse_price;

/// Container patterns tried when a site has no cascade of its own.
pub const GENERIC_PRODUCT_SELECTORS: &[&str] = &["article", "li", "div"];

const TITLE_PATTERNS: &[&str] = &[
    r#"[itemprop="name"]"#,
    "h1",
    "h2",
    "h3",
    ".title",
    ".product-name",
    ".poly-component__title",
    ".pod-subTitle",
    ".product-item__title",
];

const PRICE_PATTERNS: &[&str] = &[
    r#"[itemprop="price"]"#,
    r#"[data-testid="price-part"]"#,
    ".andes-money-amount__fraction",
    ".price",
    ".product-price",
    ".sales",
    ".money",
    ".price__current",
    ".pod-prices",
];

// Labelled links first, bare anchors last.
const LINK_PATTERNS: &[&str] = &[
    "a[href][title]",
    "a[href][aria-label]",
    r#"a[href*="/p/"]"#,
    r#"a[href*="/producto"]"#,
    "a[href]",
];

static TITLE_HINTS: LazyLock<Vec<Selector>> = LazyLock::new(|| compile_static(TITLE_PATTERNS));
static PRICE_HINTS: LazyLock<Vec<Selector>> = LazyLock::new(|| compile_static(PRICE_PATTERNS));
static LINK_HINTS: LazyLock<Vec<Selector>> = LazyLock::new(|| compile_static(LINK_PATTERNS));

fn compile_static(patterns: &[&str]) -> Vec<Selector> {
    patterns
        .iter()
        .map(|p| Selector::parse(p).expect("built-in selector"))
        .collect()
}

/// Ordered container selectors for one site, most specific first.
#[derive(Debug, Clone)]
pub struct SelectorCascade {
    patterns: Vec<String>,
    selectors: Vec<Selector>,
}

impl SelectorCascade {
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let mut cascade = Self {
            patterns: Vec::with_capacity(patterns.len()),
            selectors: Vec::with_capacity(patterns.len()),
        };
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let selector =
                Selector::parse(pattern).map_err(|e| ConfigError::InvalidSelector {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                })?;
            cascade.patterns.push(pattern.to_string());
            cascade.selectors.push(selector);
        }
        Ok(cascade)
    }

    pub fn generic() -> Self {
        Self::compile(GENERIC_PRODUCT_SELECTORS).expect("built-in selector")
    }

    /// Source patterns in the order they are tried.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

pub struct ProductExtractor<'a> {
    site: &'a str,
    cascade: &'a SelectorCascade,
    max_items: usize,
}

impl<'a> ProductExtractor<'a> {
    pub fn new(site: &'a str, cascade: &'a SelectorCascade, max_items: usize) -> Self {
        Self {
            site,
            cascade,
            max_items,
        }
    }

    /// Pulls candidate products out of a listing page.
    ///
    /// Each container block is looked at once even when a later, broader
    /// selector matches it again. Blocks missing a title, a price or a link
    /// are skipped. The result keeps page order and holds one record per
    /// product id.
    pub fn extract(&self, html: &str, base_url: &str) -> Vec<Product> {
        let base = match Url::parse(base_url) {
            Ok(base) => base,
            Err(e) => {
                warn!("{}: invalid base url {base_url}: {e}", self.site);
                return Vec::new();
            }
        };

        let doc = Html::parse_document(html);
        let mut products = Vec::new();
        let mut visited = HashSet::new();

        'cascade: for selector in &self.cascade.selectors {
            for block in doc.select(selector) {
                if products.len() >= self.max_items {
                    break 'cascade;
                }
                if !visited.insert(block.id()) {
                    continue;
                }
                if let Some(product) = self.read_block(block, &base) {
                    products.push(product);
                }
            }
        }

        dedupe(products)
    }

    fn read_block(&self, block: ElementRef<'_>, base: &Url) -> Option<Product> {
        let title = pick_first_text(block, &TITLE_HINTS)?;
        let raw_price = pick_first_text(block, &PRICE_HINTS)?;
        let href = pick_first_href(block, &LINK_HINTS)?;

        let Some(price) = parse_price(&raw_price).filter(|p| *p > 0.0) else {
            debug!("{}: unusable price {raw_price:?} for {title:?}", self.site);
            return None;
        };
        let url = base.join(&href).ok()?.to_string();

        Some(Product {
            site: self.site.to_string(),
            product_id: stable_id(self.site, &title, &url),
            title,
            price_pen: price,
            url,
        })
    }
}

fn dedupe(products: Vec<Product>) -> Vec<Product> {
    let mut seen = HashSet::new();
    products
        .into_iter()
        .filter(|p| seen.insert(p.product_id.clone()))
        .collect()
}

fn element_text(node: ElementRef<'_>) -> String {
    node.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn pick_first_text(block: ElementRef<'_>, hints: &[Selector]) -> Option<String> {
    hints
        .iter()
        .filter_map(|hint| block.select(hint).next())
        .map(element_text)
        .find(|text| !text.is_empty())
}

fn pick_first_href(block: ElementRef<'_>, hints: &[Selector]) -> Option<String> {
    hints
        .iter()
        .filter_map(|hint| block.select(hint).next())
        .filter_map(|node| node.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(str::to_string)
}
