use scraper::{ElementRef, Html, Node, Selector};
use sk_core::{Error, Result};

pub const UNTITLED: &str = "Untitled Article";
pub const MAX_TEXT_CHARS: usize = 5000;
pub const MIN_TEXT_CHARS: usize = 100;

/// Subtrees that are never article content. Cookie and consent banners are
/// matched by whole class tokens or ids so content classes such as
/// `cookies-recipe` survive.
const NOISE_SELECTOR: &str = "script, style, noscript, template, svg, nav, header, footer, iframe, aside, \
    .ad, .ads, .advert, .advertisement, \
    [class~='cookie'], [class~='consent'], .cookie-banner, .cookie-consent, .cookie-notice, .consent-banner, \
    #cookie-banner, #cookie-consent, #cookie-notice, #consent-banner, \
    [role='dialog'][aria-label*='cookie'], [role='dialog'][aria-label*='Cookie']";

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "figure", "h1", "h2",
    "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    pub text: String,
    /// `<title>`, else `og:title`, else [`UNTITLED`]
    pub title: String,
}

/// Turns raw HTML into bounded plain text.
#[derive(Debug, Clone)]
pub struct Extractor {
    noise: Selector,
    max_chars: usize,
    min_chars: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(MAX_TEXT_CHARS, MIN_TEXT_CHARS)
    }
}

impl Extractor {
    pub fn new(max_chars: usize, min_chars: usize) -> Self {
        Self {
            noise: Selector::parse(NOISE_SELECTOR).unwrap(),
            max_chars,
            min_chars,
        }
    }

    pub fn extract(&self, html: &str) -> Result<ExtractedPage> {
        let document = Html::parse_document(html);

        let body_selector = Selector::parse("body").unwrap();
        let root = document
            .select(&body_selector)
            .next()
            .unwrap_or_else(|| document.root_element());

        let mut raw = String::new();
        self.collect_text(root, &mut raw);

        let text = collapse_whitespace(&raw);
        let text = truncate_chars(&text, self.max_chars);

        let length = text.chars().count();
        if length < self.min_chars {
            return Err(Error::Extraction(format!(
                "only {} characters of text found (minimum {}), the page likely requires login or is not text",
                length, self.min_chars
            )));
        }

        Ok(ExtractedPage {
            text,
            title: extract_title(&document),
        })
    }

    fn collect_text(&self, element: ElementRef, out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) => {
                    let Some(child_el) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if self.noise.matches(&child_el) {
                        continue;
                    }
                    let block = BLOCK_ELEMENTS.contains(&el.name());
                    if block {
                        out.push(' ');
                    }
                    self.collect_text(child_el, out);
                    if block {
                        out.push(' ');
                    }
                }
                _ => {}
            }
        }
    }
}

fn extract_title(document: &Html) -> String {
    let title_selector = Selector::parse("title").unwrap();
    let og_selector = Selector::parse("meta[property='og:title']").unwrap();

    let title = document
        .select(&title_selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    title
        .or_else(|| {
            document
                .select(&og_selector)
                .next()
                .and_then(|el| el.value().attr("content"))
                .map(collapse_whitespace)
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Replace every whitespace run with one space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAGRAPH: &str = "Rust is a systems programming language focused on safety, speed and concurrency. \
        It achieves memory safety without garbage collection.";

    fn page(body: &str) -> String {
        format!(
            "<html><head><title> Example   Post </title><style>p {{ color: red }}</style></head><body>{}</body></html>",
            body
        )
    }

    #[test]
    fn test_strips_boilerplate() {
        let html = page(&format!(
            r#"<header>Site header</header>
               <nav><a href="/">Home</a></nav>
               <script>var tracking = true;</script>
               <div class="ad">Buy now</div>
               <div id="cookie-banner">We use cookies</div>
               <aside>Related links</aside>
               <article><h1>Heading</h1><p>{}</p></article>
               <iframe src="https://ads.example.com"></iframe>
               <footer>Copyright</footer>"#,
            PARAGRAPH
        ));

        let extracted = Extractor::default().extract(&html).unwrap();
        assert_eq!(extracted.title, "Example Post");
        assert!(extracted.text.starts_with("Heading Rust is a systems"));
        for noise in ["Site header", "Home", "tracking", "Buy now", "cookies", "Related", "Copyright", "color"] {
            assert!(!extracted.text.contains(noise), "{} leaked into {:?}", noise, extracted.text);
        }
    }

    #[test]
    fn test_keeps_form_wrapped_page() {
        // WebForms pages put the whole body inside one form
        let html = page(&format!(
            "<form id='form1' method='post'><article><p>{}</p></article></form>",
            PARAGRAPH
        ));
        let extracted = Extractor::default().extract(&html).unwrap();
        assert_eq!(extracted.text, PARAGRAPH);
    }

    #[test]
    fn test_keeps_content_with_cookie_in_class_name() {
        let html = page(&format!(
            "<article class='post-cookies-recipe'><p>{}</p></article>\
             <div class='cookie consent'>We use cookies</div>\
             <div role='dialog' aria-label='cookie preferences'>Accept all</div>",
            PARAGRAPH
        ));
        let extracted = Extractor::default().extract(&html).unwrap();
        assert_eq!(extracted.text, PARAGRAPH);
    }

    #[test]
    fn test_collapses_whitespace() {
        let html = page(&format!("<p>\n\n  {}  </p>\n\t<p>Second\n   paragraph</p>", PARAGRAPH));
        let extracted = Extractor::default().extract(&html).unwrap();
        assert!(!extracted.text.contains("  "));
        assert!(!extracted.text.contains('\n'));
        assert!(extracted.text.ends_with("collection. Second paragraph"));
        assert_eq!(extracted.text, extracted.text.trim());
    }

    #[test]
    fn test_truncates_to_max_chars() {
        let long = "é".repeat(MAX_TEXT_CHARS * 2);
        let extracted = Extractor::default().extract(&page(&format!("<p>{}</p>", long))).unwrap();
        assert_eq!(extracted.text.chars().count(), MAX_TEXT_CHARS);
    }

    #[test]
    fn test_insufficient_content() {
        let html = page("<nav>Menu</nav><p>Please log in to continue.</p>");
        let err = Extractor::default().extract(&html).unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[test]
    fn test_title_fallbacks() {
        let body = format!("<p>{}</p>", PARAGRAPH);

        let html = format!(
            "<html><head><meta property='og:title' content='From Open Graph'></head><body>{}</body></html>",
            body
        );
        assert_eq!(Extractor::default().extract(&html).unwrap().title, "From Open Graph");

        let html = format!("<html><head><title>   </title></head><body>{}</body></html>", body);
        assert_eq!(Extractor::default().extract(&html).unwrap().title, UNTITLED);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hi", 3), "hi");
        assert_eq!(truncate_chars("ñañaña", 2), "ña");
    }
}
