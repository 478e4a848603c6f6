// src/extract/candidates.rs
//! Gathers candidate content blocks from noise-free HTML.

use once_cell::sync::Lazy;
use regex::Regex;

use super::locate::BlockLocator;

pub const SEMANTIC_TAGS: [&str; 2] = ["article", "main"];
pub const CHROME_TAGS: [&str; 4] = ["header", "nav", "footer", "aside"];
pub const MAX_WRAPPER_ATTEMPTS: usize = 30;

/// class/id fragments that mark a likely content wrapper (EN + PT/ES).
pub const WRAPPER_KEYWORDS: [&str; 13] = [
    "article", "post", "entry", "content", "body", "story", "news", "materia", "noticia",
    "conteudo", "texto", "corpo", "artigo",
];

static RE_WRAPPER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<(div|section)\b[^>]*?\b(?:class|id)\s*=\s*["']([^"']*)["']"#).unwrap()
});

/// Candidate fragments in collection order: semantic tags, keyword wrappers,
/// then `<body>` (or the whole document). Chrome is already stripped.
pub fn collect_candidates(cleaned: &str, locator: &dyn BlockLocator) -> Vec<String> {
    let mut out = Vec::new();

    for tag in SEMANTIC_TAGS {
        if let Some(r) = locator.locate(cleaned, tag, 0) {
            out.push(cleaned[r].to_string());
        }
    }

    let mut attempts = 0usize;
    for caps in RE_WRAPPER.captures_iter(cleaned) {
        if attempts >= MAX_WRAPPER_ATTEMPTS {
            break;
        }
        let (Some(whole), Some(tag), Some(attr)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if !matches_wrapper_keyword(attr.as_str()) {
            continue;
        }
        attempts += 1;
        let tag = tag.as_str().to_ascii_lowercase();
        if let Some(r) = locator.locate(cleaned, &tag, whole.start()) {
            out.push(cleaned[r].to_string());
        }
    }

    match locator.locate(cleaned, "body", 0) {
        Some(r) => out.push(cleaned[r].to_string()),
        None => out.push(cleaned.to_string()),
    }

    out.into_iter()
        .map(|c| strip_chrome(&c, locator))
        .collect()
}

pub fn matches_wrapper_keyword(attr_value: &str) -> bool {
    let v = attr_value.to_ascii_lowercase();
    WRAPPER_KEYWORDS.iter().any(|k| v.contains(k))
}

/// Remove header/nav/footer/aside blocks from a candidate. A block whose
/// close cannot be found is left alone.
pub fn strip_chrome(fragment: &str, locator: &dyn BlockLocator) -> String {
    let mut s = fragment.to_string();
    for tag in CHROME_TAGS {
        let mut pos = 0usize;
        while let Some(r) = locator.locate(&s, tag, pos) {
            pos = r.start;
            s.replace_range(r, " ");
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::locate::ScanLocator;

    #[test]
    fn collects_semantic_wrapper_and_body() {
        let html = r#"<html><body><main><div class="post-body">Texto</div></main><article>A</article></body></html>"#;
        let c = collect_candidates(html, &ScanLocator);
        assert_eq!(c.len(), 4);
        assert!(c[0].starts_with("<article>"));
        assert!(c[1].starts_with("<main>"));
        assert!(c[2].starts_with(r#"<div class="post-body">"#));
        assert!(c[3].starts_with("<body>"));
    }

    #[test]
    fn whole_document_when_no_body() {
        let c = collect_candidates("<p>solto</p>", &ScanLocator);
        assert_eq!(c, vec!["<p>solto</p>".to_string()]);
    }

    #[test]
    fn wrapper_scan_is_capped() {
        let html = r#"<div class="content">x</div>"#.repeat(100);
        let c = collect_candidates(&html, &ScanLocator);
        // 30 wrappers + whole document fallback
        assert_eq!(c.len(), MAX_WRAPPER_ATTEMPTS + 1);
    }

    #[test]
    fn non_matching_wrappers_do_not_count() {
        let html = r#"<div class="sidebar">s</div><section id="noticia-principal">n</section>"#;
        let c = collect_candidates(html, &ScanLocator);
        assert!(c.iter().any(|b| b.starts_with("<section")));
        assert!(!c.iter().any(|b| b.starts_with(r#"<div class="sidebar">"#)));
    }

    #[test]
    fn chrome_regions_are_removed() {
        let html = "<article><header>H</header><nav><a>1</a></nav>corpo<aside>ad</aside><footer>F</footer></article>";
        let out = strip_chrome(html, &ScanLocator);
        assert!(out.contains("corpo"));
        for gone in ["H<", ">1<", "ad", "F<"] {
            assert!(!out.contains(gone), "{gone} left in {out}");
        }
    }

    #[test]
    fn repeated_chrome_is_removed() {
        let html = "<nav>a</nav>x<nav>b</nav>y";
        let out = strip_chrome(html, &ScanLocator);
        assert!(!out.contains("<nav>"));
        assert!(out.contains('x') && out.contains('y'));
    }
}
