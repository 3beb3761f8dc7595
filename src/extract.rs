use scraper::{Html, Selector};

pub const MEDIA_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"];

const CANDIDATE_ATTRS: &[CandidateAttr] = &[CandidateAttr::Href, CandidateAttr::Src];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateAttr {
    /// Link target (`href`).
    Href,
    /// Embedded source (`src`).
    Src,
}

impl CandidateAttr {
    pub fn name(self) -> &'static str {
        match self {
            CandidateAttr::Href => "href",
            CandidateAttr::Src => "src",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceCandidate {
    pub value: String,
    pub attr: CandidateAttr,
}

pub fn has_media_extension(value: &str) -> bool {
    let lower = value.to_lowercase();
    MEDIA_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Every `img`/`a` attribute value that looks like a media file, in
/// document order. Duplicates are kept.
pub fn extract_candidates(document: &Html) -> Vec<ResourceCandidate> {
    let selector = Selector::parse("img, a").expect("img/anchor selector");

    let mut out = Vec::new();
    for element in document.select(&selector) {
        for attr in CANDIDATE_ATTRS {
            let Some(raw) = element.value().attr(attr.name()) else {
                continue;
            };
            if raw.is_empty() || !has_media_extension(raw) {
                continue;
            }
            out.push(ResourceCandidate {
                value: raw.to_string(),
                attr: *attr,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(candidates: &[ResourceCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.value.as_str()).collect()
    }

    #[test]
    fn extracts_img_and_anchor_media_in_document_order() {
        let html = r#"
        <html><body>
          <a href="/full/one.JPG"><img src="/thumbs/one.png" /></a>
          <p><img src="two.webp?v=3" /></p>
          <a href="/about">About</a>
          <img src="//cdn.example.com/three.gif" />
          <a href="/full/one.JPG">again</a>
        </body></html>
        "#;
        let doc = Html::parse_document(html);
        let out = extract_candidates(&doc);
        assert_eq!(
            values(&out),
            vec![
                "/full/one.JPG",
                "/thumbs/one.png",
                "//cdn.example.com/three.gif",
                "/full/one.JPG",
            ]
        );
        assert_eq!(out[0].attr, CandidateAttr::Href);
        assert_eq!(out[1].attr, CandidateAttr::Src);
    }

    #[test]
    fn ignores_other_elements_and_non_media_extensions() {
        let html = r#"
        <html><head><link href="/style.png" rel="icon"></head><body>
          <iframe src="/embed/photo.jpg"></iframe>
          <img src="/pic.svg" />
          <img data-src="/lazy.jpg" />
          <a href="/doc.pdf">pdf</a>
        </body></html>
        "#;
        let doc = Html::parse_document(html);
        assert!(extract_candidates(&doc).is_empty());
    }

    #[test]
    fn checks_href_before_src_on_the_same_element() {
        let doc = Html::parse_document(r#"<img href="/a.bmp" src="/b.jpeg">"#);
        let out = extract_candidates(&doc);
        assert_eq!(values(&out), vec!["/a.bmp", "/b.jpeg"]);
    }

    #[test]
    fn media_extension_match_is_case_insensitive() {
        assert!(has_media_extension("/IMG_001.JPEG"));
        assert!(has_media_extension("photo.webp"));
        assert!(!has_media_extension("photo.jpg?w=100"));
        assert!(!has_media_extension("photo.tiff"));
    }
}
