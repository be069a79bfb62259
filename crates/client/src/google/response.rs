//! Custom Search API response types and record mapping.

use serde::{Deserialize, Serialize};

use scout_core::Error;

/// Raw response from the Custom Search JSON API.
///
/// `items` may be missing or `null` when nothing matched.
#[derive(Debug, Deserialize)]
pub struct CseApiResponse {
    #[serde(default)]
    pub items: Option<Vec<CseItem>>,
}

/// Individual result item.
#[derive(Debug, Deserialize)]
pub struct CseItem {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default, rename = "htmlSnippet")]
    pub html_snippet: Option<String>,
    #[serde(default, rename = "displayLink")]
    pub display_link: Option<String>,
    #[serde(default)]
    pub image: Option<CseImage>,
    #[serde(default)]
    pub pagemap: Option<CsePagemap>,
}

/// Image metadata, present on image search results.
#[derive(Debug, Deserialize)]
pub struct CseImage {
    #[serde(default, rename = "contextLink")]
    pub context_link: Option<String>,
    #[serde(default, rename = "thumbnailLink")]
    pub thumbnail_link: Option<String>,
}

/// Page structured data; only the thumbnail list is read.
#[derive(Debug, Deserialize)]
pub struct CsePagemap {
    #[serde(default)]
    pub cse_thumbnail: Option<Vec<CseThumbnail>>,
}

#[derive(Debug, Deserialize)]
pub struct CseThumbnail {
    #[serde(default)]
    pub src: Option<String>,
}

/// Which search leg produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Web,
    Image,
}

/// One search result as emitted downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(rename = "EntryID")]
    pub entry_id: i64,
    #[serde(rename = "ImageUrl")]
    pub image_url: String,
    #[serde(rename = "ImageDesc")]
    pub image_desc: String,
    #[serde(rename = "ImageSource")]
    pub image_source: String,
    #[serde(rename = "ImageUrlThumbnail")]
    pub image_url_thumbnail: String,
    /// Only set in combined mode.
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ResultKind>,
}

impl ResultRecord {
    /// Map an API item, substituting placeholders for absent or empty fields.
    pub fn from_item(item: CseItem, entry_id: i64, kind: Option<ResultKind>) -> Self {
        let thumbnail_fallback = item
            .pagemap
            .and_then(|p| p.cse_thumbnail.unwrap_or_default().into_iter().next())
            .and_then(|t| present(t.src));
        let (context_link, thumbnail_link) = match item.image {
            Some(image) => (present(image.context_link), present(image.thumbnail_link)),
            None => (None, None),
        };

        Self {
            entry_id,
            image_url: present(item.link).unwrap_or_else(|| "No image URL".to_string()),
            image_desc: present(item.snippet)
                .or_else(|| present(item.html_snippet))
                .unwrap_or_else(|| "No description".to_string()),
            image_source: context_link
                .or_else(|| present(item.display_link))
                .unwrap_or_else(|| "No source".to_string()),
            image_url_thumbnail: thumbnail_link
                .or(thumbnail_fallback)
                .unwrap_or_else(|| "No thumbnail URL".to_string()),
            kind,
        }
    }
}

impl CseApiResponse {
    /// Map the first `limit` items to records.
    pub fn into_records(self, entry_id: i64, kind: Option<ResultKind>, limit: usize) -> Vec<ResultRecord> {
        self.items
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .map(|item| ResultRecord::from_item(item, entry_id, kind))
            .collect()
    }
}

/// Serialize records as the pretty-printed JSON array sent downstream.
pub fn render_records(records: &[ResultRecord]) -> Result<String, Error> {
    serde_json::to_string_pretty(records).map_err(|e| Error::Parse(format!("Failed to encode search results: {}", e)))
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE_FIXTURE: &str = r#"{
        "kind": "customsearch#search",
        "items": [
            {
                "link": "https://cdn.example.com/part.jpg",
                "snippet": "Part TH03279J078",
                "displayLink": "www.example.com",
                "image": {
                    "contextLink": "https://www.example.com/parts/TH03279J078",
                    "thumbnailLink": "https://encrypted-tbn0.gstatic.com/images?q=tbn:1"
                }
            },
            {
                "htmlSnippet": "<b>Part</b> only html",
                "displayLink": "shop.example.org"
            }
        ]
    }"#;

    #[test]
    fn test_deserialize_and_map_image_items() {
        let raw: CseApiResponse = serde_json::from_str(IMAGE_FIXTURE).unwrap();
        let records = raw.into_records(7, None, 5);
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.entry_id, 7);
        assert_eq!(first.image_url, "https://cdn.example.com/part.jpg");
        assert_eq!(first.image_desc, "Part TH03279J078");
        assert_eq!(first.image_source, "https://www.example.com/parts/TH03279J078");
        assert_eq!(first.image_url_thumbnail, "https://encrypted-tbn0.gstatic.com/images?q=tbn:1");

        let second = &records[1];
        assert_eq!(second.image_url, "No image URL");
        assert_eq!(second.image_desc, "<b>Part</b> only html");
        assert_eq!(second.image_source, "shop.example.org");
        assert_eq!(second.image_url_thumbnail, "No thumbnail URL");
    }

    #[test]
    fn test_web_item_uses_pagemap_thumbnail() {
        let json = r#"{"items": [{
            "link": "https://example.com/a",
            "snippet": "",
            "pagemap": {"cse_thumbnail": [{"src": "https://t.example.com/1.png", "width": "200"}]}
        }]}"#;
        let raw: CseApiResponse = serde_json::from_str(json).unwrap();
        let record = raw.into_records(1, Some(ResultKind::Web), 5).remove(0);

        assert_eq!(record.image_desc, "No description");
        assert_eq!(record.image_source, "No source");
        assert_eq!(record.image_url_thumbnail, "https://t.example.com/1.png");
        assert_eq!(record.kind, Some(ResultKind::Web));
    }

    #[test]
    fn test_missing_items_is_empty() {
        let raw: CseApiResponse = serde_json::from_str(r#"{"searchInformation": {"totalResults": "0"}}"#).unwrap();
        assert!(raw.into_records(1, None, 5).is_empty());
    }

    #[test]
    fn test_null_items_is_empty() {
        let raw: CseApiResponse = serde_json::from_str(r#"{"items": null}"#).unwrap();
        assert!(raw.into_records(1, Some(ResultKind::Web), 5).is_empty());

        let rendered = render_records(&[]).unwrap();
        assert_eq!(rendered, "[]");
    }

    #[test]
    fn test_null_thumbnail_list_falls_back() {
        let raw: CseApiResponse =
            serde_json::from_str(r#"{"items": [{"link": "https://example.com/", "pagemap": {"cse_thumbnail": null}}]}"#)
                .unwrap();
        let records = raw.into_records(1, None, 5);
        assert_eq!(records[0].image_url_thumbnail, "No thumbnail URL");
    }

    #[test]
    fn test_truncates_to_limit() {
        let items: Vec<String> = (0..8).map(|i| format!(r#"{{"link": "https://example.com/{i}"}}"#)).collect();
        let json = format!(r#"{{"items": [{}]}}"#, items.join(","));
        let raw: CseApiResponse = serde_json::from_str(&json).unwrap();
        let records = raw.into_records(1, None, 5);

        assert_eq!(records.len(), 5);
        assert_eq!(records[4].image_url, "https://example.com/4");
    }

    #[test]
    fn test_render_keys_and_type_tag() {
        let untagged = ResultRecord {
            entry_id: 3,
            image_url: "u".into(),
            image_desc: "d".into(),
            image_source: "s".into(),
            image_url_thumbnail: "t".into(),
            kind: None,
        };
        let tagged = ResultRecord { kind: Some(ResultKind::Image), ..untagged.clone() };

        let rendered = render_records(&[untagged, tagged]).unwrap();
        assert!(rendered.starts_with("[\n  {\n    \"EntryID\": 3,"));

        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert!(value[0].get("Type").is_none());
        assert_eq!(value[1]["Type"], "image");
        assert_eq!(value[1]["ImageUrlThumbnail"], "t");
    }
}
