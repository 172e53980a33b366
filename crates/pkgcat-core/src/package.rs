//! Package domain models
//!
//! Field names follow the backend's JSON: the index endpoint speaks
//! camelCase, the detail endpoint speaks PascalCase.

use serde::{Deserialize, Deserializer, Serialize};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Lightweight package record used for listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSummary {
    #[serde(default, deserialize_with = "lenient_string")]
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<OffsetDateTime>,
    #[serde(flatten)]
    pub content: ContentRefs,
}

impl PackageSummary {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: Some(name.into()),
            last_updated: None,
            content: ContentRefs::default(),
        }
    }

    pub fn with_last_updated(mut self, last_updated: OffsetDateTime) -> Self {
        self.last_updated = Some(last_updated);
        self
    }

    pub fn with_content(mut self, content: ContentRefs) -> Self {
        self.content = content;
        self
    }

    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "Untitled",
        }
    }

    pub fn display_identifier(&self) -> &str {
        if self.identifier.is_empty() {
            "N/A"
        } else {
            &self.identifier
        }
    }
}

/// Download links carried on the summary. Opaque; never fetched here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRefs {
    #[serde(
        rename = "packageContentAsJson",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub json: Option<String>,
    #[serde(
        rename = "packageContentAsXml",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub xml: Option<String>,
    #[serde(
        rename = "packageContentAsKbart",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub kbart: Option<String>,
}

impl ContentRefs {
    /// The detail record is only resolvable when a JSON representation exists
    pub fn has_json(&self) -> bool {
        self.json.as_deref().is_some_and(|url| !url.trim().is_empty())
    }

    /// Present links as (label, url) pairs in display order
    pub fn links(&self) -> Vec<(&'static str, &str)> {
        [
            ("JSON", self.json.as_deref()),
            ("XML", self.xml.as_deref()),
            ("KBART", self.kbart.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, url)| url.filter(|u| !u.is_empty()).map(|u| (label, u)))
        .collect()
    }
}

/// Full package record including the title list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDetail {
    #[serde(rename = "PackageID", default, deserialize_with = "lenient_string")]
    pub identifier: String,
    #[serde(rename = "PackageName", default)]
    pub name: Option<String>,
    #[serde(rename = "PackageTermStartDate", default, with = "timestamp")]
    pub term_start: Option<OffsetDateTime>,
    #[serde(rename = "PackageTermEndDate", default, with = "timestamp")]
    pub term_end: Option<OffsetDateTime>,
    #[serde(rename = "RelatedOrgs", default, deserialize_with = "null_as_empty")]
    pub related_orgs: Vec<RelatedOrg>,
    #[serde(rename = "TitleList", default, deserialize_with = "null_as_empty")]
    pub titles: Vec<Title>,
}

impl PackageDetail {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "Untitled",
        }
    }
}

/// Organisation linked to a package (publisher, negotiator, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedOrg {
    #[serde(rename = "OrgRole", default)]
    pub role: String,
    #[serde(rename = "OrgName", default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(
        rename = "publicationType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub publication_type: Option<String>,
    #[serde(rename = "TitleIDs", default)]
    pub identifiers: TitleIds,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleIds {
    /// Online identifier (eISSN)
    #[serde(rename = "eissn", default, skip_serializing_if = "Option::is_none")]
    pub online: Option<String>,
    /// Print identifier (ISSN)
    #[serde(rename = "issn", default, skip_serializing_if = "Option::is_none")]
    pub print: Option<String>,
}

impl Title {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            publication_type: None,
            identifiers: TitleIds::default(),
        }
    }

    pub fn online_identifier(&self) -> Option<&str> {
        usable_identifier(self.identifiers.online.as_deref())
    }

    pub fn print_identifier(&self) -> Option<&str> {
        usable_identifier(self.identifiers.print.as_deref())
    }

    /// Lookup links for the print ISSN, empty when the title has none
    pub fn links(&self) -> Vec<TitleLink> {
        self.print_identifier().map(issn_links).unwrap_or_default()
    }
}

fn usable_identifier(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && *v != "N/A")
}

/// External lookup link for a title
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleLink {
    pub label: &'static str,
    pub url: String,
}

pub fn issn_links(issn: &str) -> Vec<TitleLink> {
    vec![
        TitleLink {
            label: "OpenAlex API",
            url: format!("https://api.openalex.org/sources/issn:{issn}"),
        },
        TitleLink {
            label: "OpenAlex Web",
            url: format!("https://explore.openalex.org/sources/issn:{issn}"),
        },
        TitleLink {
            label: "Crossref API: Journal",
            url: format!("https://api.crossref.org/journals/{issn}"),
        },
        TitleLink {
            label: "Crossref API: Works",
            url: format!("https://api.crossref.org/journals/{issn}/works"),
        },
    ]
}

/// Render a timestamp as `Jan 5, 2024`, or `Unknown`
pub fn format_date(value: Option<OffsetDateTime>) -> String {
    let format = format_description!("[month repr:short] [day padding:none], [year]");
    value
        .and_then(|ts| ts.format(&format).ok())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Parse the date shapes the backend has been seen to emit.
///
/// Offsetless values are taken as UTC. Anything else is `None`.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }
    if let Ok(ts) = OffsetDateTime::parse(raw, &Iso8601::DEFAULT) {
        return Some(ts);
    }
    if let Ok(ts) = PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT) {
        return Some(ts.assume_utc());
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}

pub(crate) mod timestamp {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::format_description::well_known::Rfc3339;
    use time::OffsetDateTime;

    pub fn serialize<S: Serializer>(
        value: &Option<OffsetDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => {
                let text = ts.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&text)
            }
            None => serializer.serialize_none(),
        }
    }

    /// Unparsable dates become `None` rather than failing the whole list
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<OffsetDateTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(super::parse_timestamp))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Integer(i64),
    Float(f64),
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value: Option<StringOrNumber> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(StringOrNumber::String(s)) => s,
        Some(StringOrNumber::Integer(n)) => n.to_string(),
        Some(StringOrNumber::Float(n)) => n.to_string(),
        None => String::new(),
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_summary_from_index_json() {
        let json = r#"{
            "identifier": "1042",
            "name": "Journals 2024",
            "lastUpdated": "2024-03-01T09:30:00Z",
            "packageContentAsJson": "https://example.org/1042.json",
            "packageContentAsKbart": "https://example.org/1042.tsv"
        }"#;
        let pkg: PackageSummary = serde_json::from_str(json).unwrap();
        assert_eq!(pkg.identifier, "1042");
        assert_eq!(pkg.display_name(), "Journals 2024");
        assert_eq!(pkg.last_updated, Some(datetime!(2024-03-01 09:30 UTC)));
        assert!(pkg.content.has_json());
        assert_eq!(pkg.content.xml, None);
        assert_eq!(
            pkg.content.links(),
            vec![
                ("JSON", "https://example.org/1042.json"),
                ("KBART", "https://example.org/1042.tsv"),
            ]
        );
    }

    #[test]
    fn test_summary_tolerates_missing_and_numeric_fields() {
        let pkg: PackageSummary =
            serde_json::from_str(r#"{"identifier": 77, "lastUpdated": "not a date"}"#).unwrap();
        assert_eq!(pkg.identifier, "77");
        assert_eq!(pkg.name, None);
        assert_eq!(pkg.display_name(), "Untitled");
        assert_eq!(pkg.last_updated, None);
        assert!(!pkg.content.has_json());

        let pkg: PackageSummary = serde_json::from_str(r#"{"name": "No id"}"#).unwrap();
        assert_eq!(pkg.display_identifier(), "N/A");
    }

    #[test]
    fn test_detail_from_export_json() {
        let json = r#"{
            "PackageID": "1042",
            "PackageName": "Journals 2024",
            "PackageTermStartDate": "2024-01-01",
            "PackageTermEndDate": null,
            "RelatedOrgs": [{"OrgRole": "Publisher", "OrgName": "Acme Press"}],
            "TitleList": [
                {"Title": "Journal of Things", "publicationType": "serial",
                 "TitleIDs": {"eissn": "1234-5678", "issn": "8765-4321"}},
                {"Title": "Annals of Stuff", "TitleIDs": {"issn": "N/A"}}
            ]
        }"#;
        let detail: PackageDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.identifier, "1042");
        assert_eq!(detail.term_start, Some(datetime!(2024-01-01 0:00 UTC)));
        assert_eq!(detail.term_end, None);
        assert_eq!(detail.related_orgs[0].role, "Publisher");
        assert_eq!(detail.titles.len(), 2);
        assert_eq!(detail.titles[0].online_identifier(), Some("1234-5678"));
        assert_eq!(detail.titles[0].print_identifier(), Some("8765-4321"));
        assert_eq!(detail.titles[1].print_identifier(), None);
        assert!(detail.titles[1].links().is_empty());
    }

    #[test]
    fn test_detail_null_lists() {
        let detail: PackageDetail =
            serde_json::from_str(r#"{"PackageID": 5, "TitleList": null}"#).unwrap();
        assert!(detail.titles.is_empty());
        assert!(detail.related_orgs.is_empty());
        assert_eq!(detail.display_name(), "Untitled");
    }

    #[test]
    fn test_issn_links() {
        let links = issn_links("8765-4321");
        assert_eq!(links.len(), 4);
        assert_eq!(links[0].url, "https://api.openalex.org/sources/issn:8765-4321");
        assert_eq!(links[1].url, "https://explore.openalex.org/sources/issn:8765-4321");
        assert_eq!(links[2].url, "https://api.crossref.org/journals/8765-4321");
        assert_eq!(links[3].url, "https://api.crossref.org/journals/8765-4321/works");
    }

    #[test]
    fn test_parse_timestamp_shapes() {
        assert_eq!(
            parse_timestamp("2024-03-01T09:30:00+01:00"),
            Some(datetime!(2024-03-01 09:30 +1))
        );
        assert_eq!(
            parse_timestamp("2024-03-01T09:30:00"),
            Some(datetime!(2024-03-01 09:30 UTC))
        );
        assert_eq!(parse_timestamp("2024-03-01"), Some(datetime!(2024-03-01 0:00 UTC)));
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Some(datetime!(2024-01-05 12:00 UTC))), "Jan 5, 2024");
        assert_eq!(format_date(None), "Unknown");
    }
}
