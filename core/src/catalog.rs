//! Catalog lookup adapter.
//!
//! Turns a title/author query into a catalog volumes-search URL and converts
//! the catalog's volume records into partial [`BookRecord`]s ready for
//! [`BookRecord::merge_from`]. The HTTP transport lives behind the
//! [`CatalogSearch`] trait.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CatalogError;
use crate::record::join_list;
use crate::BookRecord;

/// Volumes search endpoint of the book catalog.
pub const VOLUMES_ENDPOINT: &str = "https://www.googleapis.com/books/v1/volumes";

/// A catalog search request.
///
/// # Examples
///
/// ```
/// use bookshelf_core::CatalogQuery;
///
/// let query = CatalogQuery::new("Dune", "Frank Herbert");
/// let url = query.to_url().unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://www.googleapis.com/books/v1/volumes?q=intitle%3ADune+inauthor%3AFrank+Herbert"
/// );
/// assert!(CatalogQuery::default().to_url().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub title: String,
    pub authors: String,
    /// Free-text terms added to the title/author terms.
    pub general: String,
}

impl CatalogQuery {
    pub fn new(title: impl Into<String>, authors: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            authors: authors.into(),
            general: String::new(),
        }
    }

    /// Adds free-text terms.
    pub fn with_general(mut self, general: impl Into<String>) -> Self {
        self.general = general.into();
        self
    }

    /// Builds the query for an existing record.
    pub fn for_record(record: &BookRecord) -> Self {
        Self::new(record.title.trim(), record.authors.trim())
    }

    /// Returns the `q` parameter value.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EmptyQuery`] when every term is blank.
    pub fn terms(&self) -> Result<String, CatalogError> {
        let mut terms = Vec::new();
        if !self.title.trim().is_empty() {
            terms.push(format!("intitle:{}", self.title.trim()));
        }
        if !self.authors.trim().is_empty() {
            terms.push(format!("inauthor:{}", self.authors.trim()));
        }
        if !self.general.trim().is_empty() {
            terms.push(self.general.trim().to_string());
        }
        if terms.is_empty() {
            return Err(CatalogError::EmptyQuery);
        }
        Ok(terms.join(" "))
    }

    /// Returns the full search URL.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EmptyQuery`] when every term is blank.
    pub fn to_url(&self) -> Result<Url, CatalogError> {
        let terms = self.terms()?;
        Url::parse_with_params(VOLUMES_ENDPOINT, &[("q", terms)])
            .map_err(|err| CatalogError::Lookup(err.to_string()))
    }
}

/// Catalog search response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumesResponse {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub items: Vec<Volume>,
}

impl VolumesResponse {
    /// Decodes a JSON response body.
    pub fn from_json(body: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Converts every volume into a partial record.
    pub fn to_partials(&self) -> Vec<BookRecord> {
        self.items.iter().map(Volume::to_partial).collect()
    }
}

/// One catalog volume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub image_links: Option<ImageLinks>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default)]
    pub thumbnail: String,
}

impl Volume {
    /// Converts the volume into a partial record.
    ///
    /// Authors and categories are `;`-joined, the year is taken from the
    /// leading segment of the published date (`"1965-08-01"` gives 1965).
    pub fn to_partial(&self) -> BookRecord {
        let info = &self.volume_info;
        let year = info
            .published_date
            .as_deref()
            .and_then(|date| date.split('-').next())
            .and_then(crate::cell::parse_year);

        BookRecord {
            title: info.title.clone(),
            authors: join_list(&info.authors),
            genres: join_list(&info.categories),
            year,
            image_url: info
                .image_links
                .as_ref()
                .map(|links| links.thumbnail.clone())
                .unwrap_or_default(),
            google_books_id: self.id.clone(),
            ..BookRecord::default()
        }
    }
}

/// A source of catalog candidates.
pub trait CatalogSearch {
    /// Returns candidate partial records for `query`, best match first.
    fn search(&self, query: &CatalogQuery) -> Result<Vec<BookRecord>, CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
        "kind": "books#volumes",
        "totalItems": 2,
        "items": [
            {
                "id": "B1gKAQAAMAAJ",
                "volumeInfo": {
                    "title": "Dune",
                    "authors": ["Frank Herbert"],
                    "categories": ["Fiction", "Science Fiction"],
                    "publishedDate": "1965-08-01",
                    "imageLinks": { "thumbnail": "http://books.example/dune.jpg" }
                }
            },
            {
                "id": "xyz",
                "volumeInfo": { "title": "Dune Messiah" }
            }
        ]
    }"#;

    #[test]
    fn test_volume_to_partial() {
        let response = VolumesResponse::from_json(RESPONSE).unwrap();
        let partials = response.to_partials();
        assert_eq!(partials.len(), 2);

        let dune = &partials[0];
        assert_eq!(dune.title, "Dune");
        assert_eq!(dune.authors, "Frank Herbert");
        assert_eq!(dune.genres, "Fiction;Science Fiction");
        assert_eq!(dune.year, Some(1965));
        assert_eq!(dune.image_url, "http://books.example/dune.jpg");
        assert_eq!(dune.google_books_id, "B1gKAQAAMAAJ");
        assert_eq!(dune.row, None);

        let messiah = &partials[1];
        assert_eq!(messiah.authors, "");
        assert_eq!(messiah.year, None);
        assert_eq!(messiah.image_url, "");
    }

    #[test]
    fn test_partial_merges_without_clobbering() {
        let response = VolumesResponse::from_json(RESPONSE).unwrap();
        let mut book = BookRecord::new("Dune Messiah", "Frank Herbert");
        book.year = Some(1969);
        book.merge_from(&response.to_partials()[1]);
        assert_eq!(book.authors, "Frank Herbert");
        assert_eq!(book.year, Some(1969));
        assert_eq!(book.google_books_id, "xyz");
    }

    #[test]
    fn test_empty_response() {
        let response = VolumesResponse::from_json(r#"{"totalItems": 0}"#).unwrap();
        assert!(response.to_partials().is_empty());
    }

    #[test]
    fn test_query_terms() {
        assert_eq!(
            CatalogQuery::new("", "Le Guin").terms().unwrap(),
            "inauthor:Le Guin"
        );
        assert_eq!(
            CatalogQuery::new("Earthsea", "")
                .with_general("omnibus")
                .terms()
                .unwrap(),
            "intitle:Earthsea omnibus"
        );
        assert!(matches!(
            CatalogQuery::new("  ", "").terms(),
            Err(CatalogError::EmptyQuery)
        ));
    }

    /// Serves a fixed response body for every query.
    struct CannedSearch(&'static str);

    impl CatalogSearch for CannedSearch {
        fn search(&self, query: &CatalogQuery) -> Result<Vec<BookRecord>, CatalogError> {
            query.terms()?;
            Ok(VolumesResponse::from_json(self.0)?.to_partials())
        }
    }

    #[test]
    fn test_search_enriches_record() {
        let search = CannedSearch(RESPONSE);
        let mut book = BookRecord::new("dune", "herbert");
        let candidates = search.search(&CatalogQuery::for_record(&book)).unwrap();
        book.merge_from(&candidates[0]);
        assert_eq!(book.title, "Dune");
        assert_eq!(book.authors, "Frank Herbert");

        assert!(matches!(
            search.search(&CatalogQuery::default()),
            Err(CatalogError::EmptyQuery)
        ));
        assert!(matches!(
            CannedSearch("not json").search(&CatalogQuery::new("Dune", "")),
            Err(CatalogError::Response(_))
        ));
    }

    #[test]
    fn test_query_for_record() {
        let book = BookRecord::new(" Dune ", "Frank Herbert");
        let query = CatalogQuery::for_record(&book);
        assert_eq!(query.title, "Dune");
        assert!(query.to_url().unwrap().as_str().contains("intitle%3ADune"));
    }
}
