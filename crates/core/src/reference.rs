//! The bibliographic reference record
//!
//! This is the shape the relational system-of-record feeds the index. Only
//! the textual fields participate in search; the id is the join key back to
//! the authoritative row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bibliographic reference: article, book, person, url and so on.
///
/// All textual fields are optional; a reference with no text at all is
/// legal in the system-of-record but is never indexed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Internal id for the reference
    pub id: Uuid,
    /// The application the reference was registered via
    pub application_id: Option<i32>,
    /// The user that registered the reference
    pub user_id: Option<Uuid>,
    /// The author of the publication
    pub author: Option<String>,
    /// Publication year
    pub year: Option<String>,
    /// Title of the publication
    pub title: Option<String>,
    /// Summary of the content
    pub summary: Option<String>,
    /// Journal the publication appeared in
    pub journal: Option<String>,
    /// Volume in the journal
    pub volume: Option<String>,
    /// Page range in the volume
    pub pages: Option<String>,
    /// A bibliographic citation for the resource
    pub bibliography: Option<String>,
    /// Last name of a person referenced
    pub lastname: Option<String>,
    /// Middle name of a person referenced
    pub middlename: Option<String>,
    /// First name of a person referenced
    pub firstname: Option<String>,
    /// A standalone or supporting URL
    pub url: Option<String>,
    /// Free-form keywords
    pub keywords: Option<String>,
    /// Free-format representation of the whole reference
    pub reference_string: Option<String>,
    /// When the reference was last edited
    pub edit_date: Option<DateTime<Utc>>,
}

impl Reference {
    /// Create an empty reference with the given id.
    pub fn new(id: Uuid) -> Self {
        Reference {
            id,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let id = Uuid::new_v4();
        let reference = Reference::new(id);
        assert_eq!(reference.id, id);
        assert!(reference.title.is_none());
        assert!(reference.bibliography.is_none());
    }

    #[test]
    fn test_serde_roundtrip() {
        let reference = Reference {
            id: Uuid::new_v4(),
            application_id: Some(8),
            author: Some("Elven, R.".to_string()),
            year: Some("1980".to_string()),
            keywords: Some("Fje Veg Ass Dyn".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_string(&reference).unwrap();
        let back: Reference = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reference);
    }
}
