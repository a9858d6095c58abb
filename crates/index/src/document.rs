//! Mapping from a `Reference` to its indexable document

use refsearch_core::Reference;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single indexed document: the stored id plus the flattened text the
/// postings are built from.
///
/// This is also the on-disk stored form: the snapshot persists these and
/// the posting lists are rebuilt from `text` on open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Join key back to the system-of-record. Stored verbatim, never tokenized.
    pub id: Uuid,
    /// Space-joined concatenation of the reference's textual fields.
    pub text: String,
}

impl IndexedDocument {
    /// Extract the indexable document from a reference.
    ///
    /// Returns `None` when every textual field is blank; such a record is
    /// never indexed, though it still exists in the system-of-record.
    pub fn from_reference(reference: &Reference) -> Option<Self> {
        let text = searchable_text(reference);
        if text.is_empty() {
            None
        } else {
            Some(IndexedDocument {
                id: reference.id,
                text,
            })
        }
    }
}

/// Space-joined concatenation of all non-blank textual fields.
fn searchable_text(r: &Reference) -> String {
    [
        &r.firstname,
        &r.middlename,
        &r.lastname,
        &r.summary,
        &r.author,
        &r.bibliography,
        &r.journal,
        &r.keywords,
        &r.pages,
        &r.title,
        &r.url,
        &r.volume,
        &r.year,
        &r.reference_string,
    ]
    .iter()
    .filter_map(|field| field.as_deref())
    .filter(|s| !s.trim().is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_reference_yields_none() {
        let reference = Reference::new(Uuid::new_v4());
        assert!(IndexedDocument::from_reference(&reference).is_none());
    }

    #[test]
    fn test_whitespace_only_fields_yield_none() {
        let mut reference = Reference::new(Uuid::new_v4());
        reference.title = Some("   ".to_string());
        reference.author = Some("".to_string());
        assert!(IndexedDocument::from_reference(&reference).is_none());
    }

    #[test]
    fn test_fields_joined_in_order() {
        let mut reference = Reference::new(Uuid::new_v4());
        reference.lastname = Some("Elven".to_string());
        reference.author = Some("Elven, R.".to_string());
        reference.year = Some("1980".to_string());

        let doc = IndexedDocument::from_reference(&reference).unwrap();
        assert_eq!(doc.text, "Elven Elven, R. 1980");
        assert_eq!(doc.id, reference.id);
    }

    #[test]
    fn test_blank_fields_skipped_in_join() {
        let mut reference = Reference::new(Uuid::new_v4());
        reference.title = Some("Moraine vegetation".to_string());
        reference.journal = Some("  ".to_string());
        reference.keywords = Some("Fje Veg".to_string());

        let doc = IndexedDocument::from_reference(&reference).unwrap();
        assert_eq!(doc.text, "Fje Veg Moraine vegetation");
    }

    #[test]
    fn test_non_textual_fields_ignored() {
        let mut reference = Reference::new(Uuid::new_v4());
        reference.application_id = Some(8);
        reference.user_id = Some(Uuid::new_v4());
        assert!(IndexedDocument::from_reference(&reference).is_none());
    }
}
