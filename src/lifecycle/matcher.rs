//! Person deduplication
//!
//! Decides whether client/technician details typed at a scan refer to someone
//! already on record. Only an exact match is reused silently; a partial match
//! on a strong identifier must be confirmed by the caller.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use utoipa::ToSchema;

use crate::models::enums::PersonKind;

/// Comparable fields of a client or technician
pub trait PersonFields {
    fn first_name(&self) -> &str;
    fn middle_name(&self) -> Option<&str>;
    fn last_name(&self) -> &str;
    fn contact_number(&self) -> Option<&str>;
    fn email(&self) -> Option<&str>;
    /// Address for clients, shop name and shop address for technicians
    fn locator(&self) -> [Option<&str>; 2];
}

/// A person already persisted
pub trait StoredPerson: PersonFields {
    fn id(&self) -> i32;
}

/// Strong identifiers; any one of them is enough to suspect the same person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    ContactNumber,
    Email,
    FullName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Every comparable field is equal; reuse without confirmation
    Exact(i32),
    /// Same strong identifier, different details; needs confirmation
    Ambiguous {
        existing_id: i32,
        matched_on: Vec<MatchField>,
    },
    None,
}

/// Classify `candidate` against the rows returned by the loose lookup.
///
/// Rows are considered in id order so the result does not depend on the
/// order the database returned them in.
pub fn classify<C, E>(candidate: &C, existing: &[E]) -> MatchOutcome
where
    C: PersonFields + ?Sized,
    E: StoredPerson,
{
    let wanted = Normalized::from_fields(candidate);

    let mut rows: Vec<&E> = existing.iter().collect();
    rows.sort_by_key(|p| p.id());

    let mut best: Option<(usize, i32, Vec<MatchField>)> = None;

    for row in rows {
        let other = Normalized::from_fields(row);
        let strong = wanted.strong_matches(&other);
        if strong.is_empty() {
            continue;
        }

        let equal = wanted.equal_field_count(&other);
        if equal == Normalized::FIELD_COUNT {
            return MatchOutcome::Exact(row.id());
        }

        // Strictly greater keeps the lowest id on ties
        if best.as_ref().map_or(true, |(score, _, _)| equal > *score) {
            best = Some((equal, row.id(), strong));
        }
    }

    match best {
        Some((_, existing_id, matched_on)) => MatchOutcome::Ambiguous {
            existing_id,
            matched_on,
        },
        None => MatchOutcome::None,
    }
}

struct Normalized {
    first: Option<String>,
    middle: Option<String>,
    last: Option<String>,
    contact: Option<String>,
    email: Option<String>,
    locator: [Option<String>; 2],
}

impl Normalized {
    const FIELD_COUNT: usize = 7;

    fn from_fields<P: PersonFields + ?Sized>(p: &P) -> Self {
        let [loc_a, loc_b] = p.locator();
        Self {
            first: normalize_text(Some(p.first_name())),
            middle: normalize_text(p.middle_name()),
            last: normalize_text(Some(p.last_name())),
            contact: normalize_contact(p.contact_number()),
            email: normalize_text(p.email()),
            locator: [normalize_text(loc_a), normalize_text(loc_b)],
        }
    }

    fn strong_matches(&self, other: &Self) -> Vec<MatchField> {
        let mut fields = Vec::new();
        if both_present_and_equal(&self.contact, &other.contact) {
            fields.push(MatchField::ContactNumber);
        }
        if both_present_and_equal(&self.email, &other.email) {
            fields.push(MatchField::Email);
        }
        if both_present_and_equal(&self.first, &other.first)
            && both_present_and_equal(&self.last, &other.last)
        {
            fields.push(MatchField::FullName);
        }
        fields
    }

    fn equal_field_count(&self, other: &Self) -> usize {
        [
            self.first == other.first,
            self.middle == other.middle,
            self.last == other.last,
            self.contact == other.contact,
            self.email == other.email,
            self.locator[0] == other.locator[0],
            self.locator[1] == other.locator[1],
        ]
        .into_iter()
        .filter(|eq| *eq)
        .count()
    }
}

fn both_present_and_equal(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

/// Trim, compose to NFC and lowercase; blank becomes `None`
pub fn normalize_text(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.nfc().collect::<String>().to_lowercase())
}

/// Keep digits and `+` only so spacing and dashes do not defeat matching
pub fn normalize_contact(value: Option<&str>) -> Option<String> {
    let digits: String = value?
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Lock keys for every strong identifier of `person`, sorted and deduplicated.
///
/// Two requests that could match each other share at least one key. Taking
/// the locks in this order keeps concurrent lookups from deadlocking.
pub fn identity_keys<P: PersonFields + ?Sized>(kind: PersonKind, person: &P) -> Vec<String> {
    let normalized = Normalized::from_fields(person);
    let mut keys = Vec::with_capacity(3);

    if let Some(contact) = &normalized.contact {
        keys.push(format!("{}:contact:{}", kind, contact));
    }
    if let Some(email) = &normalized.email {
        keys.push(format!("{}:email:{}", kind, email));
    }
    if let (Some(first), Some(last)) = (&normalized.first, &normalized.last) {
        keys.push(format!("{}:name:{}|{}", kind, first, last));
    }

    keys.sort();
    keys.dedup();
    keys
}
