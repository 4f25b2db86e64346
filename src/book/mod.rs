//! Book records stored in the index
//!
//! A `Book` is the entry type kept at every level of the B-tree. Its ISBN is
//! the ordering key; the remaining fields are payload. The serde layout is
//! the one used by the JSON interchange files (`ISBN`, `Name`, `Author`,
//! `Price`, `Quantity`), while the lowercase spellings found in operation log
//! payloads are accepted on input.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Key type for the book index (compared byte-wise)
pub type Isbn = String;

/// A book entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(
        rename = "ISBN",
        alias = "isbn",
        alias = "Isbn",
        deserialize_with = "lenient_key"
    )]
    pub isbn: Isbn,

    #[serde(
        rename = "Name",
        alias = "name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,

    #[serde(
        rename = "Author",
        alias = "author",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub author: Option<String>,

    #[serde(
        rename = "Price",
        alias = "price",
        default,
        deserialize_with = "lenient_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,

    #[serde(
        rename = "Quantity",
        alias = "quantity",
        default,
        deserialize_with = "lenient_integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<i64>,
}

impl Book {
    pub fn new(
        isbn: impl Into<Isbn>,
        name: impl Into<String>,
        author: impl Into<String>,
        price: Option<f64>,
        quantity: Option<i64>,
    ) -> Self {
        Self {
            isbn: isbn.into(),
            name: Some(name.into()),
            author: Some(author.into()),
            price,
            quantity,
        }
    }

    /// The ordering key of this entry
    pub fn key(&self) -> &str {
        &self.isbn
    }

    /// Name, or an empty string when the log never supplied one
    pub fn name_or_default(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Author, or an empty string when the log never supplied one
    pub fn author_or_default(&self) -> &str {
        self.author.as_deref().unwrap_or_default()
    }
}

/// Partial update of a book
///
/// Only `price` and `quantity` are written to the stored book. `name` and
/// `author` are carried as they appeared in the log line so the operation
/// list keeps them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookPatch {
    #[serde(
        rename = "ISBN",
        alias = "isbn",
        alias = "Isbn",
        deserialize_with = "lenient_key"
    )]
    pub isbn: Isbn,

    #[serde(
        rename = "Name",
        alias = "name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,

    #[serde(
        rename = "Author",
        alias = "author",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub author: Option<String>,

    #[serde(
        rename = "Price",
        alias = "price",
        default,
        deserialize_with = "lenient_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,

    #[serde(
        rename = "Quantity",
        alias = "quantity",
        default,
        deserialize_with = "lenient_integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<i64>,
}

impl BookPatch {
    pub fn new(isbn: impl Into<Isbn>, price: Option<f64>, quantity: Option<i64>) -> Self {
        Self {
            isbn: isbn.into(),
            name: None,
            author: None,
            price,
            quantity,
        }
    }

    /// Overwrite the supplied fields of `book`
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(price) = self.price {
            book.price = Some(price);
        }
        if let Some(quantity) = self.quantity {
            book.quantity = Some(quantity);
        }
    }
}

/// Raw numeric field as it appears in payloads: a JSON number or a string
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

/// ISBNs are strings, but some payloads write them as bare numbers
pub(crate) fn lenient_key<'de, D>(deserializer: D) -> Result<Isbn, D::Error>
where
    D: Deserializer<'de>,
{
    match RawNumber::deserialize(deserializer)? {
        RawNumber::Int(i) => Ok(i.to_string()),
        RawNumber::Float(f) => Ok(f.to_string()),
        RawNumber::Text(text) => Ok(text),
    }
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<RawNumber>::deserialize(deserializer)? {
        None => None,
        Some(RawNumber::Int(i)) => Some(i as f64),
        Some(RawNumber::Float(f)) => Some(f),
        Some(RawNumber::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                match text.parse::<f64>() {
                    Ok(f) => Some(f),
                    Err(_) => {
                        return Err(de::Error::custom(format!("invalid decimal: {:?}", text)));
                    }
                }
            }
        }
    };

    match value {
        Some(f) if !f.is_finite() => Err(de::Error::custom(format!(
            "invalid decimal: {}",
            f
        ))),
        other => Ok(other),
    }
}

fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawNumber::Int(i)) => Ok(Some(i)),
        Some(RawNumber::Float(f)) => integral(f)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid integer: {}", f))),
        Some(RawNumber::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(integral))
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid integer: {:?}", text)))
        }
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
