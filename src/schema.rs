//! Header normalization and the immutable [`Row`] type.
//!
//! Every input column gets a field name derived from its header text:
//!
//! 1. Unicode compatibility decomposition (NFKD)
//! 2. Non-ASCII characters dropped (this removes the combining diacritics)
//! 3. Lowercased
//! 4. Everything that is not `[a-z0-9]` removed
//!
//! So `"Chave Natural"` and `"CHAVE-NATURAL"` both become `chavenatural`, which
//! is why a header where two columns normalize to the same name is rejected.

use crate::error::ImportError;
use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use unicode_normalization::UnicodeNormalization;

/// Field holding the natural key rows are grouped by.
pub const NATURAL_KEY: &str = "chavenatural";
/// Field holding the first page of the fascicle.
pub const FIRST_PAGE: &str = "firstpage";
/// Field holding the last page of the fascicle.
pub const LAST_PAGE: &str = "lastpage";

/// Fields the classifier reads. Everything else is carried through untouched.
pub const REQUIRED_FIELDS: [&str; 3] = [NATURAL_KEY, FIRST_PAGE, LAST_PAGE];

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]").expect("valid field name regex"));

/// Normalize a header column into a field name.
///
/// ```
/// use keysplit::schema::normalize_field_name;
///
/// assert_eq!(normalize_field_name("Chave Natural"), "chavenatural");
/// assert_eq!(normalize_field_name("Ánô-Públicação"), "anopublicacao");
/// ```
#[must_use]
pub fn normalize_field_name(column: &str) -> String {
    let ascii = column
        .nfkd()
        .filter(char::is_ascii)
        .collect::<String>()
        .to_ascii_lowercase();
    NON_ALNUM.replace_all(&ascii, "").into_owned()
}

/// Field layout shared by every row of one input.
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema from the raw header columns.
    ///
    /// # Errors
    /// [`ImportError::EmptyFieldName`] if a column has no alphanumeric
    /// characters, [`ImportError::DuplicateField`] if two columns normalize to
    /// the same name.
    pub fn from_header<I, S>(header: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = header.into_iter().map(Into::into).collect();
        let mut names = Vec::with_capacity(columns.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            let name = normalize_field_name(column);
            if name.is_empty() {
                return Err(ImportError::EmptyFieldName {
                    column: column.clone(),
                }
                .into());
            }
            if let Some(&prev) = index.get(&name) {
                return Err(ImportError::DuplicateField {
                    name,
                    first: columns[prev].clone(),
                    second: column.clone(),
                }
                .into());
            }
            index.insert(name.clone(), i);
            names.push(name);
        }
        Ok(Self {
            columns,
            names,
            index,
        })
    }

    /// Header columns exactly as they appeared in the input.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Normalized field names, in column order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column index of a normalized field name.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Check that every field in [`REQUIRED_FIELDS`] is present.
    ///
    /// # Errors
    /// [`ImportError::MissingField`] naming the first absent field.
    pub fn require_fields(&self) -> Result<()> {
        for field in REQUIRED_FIELDS {
            if !self.index.contains_key(field) {
                return Err(ImportError::MissingField(field).into());
            }
        }
        Ok(())
    }

    /// True when `fields` repeats the header text verbatim.
    pub fn is_header<'a, I>(&self, fields: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        fields
            .into_iter()
            .eq(self.columns.iter().map(String::as_str))
    }
}

/// One input row: field values in column order plus the shared [`Schema`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    schema: Arc<Schema>,
    fields: Box<[String]>,
}

impl Row {
    /// Build a row, or `None` when the field count does not match the schema.
    #[must_use]
    pub fn new(schema: Arc<Schema>, fields: Vec<String>) -> Option<Self> {
        (fields.len() == schema.len()).then(|| Self {
            schema,
            fields: fields.into_boxed_slice(),
        })
    }

    /// Value of a field by normalized name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.schema
            .position(name)
            .map(|i| self.fields[i].as_str())
    }

    /// The natural key this row is grouped by.
    ///
    /// # Errors
    /// [`ImportError::MissingField`] if the schema has no natural key column.
    pub fn natural_key(&self) -> Result<&str> {
        self.get(NATURAL_KEY)
            .ok_or_else(|| ImportError::MissingField(NATURAL_KEY).into())
    }

    /// True when the field is absent or holds the empty string.
    ///
    /// Whitespace is data: `" "` is not blank.
    #[must_use]
    pub fn is_blank(&self, name: &str) -> bool {
        self.get(name).is_none_or(str::is_empty)
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// `(field name, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.schema
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.fields.iter().map(String::as_str))
    }

    /// Consume the row, keeping only its values.
    #[must_use]
    pub fn into_fields(self) -> Vec<String> {
        self.fields.into_vec()
    }
}
