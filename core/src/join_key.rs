use crate::error::{JoinError, Side};
use crate::record::Record;
use crate::tokenizer::{tokenize_with, TokenizerOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of normalized tokens standing for one record. Never contains the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinKey(BTreeSet<String>);

impl JoinKey {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = &str> { self.0.iter().map(String::as_str) }

    /// Number of tokens present in both keys.
    pub fn intersection_len(&self, other: &JoinKey) -> usize {
        let (small, large) = if self.len() <= other.len() { (self, other) } else { (other, self) };
        small.0.iter().filter(|t| large.0.contains(*t)).count()
    }

    /// Tokens joined by single spaces in sorted order.
    pub fn to_text(&self) -> String {
        self.iter().collect::<Vec<_>>().join(" ")
    }
}

impl<S: Into<String>> FromIterator<S> for JoinKey {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).filter(|t: &String| !t.is_empty()).collect())
    }
}

/// A record id paired with the join key derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedRecord<I> {
    pub id: I,
    pub key: JoinKey,
}

impl<I> KeyedRecord<I> {
    pub fn new(id: I, key: JoinKey) -> Self { Self { id, key } }
}

/// Derives join keys from a fixed, ordered selection of fields.
///
/// Field values are joined with single spaces in selection order, missing values contributing
/// the empty string, and the result is tokenized into a set. Missing values are `None` from the
/// start rather than a textual null marker, so no marker can leak into the token set.
#[derive(Debug, Clone)]
pub struct JoinKeyBuilder {
    side: Side,
    fields: Vec<String>,
    options: TokenizerOptions,
}

impl JoinKeyBuilder {
    pub fn new<S: AsRef<str>>(side: Side, fields: &[S]) -> Self {
        Self {
            side,
            fields: fields.iter().map(|f| f.as_ref().to_string()).collect(),
            options: TokenizerOptions::default(),
        }
    }

    pub fn with_tokenizer(mut self, options: TokenizerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn fields(&self) -> &[String] { &self.fields }

    /// Space-joined field values, before tokenizing.
    pub fn concat<I>(&self, record: &Record<I>) -> Result<String, JoinError> {
        let mut parts: Vec<&str> = Vec::with_capacity(self.fields.len());
        for f in &self.fields {
            match record.get(f) {
                Some(value) => parts.push(value.unwrap_or("")),
                None => return Err(JoinError::InvalidField { field: f.clone(), side: self.side }),
            }
        }
        Ok(parts.join(" "))
    }

    pub fn build<I>(&self, record: &Record<I>) -> Result<JoinKey, JoinError> {
        let text = self.concat(record)?;
        Ok(tokenize_with(&text, self.options).into_iter().collect())
    }

    pub fn keyed<I: Clone>(&self, record: &Record<I>) -> Result<KeyedRecord<I>, JoinError> {
        Ok(KeyedRecord::new(record.id.clone(), self.build(record)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(tokens: &[&str]) -> JoinKey { tokens.iter().copied().collect() }

    #[test]
    fn builds_set_from_fields() {
        let r = Record::new(1).with("title", Some("Widget Pro widget")).with("manufacturer", Some("Acme"));
        let b = JoinKeyBuilder::new(Side::Left, &["title", "manufacturer"]);
        assert_eq!(b.concat(&r).unwrap(), "Widget Pro widget Acme");
        assert_eq!(b.build(&r).unwrap(), key(&["widget", "pro", "acme"]));
    }

    #[test]
    fn missing_value_adds_no_token() {
        let r = Record::new(1).with("title", Some("Widget")).with("manufacturer", None::<String>);
        let b = JoinKeyBuilder::new(Side::Left, &["title", "manufacturer"]);
        assert_eq!(b.concat(&r).unwrap(), "Widget ");
        assert_eq!(b.build(&r).unwrap(), key(&["widget"]));
    }

    #[test]
    fn all_missing_gives_empty_key() {
        let r = Record::new(1).with("title", None::<String>);
        let b = JoinKeyBuilder::new(Side::Right, &["title"]);
        assert!(b.build(&r).unwrap().is_empty());
    }

    #[test]
    fn unknown_field_fails() {
        let r = Record::new(1).with("title", Some("Widget"));
        let b = JoinKeyBuilder::new(Side::Right, &["name"]);
        assert_eq!(
            b.build(&r).unwrap_err(),
            JoinError::InvalidField { field: "name".into(), side: Side::Right }
        );
    }

    #[test]
    fn field_order_does_not_change_key() {
        let r = Record::new(7).with("a", Some("Blue Car")).with("b", Some("fast, red"));
        let ab = JoinKeyBuilder::new(Side::Left, &["a", "b"]).build(&r).unwrap();
        let ba = JoinKeyBuilder::new(Side::Left, &["b", "a"]).build(&r).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn intersection_and_text() {
        let a = key(&["a", "b", "c"]);
        let b = key(&["b", "c", "d"]);
        assert_eq!(a.intersection_len(&b), 2);
        assert_eq!(a.to_text(), "a b c");
        assert_eq!(key(&["", "x"]).len(), 1);
    }
}
