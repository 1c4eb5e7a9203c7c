//! This module defines [Struct].

use linked_hash_map::LinkedHashMap;

use crate::{
    error::Error,
    view::{View, ViewFormat, ViewParameters},
};

use super::{attrs_with_datatype, Attrs, LgdoRef, LgdoType};

/// Named collection of data objects
///
/// Fields keep their insertion order.
/// The same object may be a field of several collections.
#[derive(Debug, Clone)]
pub struct Struct {
    fields: LinkedHashMap<String, LgdoRef>,
    attrs: Attrs,
    /// Name used in the `datatype` attribute
    kind: &'static str,
}

impl Struct {
    /// Create an empty [Struct].
    pub fn new() -> Self {
        Self::with_attrs(Attrs::new())
    }

    /// Create an empty [Struct] with the given attributes.
    pub fn with_attrs(attrs: Attrs) -> Self {
        Self::with_kind("struct", attrs)
    }

    /// Create an empty collection describing itself as `kind` in its `datatype` attribute.
    pub(crate) fn with_kind(kind: &'static str, attrs: Attrs) -> Self {
        let mut result = Self {
            fields: LinkedHashMap::new(),
            attrs,
            kind,
        };
        result.update_datatype();
        result
    }

    fn update_datatype(&mut self) {
        let datatype = self.form_datatype();
        self.attrs = attrs_with_datatype(std::mem::take(&mut self.attrs), datatype);
    }

    /// Add `object` as field `name`.
    ///
    /// A field that already exists is replaced in place.
    pub fn add_field(&mut self, name: impl Into<String>, object: LgdoRef) {
        let name = name.into();

        match self.fields.get_mut(&name) {
            Some(field) => *field = object,
            None => {
                self.fields.insert(name, object);
                self.update_datatype();
            }
        }
    }

    /// Remove field `name` and return it, if it exists.
    pub fn remove_field(&mut self, name: &str) -> Option<LgdoRef> {
        let removed = self.fields.remove(name);
        if removed.is_some() {
            self.update_datatype();
        }
        removed
    }

    /// Return the field `name`, if it exists.
    pub fn get(&self, name: &str) -> Option<&LgdoRef> {
        self.fields.get(name)
    }

    /// Return whether there is a field `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate over the field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterate over the fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LgdoRef)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Return the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Return true iff there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for Struct {
    fn default() -> Self {
        Self::new()
    }
}

impl LgdoType for Struct {
    fn datatype_name(&self) -> &'static str {
        self.kind
    }

    fn form_datatype(&self) -> String {
        format!(
            "{}{{{}}}",
            self.kind,
            itertools::join(self.fields.keys(), ",")
        )
    }

    fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    fn length(&self) -> Option<usize> {
        None
    }

    fn resize(&mut self, _length: usize) -> Result<(), Error> {
        Err(Error::UnsupportedColumnType(self.kind.to_string()))
    }

    fn view_as(&self, format: ViewFormat, _parameters: &ViewParameters) -> Result<View, Error> {
        Err(Error::FormatNotSupported {
            format,
            datatype: self.kind.to_string(),
        })
    }
}

#[cfg(test)]
mod test {
    use crate::types::{Array, LgdoRef, LgdoType, Scalar};

    use super::Struct;
    use test_log::test;

    #[test]
    fn fields_keep_their_order() {
        let mut fields = Struct::new();
        fields.add_field("b", LgdoRef::new(Scalar::new(1i64)));
        fields.add_field("a", LgdoRef::new(Array::from(vec![1.0])));
        assert_eq!(fields.attrs()["datatype"], "struct{b,a}");

        let replacement = LgdoRef::new(Scalar::new(2i64));
        fields.add_field("b", replacement.clone());
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert!(fields.get("b").unwrap().ptr_eq(&replacement));

        assert!(fields.remove_field("b").is_some());
        assert!(fields.remove_field("b").is_none());
        assert_eq!(fields.form_datatype(), "struct{a}");
        assert_eq!(fields.len(), 1);
        assert!(fields.length().is_none());
    }
}
