// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! This module defines schema in iceberg.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde_derive::{Deserialize, Serialize};

use crate::error::Result;
use crate::spec::datatypes::{NestedFieldRef, StructType, Type};
use crate::{Error, ErrorKind};

/// Type alias for schema id.
pub type SchemaId = i32;
/// Reference to [`Schema`].
pub type SchemaRef = Arc<Schema>;
/// Default schema id.
pub const DEFAULT_SCHEMA_ID: SchemaId = 0;

const LIST_FIELD_NAME: &str = "element";

/// Defines schema in iceberg.
///
/// Every field, including fields nested in structs and lists, is indexed by id and by its
/// full dot-separated name. Only the top-level fields ([`Schema::as_struct`]) are columns
/// that carry per-file statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "self::_serde::SchemaV2", into = "self::_serde::SchemaV2")]
pub struct Schema {
    r#struct: StructType,
    schema_id: SchemaId,
    highest_field_id: i32,

    id_to_field: HashMap<i32, NestedFieldRef>,

    name_to_id: HashMap<String, i32>,
    lowercase_name_to_id: HashMap<String, i32>,
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.r#struct == other.r#struct && self.schema_id == other.schema_id
    }
}

impl Eq for Schema {}

/// Schema builder.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema_id: i32,
    fields: Vec<NestedFieldRef>,
}

impl SchemaBuilder {
    /// Add fields to schema builder.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = NestedFieldRef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Set schema id.
    pub fn with_schema_id(mut self, schema_id: i32) -> Self {
        self.schema_id = schema_id;
        self
    }

    /// Builds the schema.
    pub fn build(self) -> Result<Schema> {
        let r#struct = StructType::new(self.fields);

        let mut index = SchemaIndex::default();
        for field in r#struct.fields() {
            index.visit(None, field)?;
        }

        let lowercase_name_to_id = index
            .name_to_id
            .iter()
            .map(|(k, v)| (k.to_lowercase(), *v))
            .collect();
        let highest_field_id = index.id_to_field.keys().copied().max().unwrap_or(0);

        Ok(Schema {
            r#struct,
            schema_id: self.schema_id,
            highest_field_id,
            id_to_field: index.id_to_field,
            name_to_id: index.name_to_id,
            lowercase_name_to_id,
        })
    }
}

#[derive(Default)]
struct SchemaIndex {
    id_to_field: HashMap<i32, NestedFieldRef>,
    name_to_id: HashMap<String, i32>,
}

impl SchemaIndex {
    fn visit(&mut self, parent: Option<&str>, field: &NestedFieldRef) -> Result<()> {
        let full_name = match parent {
            Some(parent) => format!("{parent}.{}", field.name),
            None => field.name.clone(),
        };

        match self.id_to_field.entry(field.id) {
            Entry::Occupied(_) => {
                return Err(Error::new(
                    ErrorKind::DataInvalid,
                    format!("Invalid schema: multiple fields for id {}", field.id),
                ));
            }
            Entry::Vacant(v) => {
                v.insert(field.clone());
            }
        }

        match self.name_to_id.entry(full_name.clone()) {
            Entry::Occupied(_) => {
                return Err(Error::new(
                    ErrorKind::DataInvalid,
                    format!("Invalid schema: multiple fields for name {full_name}"),
                ));
            }
            Entry::Vacant(v) => {
                v.insert(field.id);
            }
        }

        match field.field_type.as_ref() {
            Type::Primitive(_) => Ok(()),
            Type::Struct(struct_type) => {
                for child in struct_type.fields() {
                    self.visit(Some(&full_name), child)?;
                }
                Ok(())
            }
            Type::List(element) => {
                debug_assert_eq!(element.name, LIST_FIELD_NAME);
                self.visit(Some(&full_name), element)
            }
        }
    }
}

impl Schema {
    /// Create a schema builder.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Get field by field id, at any depth.
    pub fn field_by_id(&self, field_id: i32) -> Option<&NestedFieldRef> {
        self.id_to_field.get(&field_id)
    }

    /// Get field by field name, at any depth.
    ///
    /// Both full name and short name could work here.
    pub fn field_by_name(&self, field_name: &str) -> Option<&NestedFieldRef> {
        self.name_to_id
            .get(field_name)
            .and_then(|id| self.field_by_id(*id))
    }

    /// Get field by field name, but in case-insensitive way.
    pub fn field_by_name_case_insensitive(&self, field_name: &str) -> Option<&NestedFieldRef> {
        self.lowercase_name_to_id
            .get(&field_name.to_lowercase())
            .and_then(|id| self.field_by_id(*id))
    }

    /// Returns the full name of the field with the given id.
    pub fn name_by_field_id(&self, field_id: i32) -> Option<&str> {
        self.name_to_id
            .iter()
            .find(|(_, id)| **id == field_id)
            .map(|(name, _)| name.as_str())
    }

    /// Returns [`highest_field_id`].
    #[inline]
    pub fn highest_field_id(&self) -> i32 {
        self.highest_field_id
    }

    /// Returns [`schema_id`].
    #[inline]
    pub fn schema_id(&self) -> SchemaId {
        self.schema_id
    }

    /// Returns the top-level columns as a struct.
    #[inline]
    pub fn as_struct(&self) -> &StructType {
        &self.r#struct
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "table {{")?;
        for field in self.as_struct().fields() {
            writeln!(f, "  {field}")?;
        }
        writeln!(f, "}}")
    }
}

mod _serde {
    use serde_derive::{Deserialize, Serialize};

    use super::{Schema, SchemaId};
    use crate::Error;
    use crate::spec::NestedFieldRef;

    #[derive(Serialize, Deserialize, Debug)]
    #[serde(rename_all = "kebab-case")]
    /// Defines the structure of a v2 schema for serialization/deserialization
    pub(crate) struct SchemaV2 {
        pub schema_id: SchemaId,
        pub fields: Vec<NestedFieldRef>,
    }

    impl TryFrom<SchemaV2> for Schema {
        type Error = Error;

        fn try_from(value: SchemaV2) -> Result<Self, Self::Error> {
            Schema::builder()
                .with_schema_id(value.schema_id)
                .with_fields(value.fields)
                .build()
        }
    }

    impl From<Schema> for SchemaV2 {
        fn from(value: Schema) -> Self {
            SchemaV2 {
                schema_id: value.schema_id,
                fields: value.r#struct.fields().to_vec(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::spec::{NestedField, PrimitiveType};

    fn nested_schema() -> Schema {
        let address = StructType::new(vec![
            Arc::new(NestedField::optional(
                4,
                "street",
                Type::Primitive(PrimitiveType::String),
            )),
            Arc::new(NestedField::optional(
                5,
                "zip",
                Type::Primitive(PrimitiveType::Int),
            )),
        ]);
        Schema::builder()
            .with_schema_id(1)
            .with_fields(vec![
                Arc::new(NestedField::required(
                    1,
                    "id",
                    Type::Primitive(PrimitiveType::Long),
                )),
                Arc::new(NestedField::optional(2, "Address", Type::Struct(address))),
                Arc::new(NestedField::optional(
                    3,
                    "tags",
                    Type::List(Arc::new(NestedField::required(
                        6,
                        "element",
                        Type::Primitive(PrimitiveType::String),
                    ))),
                )),
            ])
            .build()
            .unwrap()
    }

    #[test]
    fn test_index_by_name_and_id() {
        let schema = nested_schema();

        assert_eq!(schema.field_by_name("id").unwrap().id, 1);
        assert_eq!(schema.field_by_name("Address.zip").unwrap().id, 5);
        assert_eq!(schema.field_by_name("tags.element").unwrap().id, 6);
        assert!(schema.field_by_name("address.zip").is_none());
        assert_eq!(
            schema
                .field_by_name_case_insensitive("address.ZIP")
                .unwrap()
                .id,
            5
        );
        assert_eq!(schema.field_by_id(4).unwrap().name, "street");
        assert_eq!(schema.name_by_field_id(5), Some("Address.zip"));
        assert_eq!(schema.highest_field_id(), 6);
    }

    #[test]
    fn test_top_level_struct_excludes_nested_fields() {
        let schema = nested_schema();

        assert!(schema.as_struct().field_by_id(2).is_some());
        assert!(schema.as_struct().field_by_id(5).is_none());
        assert!(schema.field_by_id(5).is_some());
    }

    #[test]
    fn test_duplicate_field_id_is_rejected() {
        let result = Schema::builder()
            .with_fields(vec![
                Arc::new(NestedField::required(
                    1,
                    "a",
                    Type::Primitive(PrimitiveType::Int),
                )),
                Arc::new(NestedField::required(
                    1,
                    "b",
                    Type::Primitive(PrimitiveType::Int),
                )),
            ])
            .build();

        assert_eq!(result.unwrap_err().kind(), ErrorKind::DataInvalid);
    }

    #[test]
    fn test_schema_serde_round_trip() {
        let schema = nested_schema();
        let json = serde_json::to_string(&schema).unwrap();
        let parsed: Schema = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, schema);
        assert_eq!(parsed.field_by_name("Address.street").unwrap().id, 4);
    }
}
