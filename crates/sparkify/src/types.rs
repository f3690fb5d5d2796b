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

//! Spark-style schema types mapped onto Arrow types

use std::sync::Arc;

use arrow::datatypes::{DataType as ArrowDataType, Field, Schema, SchemaRef, TimeUnit};
use serde_json::{json, Value};

/// Represents basic methods for a [SparkDataType]
pub trait SparkDataType {
    /// JSON representation of the object
    fn json_value(&self) -> Value;

    fn type_name(&self) -> String;

    fn json(&self) -> String {
        self.json_value().to_string()
    }
}

/// Representation of a Spark StructType
///
/// Used to declare the schema of raw JSON input with other [DataType]
///
/// # Example:
///
/// ```
/// let schema = StructType::new(vec![
///        StructField::new("song_id", DataType::String, None),
///        StructField::new("year", DataType::Integer, None),
///     ]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct StructType {
    fields: Vec<StructField>,
}

impl StructType {
    /// Create an empty StructType
    pub fn empty() -> Self {
        StructType { fields: vec![] }
    }

    /// Create a new StructType from a vector of [StructField]
    pub fn new(fields: Vec<StructField>) -> Self {
        StructType { fields }
    }

    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Append a new field onto the exist fields
    pub fn append(mut self, field: StructField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn to_arrow(&self) -> SchemaRef {
        Arc::new(Schema::from(self))
    }
}

impl From<&StructType> for Schema {
    fn from(value: &StructType) -> Schema {
        let fields: Vec<Field> = value.fields.iter().map(Field::from).collect();
        Schema::new(fields)
    }
}

impl SparkDataType for StructType {
    fn type_name(&self) -> String {
        String::from("struct")
    }

    fn json_value(&self) -> Value {
        let fields: Vec<Value> = self.fields.iter().map(|f| f.json_value()).collect();
        json!({ "fields": fields, "type": "struct" })
    }
}

/// A Field in a [StructType]
#[derive(Clone, Debug, PartialEq)]
pub struct StructField {
    pub name: &'static str,
    pub data_type: DataType,
    pub nullable: bool,
}

impl StructField {
    pub fn new(name: &'static str, data_type: DataType, nullable: Option<bool>) -> Self {
        StructField {
            name,
            data_type,
            nullable: nullable.unwrap_or(true),
        }
    }
}

impl From<&StructField> for Field {
    fn from(value: &StructField) -> Field {
        Field::new(value.name, value.data_type.to_arrow(), value.nullable)
    }
}

impl SparkDataType for StructField {
    fn type_name(&self) -> String {
        self.data_type.type_name()
    }

    fn json_value(&self) -> Value {
        json!({
            "name": self.name,
            "type": self.data_type.type_name(),
            "nullable": self.nullable,
            "metadata": {},
        })
    }
}

/// A set of DataTypes which represent Spark DataTypes.
///
/// Only the primitive types the job declares are represented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    /// BooleanType
    Boolean,
    /// IntegerType
    Integer,
    /// LongType
    Long,
    /// FloatType
    Float,
    /// DoubleType
    Double,
    /// StringType
    String,
    /// DateType
    Date,
    /// TimestampType, millisecond precision without time zone
    Timestamp,
}

impl DataType {
    pub fn to_arrow(&self) -> ArrowDataType {
        match self {
            Self::Boolean => ArrowDataType::Boolean,
            Self::Integer => ArrowDataType::Int32,
            Self::Long => ArrowDataType::Int64,
            Self::Float => ArrowDataType::Float32,
            Self::Double => ArrowDataType::Float64,
            Self::String => ArrowDataType::Utf8,
            Self::Date => ArrowDataType::Date32,
            Self::Timestamp => ArrowDataType::Timestamp(TimeUnit::Millisecond, None),
        }
    }
}

impl SparkDataType for DataType {
    fn type_name(&self) -> String {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Date => "date",
            Self::Timestamp => "timestamp",
        }
        .to_string()
    }

    fn json_value(&self) -> Value {
        Value::String(self.type_name())
    }
}
