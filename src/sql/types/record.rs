//! Positional binary record codec.
//!
//! A record is laid out strictly in schema column order with no per-value
//! tag: INT and FLOAT are 8 bytes little-endian, BOOL is one byte, and TEXT is
//! a little-endian `u16` byte length followed by the raw UTF-8 bytes. Decoding
//! trusts the schema completely.

use bytes::{Buf, BufMut};

use crate::{
    error::{Error, Result},
    sql::types::{DataRow, DataSchema, DataType, Value},
};

/// Longest TEXT value the length prefix can describe
pub const MAX_TEXT_LEN: usize = u16::MAX as usize;

/// One row being built or read, bound to a schema
#[derive(Debug, Clone)]
pub struct Record<'a> {
    schema: &'a DataSchema,
    values: Vec<Option<Value>>,
}

impl<'a> Record<'a> {
    pub fn new(schema: &'a DataSchema) -> Self {
        Self {
            schema,
            values: vec![None; schema.len()],
        }
    }

    pub fn schema(&self) -> &DataSchema {
        self.schema
    }

    pub fn set_int(&mut self, index: usize, v: i64) -> Result<()> {
        self.set(index, Value::Int(v))
    }

    pub fn set_float(&mut self, index: usize, v: f64) -> Result<()> {
        self.set(index, Value::Float(v))
    }

    pub fn set_bool(&mut self, index: usize, v: bool) -> Result<()> {
        self.set(index, Value::Bool(v))
    }

    pub fn set_text(&mut self, index: usize, v: impl Into<String>) -> Result<()> {
        self.set(index, Value::Text(v.into()))
    }

    /// Stores a value after checking it against the column's declared type
    pub fn set(&mut self, index: usize, value: Value) -> Result<()> {
        let column = self
            .schema
            .columns
            .get(index)
            .ok_or(Error::Execution(format!("invalid column index: {}", index)))?;
        if column.data_type != value.datatype() {
            return Err(Error::TypeMismatch(format!(
                "column {} is {}, got {}",
                column.name,
                column.data_type,
                value.datatype()
            )));
        }
        self.values[index] = Some(value);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(|v| v.as_ref())
    }

    pub fn get_int(&self, index: usize) -> Result<i64> {
        match self.must_get(index)? {
            Value::Int(v) => Ok(*v),
            v => Err(self.type_error(DataType::Int, v)),
        }
    }

    pub fn get_float(&self, index: usize) -> Result<f64> {
        match self.must_get(index)? {
            Value::Float(v) => Ok(*v),
            v => Err(self.type_error(DataType::Float, v)),
        }
    }

    pub fn get_bool(&self, index: usize) -> Result<bool> {
        match self.must_get(index)? {
            Value::Bool(v) => Ok(*v),
            v => Err(self.type_error(DataType::Bool, v)),
        }
    }

    pub fn get_text(&self, index: usize) -> Result<&str> {
        match self.must_get(index)? {
            Value::Text(v) => Ok(v),
            v => Err(self.type_error(DataType::Text, v)),
        }
    }

    /// Serializes every slot in schema order
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        for (index, value) in self.values.iter().enumerate() {
            match value {
                Some(Value::Int(v)) => buf.put_i64_le(*v),
                Some(Value::Float(v)) => buf.put_f64_le(*v),
                Some(Value::Bool(v)) => buf.put_u8(*v as u8),
                Some(Value::Text(v)) => {
                    if v.len() > MAX_TEXT_LEN {
                        return Err(Error::Execution(format!(
                            "text value of {} bytes exceeds the {} byte limit",
                            v.len(),
                            MAX_TEXT_LEN
                        )));
                    }
                    buf.put_u16_le(v.len() as u16);
                    buf.put_slice(v.as_bytes());
                }
                None => {
                    return Err(Error::Execution(format!(
                        "column {} has no value",
                        self.schema.columns[index].name
                    )));
                }
            }
        }
        Ok(buf)
    }

    /// Reads every slot in schema order, overwriting the current values
    pub fn decode(&mut self, data: &[u8]) -> Result<()> {
        let mut buf = data;
        for (index, column) in self.schema.columns.iter().enumerate() {
            let value = match column.data_type {
                DataType::Int => Value::Int(buf.try_get_i64_le()?),
                DataType::Float => Value::Float(buf.try_get_f64_le()?),
                DataType::Bool => Value::Bool(buf.try_get_u8()? != 0),
                DataType::Text => {
                    let len = buf.try_get_u16_le()? as usize;
                    if buf.remaining() < len {
                        return Err(Error::Execution(format!(
                            "record read error: text of {} bytes, {} remaining",
                            len,
                            buf.remaining()
                        )));
                    }
                    let text = String::from_utf8(buf[..len].to_vec())?;
                    buf.advance(len);
                    Value::Text(text)
                }
            };
            self.values[index] = Some(value);
        }
        Ok(())
    }

    /// Converts a fully populated record into a result row
    pub fn into_row(self) -> Result<DataRow> {
        let schema = self.schema;
        self.values
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                v.ok_or(Error::Execution(format!(
                    "column {} has no value",
                    schema.columns[i].name
                )))
            })
            .collect::<Result<Vec<_>>>()
            .map(DataRow::new)
    }

    fn must_get(&self, index: usize) -> Result<&Value> {
        match self.values.get(index) {
            Some(Some(v)) => Ok(v),
            Some(None) => Err(Error::Execution(format!(
                "column {} has no value",
                self.schema.columns[index].name
            ))),
            None => Err(Error::Execution(format!("invalid column index: {}", index))),
        }
    }

    fn type_error(&self, expected: DataType, got: &Value) -> Error {
        Error::TypeMismatch(format!("expected {}, got {}", expected, got.datatype()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Record, MAX_TEXT_LEN};
    use crate::{
        error::{Error, Result},
        sql::types::{DataColumn, DataSchema, DataType, Value},
    };

    fn schema(types: &[DataType]) -> DataSchema {
        DataSchema::new(
            types
                .iter()
                .enumerate()
                .map(|(i, t)| DataColumn::new(format!("c{}", i), *t))
                .collect(),
        )
    }

    #[test]
    fn test_record_int_text() -> Result<()> {
        let schema = schema(&[DataType::Int, DataType::Text]);

        let mut record = Record::new(&schema);
        record.set_int(0, 42)?;
        record.set_text(1, "hi")?;
        let encoded = record.encode()?;
        assert_eq!(encoded, vec![42, 0, 0, 0, 0, 0, 0, 0, 2, 0, b'h', b'i']);

        let mut decoded = Record::new(&schema);
        decoded.decode(&encoded)?;
        assert_eq!(decoded.get_int(0)?, 42);
        assert_eq!(decoded.get_text(1)?, "hi");

        // zero-length text is just the two length bytes
        let mut record = Record::new(&schema);
        record.set_int(0, 42)?;
        record.set_text(1, "")?;
        let encoded = record.encode()?;
        assert_eq!(encoded.len(), 10);
        let mut decoded = Record::new(&schema);
        decoded.decode(&encoded)?;
        assert_eq!(decoded.get_text(1)?, "");
        Ok(())
    }

    #[test]
    fn test_record_all_types() -> Result<()> {
        let schema = schema(&[DataType::Int, DataType::Float, DataType::Bool, DataType::Text]);
        let mut record = Record::new(&schema);
        record.set_int(0, -7)?;
        record.set_float(1, 2.71828)?;
        record.set_bool(2, true)?;
        record.set_text(3, "test string")?;

        let mut decoded = Record::new(&schema);
        decoded.decode(&record.encode()?)?;
        assert_eq!(
            decoded.into_row()?.values,
            vec![
                Value::Int(-7),
                Value::Float(2.71828),
                Value::Bool(true),
                Value::Text("test string".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_record_type_mismatch() {
        let schema = schema(&[DataType::Int]);
        let mut record = Record::new(&schema);
        assert!(matches!(record.set_text(0, "x"), Err(Error::TypeMismatch(_))));
        assert!(matches!(record.set_float(0, 1.0), Err(Error::TypeMismatch(_))));
        assert!(record.set_int(1, 1).is_err());
        assert_eq!(record.get(0), None);
    }

    #[test]
    fn test_record_unset_slot() {
        let schema = schema(&[DataType::Int, DataType::Bool]);
        let mut record = Record::new(&schema);
        record.set_int(0, 1).unwrap();
        assert!(record.encode().is_err());
        assert!(record.get_bool(1).is_err());
    }

    #[test]
    fn test_record_text_limit() -> Result<()> {
        let schema = schema(&[DataType::Text]);
        let mut record = Record::new(&schema);
        record.set_text(0, "a".repeat(MAX_TEXT_LEN))?;
        assert_eq!(record.encode()?.len(), MAX_TEXT_LEN + 2);

        record.set_text(0, "a".repeat(MAX_TEXT_LEN + 1))?;
        assert!(record.encode().is_err());
        Ok(())
    }

    #[test]
    fn test_record_decode_with_wrong_schema() -> Result<()> {
        let written = schema(&[DataType::Int, DataType::Text]);
        let mut record = Record::new(&written);
        record.set_int(0, 258)?;
        record.set_text(1, "hi")?;
        let encoded = record.encode()?;

        // The same bytes read as TEXT: length prefix 258 over 10 bytes of input.
        let text_first = schema(&[DataType::Text]);
        let mut decoded = Record::new(&text_first);
        assert!(matches!(decoded.decode(&encoded), Err(Error::Execution(_))));

        // Read as two BOOLs: silently succeeds with whatever the bytes say.
        let bools = schema(&[DataType::Bool, DataType::Bool]);
        let mut decoded = Record::new(&bools);
        decoded.decode(&encoded)?;
        assert_eq!(decoded.get_bool(0)?, true);
        assert_eq!(decoded.get_bool(1)?, true);

        // Too short for the schema is a read error.
        let ints = schema(&[DataType::Int, DataType::Int]);
        let mut decoded = Record::new(&ints);
        assert!(decoded.decode(&encoded).is_err());
        Ok(())
    }
}
