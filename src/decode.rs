use getset::CopyGetters;
use indexmap::IndexMap;

use crate::error::{DecodeError, Result};
use crate::types::{
    FieldType, FieldTypeTable, Number, Scalar, Value, ValueType, MISSING,
    MISSING_DIPLOID_GENOTYPE,
};

/// Decoded per-sample fields in FORMAT order. Keys the sample token omitted
/// at its end have no entry.
pub type CallFields = IndexMap<String, Value>;

/// Decoded INFO column in the order the keys appear.
pub type InfoFields = IndexMap<String, Value>;

/// What to do when a value does not parse as its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionPolicy {
    /// Keep the raw text as `Value::Invalid` and continue with the next field.
    Isolate,
    /// Fail the whole record.
    Strict,
}

impl Default for CoercionPolicy {
    fn default() -> Self {
        CoercionPolicy::Isolate
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct DecodeOptions {
    coercion: CoercionPolicy,
}

impl DecodeOptions {
    pub fn strict() -> Self {
        DecodeOptions {
            coercion: CoercionPolicy::Strict,
        }
    }

    pub fn with_coercion(mut self, coercion: CoercionPolicy) -> Self {
        self.coercion = coercion;
        self
    }

    fn isolate(&self, value: Result<Value>, sample: &str, raw: &str) -> Result<Value> {
        match (value, self.coercion) {
            (Err(e @ DecodeError::FieldCoercion { .. }), CoercionPolicy::Isolate) => {
                log::warn!("{}: {}; keeping raw text", sample, e);
                Ok(Value::Invalid(raw.to_owned()))
            }
            (Err(e @ DecodeError::FieldCoercion { .. }), CoercionPolicy::Strict) => {
                Err(e.in_sample(sample))
            }
            (value, _) => value,
        }
    }

    /// Decode one colon-separated sample column against the site's FORMAT keys.
    ///
    /// The token may omit trailing fields but must not supply more fields
    /// than there are keys.
    pub fn decode_sample<K: AsRef<str>>(
        &self,
        sample: &str,
        token: &str,
        keys: &[K],
        types: &FieldTypeTable,
    ) -> Result<CallFields> {
        let pieces: Vec<&str> = token.split(':').collect();
        if pieces.len() > keys.len() {
            return Err(DecodeError::MalformedSampleToken {
                sample: sample.to_owned(),
                token: token.to_owned(),
                found: pieces.len(),
                expected: keys.len(),
            });
        }
        keys.iter()
            .zip(pieces)
            .map(|(key, raw)| {
                let key = key.as_ref();
                let value = decode_value(key, raw, types.resolve(key));
                Ok((key.to_owned(), self.isolate(value, sample, raw)?))
            })
            .collect()
    }

    /// Decode a `;`-separated INFO column. Keys without `=` become flags.
    pub fn decode_info(&self, column: &str, types: &FieldTypeTable) -> Result<InfoFields> {
        if column == MISSING || column.is_empty() {
            return Ok(InfoFields::new());
        }
        column
            .split(';')
            .map(|entry| match entry.split_once('=') {
                None => Ok((entry.to_owned(), Value::Flag)),
                Some((key, raw)) => {
                    let field_type = match types.get(key) {
                        Some(t) if t.kind() != ValueType::Flag => t,
                        _ => FieldType::new(ValueType::String, Number::Unknown),
                    };
                    let value = decode_value(key, raw, field_type);
                    Ok((key.to_owned(), self.isolate(value, "INFO", raw)?))
                }
            })
            .collect()
    }
}

/// [`DecodeOptions::decode_sample`] with default options.
pub fn decode_sample<K: AsRef<str>>(
    sample: &str,
    token: &str,
    keys: &[K],
    types: &FieldTypeTable,
) -> Result<CallFields> {
    DecodeOptions::default().decode_sample(sample, token, keys, types)
}

fn scalar(key: &str, raw: &str, kind: ValueType) -> Result<Scalar> {
    let coercion_error = || DecodeError::FieldCoercion {
        key: key.to_owned(),
        raw: raw.to_owned(),
        expected: kind,
    };
    match kind {
        ValueType::Integer => raw.parse().map(Scalar::Integer).map_err(|_| coercion_error()),
        ValueType::Float => raw.parse().map(Scalar::Float).map_err(|_| coercion_error()),
        ValueType::Flag | ValueType::Character | ValueType::String => {
            Ok(Scalar::String(raw.to_owned()))
        }
    }
}

/// Decode the text of a single field according to its declared type.
///
/// `.` and `./.` are missing values. A field declared with exactly one value,
/// or holding no comma, is a scalar, except that a Flag declared with any
/// other cardinality becomes a one-element sequence. Anything else is split
/// on `,` and each element coerced, with `.` elements becoming `None`.
pub fn decode_value(key: &str, raw: &str, field_type: FieldType) -> Result<Value> {
    if raw == MISSING || raw == MISSING_DIPLOID_GENOTYPE {
        return Ok(Value::Missing);
    }
    let kind = field_type.kind();
    if field_type.number().is_one() {
        return scalar(key, raw, kind).map(Value::Scalar);
    }
    if !raw.contains(',') {
        // a Flag keeps its declared multiplicity even for a single value
        return scalar(key, raw, kind).map(|s| match kind {
            ValueType::Flag => Value::Sequence(vec![Some(s)]),
            _ => Value::Scalar(s),
        });
    }
    raw.split(',')
        .map(|piece| {
            if piece == MISSING {
                Ok(None)
            } else {
                scalar(key, piece, kind).map(Some)
            }
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::Sequence)
}
