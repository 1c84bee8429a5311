use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;
use std::iter::FromIterator;
use std::str::FromStr;

use getset::{CopyGetters, Getters};
use indexmap::IndexMap;
use itertools::Itertools;
use multimap::MultiMap;
use strum::{Display, EnumString};

use crate::parser;

pub(crate) const MISSING: &str = ".";
pub(crate) const MISSING_DIPLOID_GENOTYPE: &str = "./.";
pub(crate) static MISSING_VALUE: Value = Value::Missing;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, EnumString, Display)]
pub enum ValueType {
    Integer,
    #[strum(to_string = "Float", serialize = "Numeric")]
    Float,
    Flag,
    Character,
    String,
}

/// Declared cardinality of an INFO or FORMAT field (`Number=` in the header).
#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash)]
pub enum Number {
    Count(usize),
    /// One value per allele, reference included (`R`).
    Alleles,
    /// One value per alternate allele (`A`).
    AlternateAlleles,
    /// One value per possible genotype (`G`).
    Genotypes,
    Unknown,
}

impl Number {
    pub fn is_one(self) -> bool {
        self == Number::Count(1)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Count(n) => write!(f, "{}", n),
            Number::Alleles => f.write_str("R"),
            Number::AlternateAlleles => f.write_str("A"),
            Number::Genotypes => f.write_str("G"),
            Number::Unknown => f.write_str(MISSING),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct FieldType {
    kind: ValueType,
    number: Number,
}

impl FieldType {
    pub fn new(kind: ValueType, number: Number) -> Self {
        FieldType { kind, number }
    }
}

const RESERVED_FORMAT: &[(&str, ValueType, Number)] = &[
    ("GT", ValueType::String, Number::Count(1)),
    ("DP", ValueType::Integer, Number::Count(1)),
    ("FT", ValueType::String, Number::Count(1)),
    ("GL", ValueType::Float, Number::Genotypes),
    ("GQ", ValueType::Float, Number::Count(1)),
    ("HQ", ValueType::Float, Number::Count(2)),
];

const RESERVED_INFO: &[(&str, ValueType, Number)] = &[
    ("AA", ValueType::String, Number::Count(1)),
    ("AC", ValueType::Integer, Number::AlternateAlleles),
    ("AF", ValueType::Float, Number::AlternateAlleles),
    ("AN", ValueType::Integer, Number::Count(1)),
    ("BQ", ValueType::Float, Number::Count(1)),
    ("CIGAR", ValueType::String, Number::AlternateAlleles),
    ("DB", ValueType::Flag, Number::Count(0)),
    ("DP", ValueType::Integer, Number::Count(1)),
    ("END", ValueType::Integer, Number::Count(1)),
    ("H2", ValueType::Flag, Number::Count(0)),
    ("MQ", ValueType::Float, Number::Count(1)),
    ("MQ0", ValueType::Integer, Number::Count(1)),
    ("NS", ValueType::Integer, Number::Count(1)),
    ("SB", ValueType::String, Number::Count(1)),
    ("SOMATIC", ValueType::Flag, Number::Count(0)),
    ("VALIDATED", ValueType::Flag, Number::Count(0)),
];

/// Lookup from field key to its declared type and cardinality.
///
/// Keys declared in the header win; otherwise the keys reserved by the VCF
/// format are consulted. Built once per file and shared read-only by
/// every record decoded from it.
#[derive(Debug, Clone)]
pub struct FieldTypeTable {
    declared: IndexMap<String, FieldType>,
    reserved: &'static [(&'static str, ValueType, Number)],
}

impl FieldTypeTable {
    pub fn format() -> Self {
        FieldTypeTable {
            declared: IndexMap::new(),
            reserved: RESERVED_FORMAT,
        }
    }

    pub fn info() -> Self {
        FieldTypeTable {
            declared: IndexMap::new(),
            reserved: RESERVED_INFO,
        }
    }

    pub fn declare<K: Into<String>>(&mut self, key: K, field_type: FieldType) -> &mut Self {
        self.declared.insert(key.into(), field_type);
        self
    }

    pub fn get(&self, key: &str) -> Option<FieldType> {
        self.declared.get(key).copied().or_else(|| {
            self.reserved
                .iter()
                .find(|(id, _, _)| *id == key)
                .map(|&(_, kind, number)| FieldType::new(kind, number))
        })
    }

    /// Type of `key`, falling back to an unbounded String for unknown keys.
    pub fn resolve(&self, key: &str) -> FieldType {
        self.get(key).unwrap_or_else(|| {
            log::debug!("no type declared for {}, treating as String", key);
            FieldType::new(ValueType::String, Number::Unknown)
        })
    }
}

impl<K: Into<String>> FromIterator<(K, FieldType)> for FieldTypeTable {
    fn from_iter<I: IntoIterator<Item = (K, FieldType)>>(iter: I) -> Self {
        let mut table = FieldTypeTable::format();
        for (key, field_type) in iter {
            table.declare(key, field_type);
        }
        table
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Integer(i32),
    Float(f32),
    String(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

/// A decoded INFO or FORMAT value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    /// A valueless INFO key.
    Flag,
    Scalar(Scalar),
    /// Comma-separated values; `.` elements are `None`.
    Sequence(Vec<Option<Scalar>>),
    /// Raw text that could not be coerced to the declared type.
    Invalid(String),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn integer(&self) -> Option<i32> {
        match self {
            Value::Scalar(Scalar::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn float(&self) -> Option<f32> {
        match self {
            Value::Scalar(Scalar::Float(v)) => Some(*v),
            Value::Scalar(Scalar::Integer(i)) => Some(*i as f32),
            _ => None,
        }
    }

    pub fn string(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Integer elements of a scalar or sequence; missing elements are `None`.
    pub fn integers(&self) -> Vec<Option<i32>> {
        self.scalars()
            .into_iter()
            .map(|s| match s {
                Some(Scalar::Integer(i)) => Some(*i),
                _ => None,
            })
            .collect()
    }

    /// Float elements of a scalar or sequence; integers are widened.
    pub fn floats(&self) -> Vec<Option<f32>> {
        self.scalars()
            .into_iter()
            .map(|s| match s {
                Some(Scalar::Float(v)) => Some(*v),
                Some(Scalar::Integer(i)) => Some(*i as f32),
                _ => None,
            })
            .collect()
    }

    fn scalars(&self) -> Vec<Option<&Scalar>> {
        match self {
            Value::Scalar(s) => vec![Some(s)],
            Value::Sequence(values) => values.iter().map(Option::as_ref).collect(),
            Value::Missing | Value::Flag | Value::Invalid(_) => vec![],
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => f.write_str(MISSING),
            Value::Flag => Ok(()),
            Value::Scalar(s) => write!(f, "{}", s),
            Value::Sequence(values) => write!(
                f,
                "{}",
                values
                    .iter()
                    .map(|v| match v {
                        Some(s) => s.to_string(),
                        None => MISSING.to_owned(),
                    })
                    .join(",")
            ),
            Value::Invalid(raw) => f.write_str(raw),
        }
    }
}

#[cfg(not(feature = "sync"))]
pub type SharedHeader = std::rc::Rc<Header>;
#[cfg(feature = "sync")]
pub type SharedHeader = std::sync::Arc<Header>;

#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct Header {
    pub(crate) meta: MultiMap<String, HeaderValue>,
    pub(crate) infos: IndexMap<String, HeaderInfo>,
    pub(crate) formats: IndexMap<String, HeaderFormat>,
    pub(crate) filters: IndexMap<String, HeaderFilter>,
    pub(crate) contigs: Vec<HeaderContig>,
    pub(crate) samples: Vec<Sample>,
    pub(crate) sample_index: HashMap<Sample, usize>,
    pub(crate) format_types: FieldTypeTable,
    pub(crate) info_types: FieldTypeTable,
}

impl Default for Header {
    fn default() -> Self {
        Header {
            meta: MultiMap::new(),
            infos: IndexMap::new(),
            formats: IndexMap::new(),
            filters: IndexMap::new(),
            contigs: Vec::new(),
            samples: Vec::new(),
            sample_index: HashMap::new(),
            format_types: FieldTypeTable::format(),
            info_types: FieldTypeTable::info(),
        }
    }
}

impl Header {
    pub(crate) fn push(&mut self, key: String, value: HeaderValue) {
        match &value {
            HeaderValue::Info(info) => {
                self.info_types
                    .declare(info.id.clone(), FieldType::new(info.kind, info.number));
                self.infos.insert(info.id.clone(), info.clone());
            }
            HeaderValue::Format(format) => {
                self.format_types
                    .declare(format.id.clone(), FieldType::new(format.kind, format.number));
                self.formats.insert(format.id.clone(), format.clone());
            }
            HeaderValue::Filter(filter) => {
                self.filters.insert(filter.id.clone(), filter.clone());
            }
            HeaderValue::Contig(contig) => self.contigs.push(contig.clone()),
            HeaderValue::String(_) => {}
        }
        self.meta.insert(key, value);
    }

    pub(crate) fn set_samples(&mut self, samples: Vec<Sample>) {
        self.sample_index = samples
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        self.samples = samples;
    }

    /// Plain `##key=value` metadata, e.g. `fileformat` or `fileDate`.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.meta.get_vec(key)?.iter().find_map(|v| match v {
            HeaderValue::String(s) => Some(s.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub enum HeaderValue {
    String(String),
    Info(HeaderInfo),
    Filter(HeaderFilter),
    Format(HeaderFormat),
    Contig(HeaderContig),
}

pub type Sample = String;

type Fields<'a> = Vec<(&'a str, &'a str)>;

fn mandatory<'a>(h: &mut HashMap<&'a str, &'a str>, key: &str) -> Result<&'a str, String> {
    h.remove(key).ok_or_else(|| format!("{} is mandatory", key))
}

fn number_and_type<'a>(h: &mut HashMap<&'a str, &'a str>) -> Result<(Number, ValueType), String> {
    let number = mandatory(h, "Number")?;
    let (_, number) =
        parser::number(number).map_err(|_| format!("invalid Number {:?}", number))?;
    let kind = mandatory(h, "Type")?;
    let kind = ValueType::from_str(kind).map_err(|_| format!("invalid Type {:?}", kind))?;
    Ok((number, kind))
}

#[derive(Debug, Getters, CopyGetters, Clone)]
pub struct HeaderInfo {
    #[getset(get = "pub")]
    pub(crate) id: String,
    #[getset(get_copy = "pub")]
    number: Number,
    #[getset(get_copy = "pub")]
    kind: ValueType,
    #[getset(get = "pub")]
    description: String,
    // may be empty
    #[getset(get = "pub")]
    source: String,
    // may be empty
    #[getset(get = "pub")]
    version: String,
    #[getset(get = "pub")]
    additional: HashMap<String, String>,
}

impl<'a> TryFrom<Fields<'a>> for HeaderInfo {
    type Error = String;

    fn try_from(data: Fields<'a>) -> Result<Self, Self::Error> {
        let mut h: HashMap<_, _> = data.into_iter().collect();
        let (number, kind) = number_and_type(&mut h)?;
        Ok(HeaderInfo {
            id: mandatory(&mut h, "ID")?.into(),
            number,
            kind,
            description: mandatory(&mut h, "Description")?.into(),
            source: h.remove("Source").unwrap_or("").into(),
            version: h.remove("Version").unwrap_or("").into(),
            additional: h.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        })
    }
}

#[derive(Debug, Getters, CopyGetters, Clone)]
pub struct HeaderFormat {
    #[getset(get = "pub")]
    pub(crate) id: String,
    #[getset(get_copy = "pub")]
    number: Number,
    #[getset(get_copy = "pub")]
    kind: ValueType,
    #[getset(get = "pub")]
    description: String,
}

impl<'a> TryFrom<Fields<'a>> for HeaderFormat {
    type Error = String;

    fn try_from(data: Fields<'a>) -> Result<Self, Self::Error> {
        let mut h: HashMap<_, _> = data.into_iter().collect();
        let (number, kind) = number_and_type(&mut h)?;
        Ok(HeaderFormat {
            id: mandatory(&mut h, "ID")?.into(),
            number,
            kind,
            description: mandatory(&mut h, "Description")?.into(),
        })
    }
}

#[derive(Debug, Getters, CopyGetters, Clone)]
pub struct HeaderContig {
    #[getset(get = "pub")]
    pub(crate) id: String,
    #[getset(get_copy = "pub")]
    length: Option<usize>,
    #[getset(get = "pub")]
    additional: HashMap<String, String>,
}

impl<'a> TryFrom<Fields<'a>> for HeaderContig {
    type Error = String;

    fn try_from(data: Fields<'a>) -> Result<Self, Self::Error> {
        let mut h: HashMap<_, _> = data.into_iter().collect();
        Ok(HeaderContig {
            id: mandatory(&mut h, "ID")?.into(),
            length: h.remove("length").and_then(|s| s.parse().ok()),
            additional: h.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        })
    }
}

#[derive(Debug, Getters, Clone)]
#[getset(get = "pub")]
pub struct HeaderFilter {
    pub(crate) id: String,
    description: String,
}

impl HeaderFilter {
    pub fn new<I: Into<String>, D: Into<String>>(id: I, description: D) -> Self {
        HeaderFilter {
            id: id.into(),
            description: description.into(),
        }
    }
}

impl<'a> TryFrom<Fields<'a>> for HeaderFilter {
    type Error = String;

    fn try_from(data: Fields<'a>) -> Result<Self, Self::Error> {
        let mut h: HashMap<_, _> = data.into_iter().collect();
        Ok(HeaderFilter {
            id: mandatory(&mut h, "ID")?.into(),
            description: mandatory(&mut h, "Description")?.into(),
        })
    }
}
