use std::fmt;

use itertools::Itertools;

use crate::decode::{DecodeOptions, InfoFields};
use crate::error::{DecodeError, Result};
use crate::parser::{self, RawRecord};
use crate::record::{AltRecord, Annotate, Genotype, GenotypeCall, GenotypeType, Record};
use crate::types::{Header, SharedHeader, Value, MISSING};

const PASS: &str = "PASS";

/// One data line: the fixed columns, decoded ALT alleles and one call per
/// header sample, in header order.
#[derive(Debug, Clone)]
pub struct SiteRecord {
    chrom: String,
    pos: u32,
    id: Option<String>,
    ref_allele: String,
    alt: Vec<AltRecord>,
    qual: Option<f32>,
    filters: Vec<String>,
    info: InfoFields,
    format: Vec<String>,
    calls: Vec<GenotypeCall>,
    header: SharedHeader,
}

impl SiteRecord {
    /// Decode the columns of one line against `header`.
    ///
    /// Fails if an ALT allele is not recognized, a sample column has more
    /// fields than FORMAT declares, or the number of sample columns differs
    /// from the header's sample count.
    pub fn assemble(
        raw: RawRecord<'_>,
        header: &SharedHeader,
        options: &DecodeOptions,
    ) -> Result<Self> {
        let (chrom, pos) = (raw.chrom, raw.pos);
        let at_site = |e: DecodeError| e.at_site(chrom, pos);

        let alt = parser::alt_alleles(raw.alt).map_err(at_site)?;
        let qual: Option<f32> = match raw.qual {
            MISSING => None,
            q => Some(q.parse().map_err(|_| {
                at_site(DecodeError::MalformedRecord(format!("invalid QUAL {:?}", q)))
            })?),
        };
        let filters = match raw.filter {
            MISSING => vec![],
            f => f.split(';').map(str::to_owned).collect(),
        };
        let info = options
            .decode_info(raw.info, header.info_types())
            .map_err(at_site)?;
        let format: Vec<String> = raw
            .format
            .map(|f| f.split(':').map(str::to_owned).collect())
            .unwrap_or_default();

        let samples = header.samples();
        if raw.samples.len() != samples.len() {
            return Err(at_site(DecodeError::SampleCountMismatch {
                expected: samples.len(),
                found: raw.samples.len(),
            }));
        }
        let calls = samples
            .iter()
            .zip(&raw.samples)
            .enumerate()
            .map(|(i, (sample, token))| {
                options
                    .decode_sample(sample, token, format.as_slice(), header.format_types())
                    .map(|fields| GenotypeCall::new(i, sample.clone(), fields))
            })
            .collect::<Result<Vec<_>>>()
            .map_err(at_site)?;
        log::debug!("decoded {}:{} with {} calls", chrom, pos, calls.len());

        Ok(SiteRecord {
            chrom: chrom.to_owned(),
            pos,
            id: match raw.id {
                MISSING => None,
                id => Some(id.to_owned()),
            },
            ref_allele: raw.ref_allele.to_owned(),
            alt,
            qual,
            filters,
            info,
            format,
            calls,
            header: header.clone(),
        })
    }

    pub fn from_line(line: &str, header: &SharedHeader, options: &DecodeOptions) -> Result<Self> {
        Self::assemble(RawRecord::parse(line)?, header, options)
    }

    pub fn header(&self) -> &Header {
        self.header.as_ref()
    }

    /// The FORMAT keys of this site, in column order.
    pub fn format_keys(&self) -> &[String] {
        &self.format
    }

    pub fn info_fields(&self) -> &InfoFields {
        &self.info
    }

    /// REF followed by the ALT alleles, as text.
    pub fn alleles(&self) -> Vec<String> {
        std::iter::once(self.ref_allele.clone())
            .chain(self.alt.iter().map(ToString::to_string))
            .collect()
    }

    /// The call of the sample called `name`.
    pub fn genotype(&self, name: &str) -> Option<&GenotypeCall> {
        self.header
            .sample_index()
            .get(name)
            .and_then(|&i| self.calls.get(i))
    }

    /// Append a FORMAT key. Existing calls have no value for it.
    pub fn add_format(&mut self, key: &str) {
        if !self.format.iter().any(|k| k == key) {
            self.format.push(key.to_owned());
        }
    }

    fn calls_of_type(&self, gt_type: Option<GenotypeType>) -> Vec<&GenotypeCall> {
        self.calls
            .iter()
            .filter(|c| c.gt_type() == gt_type)
            .collect()
    }

    pub fn hom_refs(&self) -> Vec<&GenotypeCall> {
        self.calls_of_type(Some(GenotypeType::HomRef))
    }

    pub fn hom_alts(&self) -> Vec<&GenotypeCall> {
        self.calls_of_type(Some(GenotypeType::HomAlt))
    }

    pub fn hets(&self) -> Vec<&GenotypeCall> {
        self.calls_of_type(Some(GenotypeType::Het))
    }

    pub fn unknowns(&self) -> Vec<&GenotypeCall> {
        self.calls_of_type(None)
    }
}

impl Record for SiteRecord {
    /// Returns the ID of this record, `None` for `.`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_vcf::Record;
    /// use rust_vcf::VcfRecords;
    ///
    /// let mut records = VcfRecords::from_path("resources/example.vcf").unwrap();
    /// let record = records.next().unwrap().unwrap();
    /// assert_eq!(record.id(), Some("rs6054257"));
    /// let record = records.next().unwrap().unwrap();
    /// assert_eq!(record.id(), None);
    /// ```
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the target sequence identifier of this record, i.e. CHROM.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_vcf::Record;
    /// use rust_vcf::VcfRecords;
    ///
    /// let records = VcfRecords::from_path("resources/example.vcf").unwrap();
    /// for record in records {
    ///     assert_eq!(record.unwrap().chrom(), "20")
    /// }
    /// ```
    fn chrom(&self) -> &str {
        &self.chrom
    }

    /// Returns the position of this record, i.e. POS, 1-based as written.
    fn pos(&self) -> u32 {
        self.pos
    }

    fn ref_allele(&self) -> &str {
        &self.ref_allele
    }

    /// Returns the decoded alternative alleles of this record, i.e. ALT.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_vcf::Record;
    /// use rust_vcf::VcfRecords;
    /// use rust_vcf::record::AltRecord;
    ///
    /// let mut records = VcfRecords::from_path("resources/example.vcf").unwrap();
    /// let record = records.next().unwrap().unwrap();
    /// assert_eq!(
    ///     record.alt_alleles(),
    ///     [AltRecord::Substitution { sequence: "A".into() }]
    /// );
    /// ```
    fn alt_alleles(&self) -> &[AltRecord] {
        &self.alt
    }

    fn qual(&self) -> Option<f32> {
        self.qual
    }

    /// Returns the list of filters for this record, empty for `.`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_vcf::Record;
    /// use rust_vcf::VcfRecords;
    ///
    /// let mut records = VcfRecords::from_path("resources/example.vcf").unwrap();
    /// assert_eq!(records.next().unwrap().unwrap().filters(), ["PASS"]);
    /// assert_eq!(records.next().unwrap().unwrap().filters(), ["q10"]);
    /// ```
    fn filters(&self) -> Vec<&str> {
        self.filters.iter().map(String::as_str).collect()
    }

    /// For a given INFO tag, return its contents.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_vcf::Record;
    /// use rust_vcf::VcfRecords;
    ///
    /// let mut records = VcfRecords::from_path("resources/example.vcf").unwrap();
    /// let record = records.next().unwrap().unwrap();
    /// assert_eq!(record.info("NS").and_then(|v| v.integer()), Some(3));
    /// assert!(record.has_flag("DB"));
    /// ```
    fn info(&self, tag: &str) -> Option<&Value> {
        self.info.get(tag)
    }

    /// For a given FORMAT tag, return its value for every sample.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_vcf::Record;
    /// use rust_vcf::VcfRecords;
    ///
    /// let mut records = VcfRecords::from_path("resources/example.vcf").unwrap();
    /// let record = records.next().unwrap().unwrap();
    /// let depths = record
    ///     .format("DP")
    ///     .unwrap()
    ///     .iter()
    ///     .map(|v| v.integer())
    ///     .collect::<Vec<_>>();
    /// assert_eq!(depths, [Some(1), Some(8), Some(5)]);
    /// ```
    fn format(&self, tag: &str) -> Option<Vec<&Value>> {
        if !self.format.iter().any(|k| k == tag) {
            return None;
        }
        Some(self.calls.iter().map(|c| c.value(tag)).collect())
    }

    fn calls(&self) -> &[GenotypeCall] {
        &self.calls
    }

    fn genotypes(&self) -> Vec<Option<Genotype>> {
        self.calls.iter().map(GenotypeCall::genotype).collect()
    }

    fn has_flag(&self, tag: &str) -> bool {
        matches!(self.info.get(tag), Some(Value::Flag))
    }
}

impl Annotate for SiteRecord {
    fn add_filter(&mut self, filter: &str) {
        if self.filters.iter().all(|f| f == PASS) {
            self.filters.clear();
        }
        self.filters.push(filter.to_owned());
    }

    fn add_info(&mut self, key: &str, value: Value) {
        self.info.insert(key.to_owned(), value);
    }

    fn remove_info(&mut self, key: &str) -> Option<Value> {
        self.info.shift_remove(key)
    }
}

impl fmt::Display for SiteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Record(CHROM={}, POS={}, REF={}, ALT=[{}])",
            self.chrom,
            self.pos,
            self.ref_allele,
            self.alt.iter().join(", ")
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::{FieldType, Number, Scalar, ValueType};
    use pretty_assertions::assert_eq;

    fn header(samples: &[&str]) -> SharedHeader {
        let mut header = Header::default();
        for (key, kind, number) in &[
            ("GT", ValueType::String, Number::Count(1)),
            ("AD", ValueType::Integer, Number::Unknown),
            ("DP", ValueType::Integer, Number::Count(1)),
            ("GQ", ValueType::Integer, Number::Count(1)),
        ] {
            header
                .format_types
                .declare(*key, FieldType::new(*kind, *number));
        }
        header.set_samples(samples.iter().map(|s| s.to_string()).collect());
        SharedHeader::new(header)
    }

    fn line(columns: &[&str]) -> String {
        columns.join("\t")
    }

    #[test]
    fn test_end_to_end() {
        let header = header(&["S1", "S2"]);
        let line = line(&[
            "1", "100", ".", "A", "G", "50", "PASS", ".", "GT:AD:DP", "0/1:10,5:15", "./.:.:.",
        ]);
        let site = SiteRecord::from_line(&line, &header, &DecodeOptions::default()).unwrap();
        assert_eq!(site.calls().len(), 2);

        let first = site.genotype("S1").unwrap();
        assert_eq!(first.value("GT"), &Value::Scalar(Scalar::String("0/1".into())));
        assert_eq!(
            first.value("AD"),
            &Value::Sequence(vec![Some(Scalar::Integer(10)), Some(Scalar::Integer(5))])
        );
        assert_eq!(first.value("DP").integer(), Some(15));

        let second = site.genotype("S2").unwrap();
        for key in &["GT", "AD", "DP"] {
            assert_eq!(second.get(key), Some(&Value::Missing));
        }
        assert_eq!(second.sample_index(), 1);
        assert!(!second.is_called());
    }

    #[test]
    fn test_sample_count_mismatch() {
        let header = header(&["S1", "S2"]);
        let line = line(&["1", "100", ".", "A", "G", "50", "PASS", ".", "GT", "0/1"]);
        let err = SiteRecord::from_line(&line, &header, &DecodeOptions::default()).unwrap_err();
        match err {
            DecodeError::AtSite { chrom, pos, source } => {
                assert_eq!((chrom.as_str(), pos), ("1", 100));
                assert!(matches!(
                    *source,
                    DecodeError::SampleCountMismatch {
                        expected: 2,
                        found: 1
                    }
                ));
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn test_structural_failures_carry_site() {
        let header = header(&["S1"]);
        let oversupplied = line(&["2", "7", ".", "A", "G", ".", ".", ".", "GT:DP", "0/1:3:4"]);
        let err = SiteRecord::from_line(&oversupplied, &header, &DecodeOptions::default())
            .unwrap_err();
        assert!(err.to_string().starts_with("2:7: sample S1"));
        assert!(matches!(
            err.kind(),
            DecodeError::MalformedSampleToken { .. }
        ));

        let bad_alt = line(&["2", "7", ".", "A", "G,X", ".", ".", ".", "GT", "0/1"]);
        let err = SiteRecord::from_line(&bad_alt, &header, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err.kind(), DecodeError::UnrecognizedAltToken(t) if t == "X"));
    }

    #[test]
    fn test_strict_coercion_fails_record() {
        let header = header(&["S1", "S2"]);
        let line = line(&["1", "5", ".", "A", "G", ".", ".", ".", "GT:DP", "0/1:3", "0/1:x"]);
        let isolated = SiteRecord::from_line(&line, &header, &DecodeOptions::default()).unwrap();
        assert_eq!(isolated.calls()[1].value("DP"), &Value::Invalid("x".into()));
        assert_eq!(isolated.calls()[0].value("DP").integer(), Some(3));

        let err = SiteRecord::from_line(&line, &header, &DecodeOptions::strict()).unwrap_err();
        assert_eq!(err.sample(), Some("S2"));
        assert_eq!(
            err.to_string(),
            "1:5: sample S2: DP: cannot parse \"x\" as Integer"
        );
        assert!(matches!(
            err.kind(),
            DecodeError::FieldCoercion { raw, .. } if raw == "x"
        ));
    }

    #[test]
    fn test_empty_sample_column_is_not_called() {
        let header = header(&["S1", "S2"]);
        let line = line(&["1", "5", ".", "A", "G", ".", ".", ".", "GT:DP", "0/1:3", ""]);
        let site = SiteRecord::from_line(&line, &header, &DecodeOptions::default()).unwrap();
        let call = site.genotype("S2").unwrap();
        assert!(!call.is_called());
        assert_eq!(call.gt_type(), None);
        assert_eq!(site.unknowns().len(), 1);
    }

    #[test]
    fn test_structural_alleles() {
        let header = header(&[]);
        let line = line(&[
            "2",
            "321681",
            "bnd_W",
            "G",
            "G]17:198982],<DEL>,G.",
            "6",
            "PASS",
            "SVTYPE=BND",
        ]);
        let site = SiteRecord::from_line(&line, &header, &DecodeOptions::default()).unwrap();
        assert_eq!(site.alt_alleles().len(), 3);
        assert!(site.alt_alleles().iter().all(AltRecord::is_structural));
        assert_eq!(site.alleles()[1], "G]17:198982]");
        assert!(site.calls().is_empty());
        assert_eq!(site.format("GT"), None);
    }

    #[test]
    fn test_annotate() {
        let header = header(&["S1"]);
        let line = line(&["1", "5", ".", "C", ".", ".", "PASS", "DP=4", "GT", "0/0"]);
        let mut site = SiteRecord::from_line(&line, &header, &DecodeOptions::default()).unwrap();
        assert!(site.alt_alleles().is_empty());
        site.add_filter("q10");
        site.add_filter("s50");
        assert_eq!(site.filters(), ["q10", "s50"]);
        site.add_info("SOMATIC", Value::Flag);
        assert!(site.has_flag("SOMATIC"));
        assert_eq!(site.remove_info("DP").and_then(|v| v.integer()), Some(4));
        assert_eq!(site.info_fields().keys().collect::<Vec<_>>(), ["SOMATIC"]);
    }
}
