use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::decode::DecodeOptions;
use crate::error::{DecodeError, Result};
use crate::parser;
use crate::record::SiteRecord;
use crate::types::{Header, SharedHeader};

const SAMPLE_COLUMNS_START: usize = 9;

pub struct VcfRecords<R: BufRead> {
    header: SharedHeader,
    options: DecodeOptions,
    line_buf: String,
    inner: R,
}

impl<R: BufRead> VcfRecords<R> {
    pub fn header(&self) -> &Header {
        self.header.as_ref()
    }

    /// The header shared by every record this reader yields.
    pub fn shared_header(&self) -> &SharedHeader {
        &self.header
    }
}

impl VcfRecords<Box<dyn BufRead>> {
    /// Open a plain or gzip-compressed VCF file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let (reader, _format) = niffler::from_path(path)?;
        Ok(Self::new(Box::new(BufReader::new(reader)) as Box<dyn BufRead>)?)
    }
}

fn read_line<R: BufRead>(reader: &mut R, buf: &mut String) -> Result<bool> {
    buf.clear();
    if reader.read_line(buf)? == 0 {
        return Ok(false);
    }
    let trimmed = buf.trim_end_matches(&['\n', '\r'][..]).len();
    buf.truncate(trimmed);
    Ok(true)
}

impl<R: BufRead> VcfRecords<R> {
    pub fn new(reader: R) -> Result<Self> {
        Self::with_options(reader, DecodeOptions::default())
    }

    /// Read the header; records are decoded lazily while iterating.
    pub fn with_options(mut reader: R, options: DecodeOptions) -> Result<Self> {
        let mut header = Header::default();
        let mut line = String::new();
        loop {
            if !read_line(&mut reader, &mut line)? {
                return Err(DecodeError::MalformedHeader {
                    line: String::new(),
                    reason: "missing #CHROM line".into(),
                });
            }
            if line.starts_with("##") {
                let (key, value) = parser::header_line(&line)?;
                header.push(key, value);
            } else if line.starts_with("#CHROM") {
                let samples = line
                    .split('\t')
                    .skip(SAMPLE_COLUMNS_START)
                    .map(str::to_owned)
                    .collect();
                header.set_samples(samples);
                break;
            } else {
                return Err(DecodeError::MalformedHeader {
                    line: line.clone(),
                    reason: "expected ##key=value or #CHROM".into(),
                });
            }
        }
        log::debug!(
            "read header: {} INFO, {} FORMAT, {} FILTER, {} samples",
            header.infos().len(),
            header.formats().len(),
            header.filters().len(),
            header.samples().len()
        );

        Ok(Self {
            header: SharedHeader::new(header),
            options,
            line_buf: line,
            inner: reader,
        })
    }
}

impl<R: BufRead> Iterator for VcfRecords<R> {
    type Item = Result<SiteRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match read_line(&mut self.inner, &mut self.line_buf) {
                Ok(false) => return None,
                Ok(true) if self.line_buf.is_empty() => continue,
                Ok(true) => {
                    return Some(SiteRecord::from_line(
                        &self.line_buf,
                        &self.header,
                        &self.options,
                    ))
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::record::{GenotypeType, Record};
    use pretty_assertions::assert_eq;

    const PATH: &str = "resources/example.vcf";

    fn records() -> Vec<SiteRecord> {
        VcfRecords::from_path(PATH)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_header() {
        let reader = VcfRecords::from_path(PATH).unwrap();
        let header = reader.header();
        assert_eq!(header.samples(), &["NA00001", "NA00002", "NA00003"]);
        assert_eq!(header.metadata("fileDate"), Some("20090805"));
        assert_eq!(
            header.filters()["q10"].description(),
            "Quality below 10"
        );
        assert_eq!(header.infos()["AA"].description(), "Ancestral Allele");
        assert_eq!(header.formats().len(), 4);
    }

    #[test]
    fn test_calls() {
        let records = records();
        assert_eq!(records.len(), 5);
        for site in &records {
            assert_eq!(site.calls().len(), 3);
            let samples: Vec<_> = site.calls().iter().map(|c| c.sample().as_str()).collect();
            assert_eq!(samples, ["NA00001", "NA00002", "NA00003"]);
        }
        let call = records[1].genotype("NA00001").unwrap();
        assert_eq!(call.value("HQ").integers(), vec![Some(58), Some(50)]);
        assert_eq!(call.value("GQ").integer(), Some(49));
        assert_eq!(call.gt_bases(&records[1]).as_deref(), Some("T|T"));
    }

    #[test]
    fn test_gt_types() {
        let gt_types: Vec<Vec<_>> = records()
            .iter()
            .map(|site| site.calls().iter().map(|c| c.gt_type()).collect())
            .collect();
        use GenotypeType::*;
        assert_eq!(
            gt_types,
            vec![
                vec![Some(HomRef), Some(Het), Some(HomAlt)],
                vec![Some(HomRef), Some(Het), Some(HomRef)],
                vec![Some(Het), Some(Het), Some(HomAlt)],
                vec![Some(HomRef), Some(HomRef), Some(HomRef)],
                vec![None, Some(Het), Some(HomAlt)],
            ]
        );
    }

    #[test]
    fn test_phased_and_bases() {
        let records = records();
        let phases: Vec<bool> = records[0].calls().iter().map(|c| c.is_phased()).collect();
        assert_eq!(phases, [true, true, false]);
        let bases: Vec<_> = records[4]
            .calls()
            .iter()
            .map(|c| c.gt_bases(&records[4]))
            .collect();
        assert_eq!(
            bases,
            [None, Some("GTCT/GTACT".to_owned()), Some("G/G".to_owned())]
        );
        assert_eq!(records[4].unknowns().len(), 1);
        assert_eq!(records[2].hets().len(), 2);
    }

    #[test]
    fn test_missing_trailing_fields() {
        let records = records();
        let call = records[1].genotype("NA00003").unwrap();
        assert_eq!(call.get("HQ"), None);
        assert_eq!(call.render(), "0/0:41:3");
        assert_eq!(records[3].alt_alleles().len(), 0);
    }

    #[test]
    fn test_missing_chrom_line() {
        let input: &[u8] = b"##fileformat=VCFv4.0\n";
        assert!(matches!(
            VcfRecords::new(input),
            Err(DecodeError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn test_reads_from_memory() {
        let input: &[u8] = b"##fileformat=VCFv4.2\n\
            #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
            1\t10\t.\tA\t<INS>\t.\t.\tSVTYPE=INS\n\
            \n\
            1\t20\t.\tA\tA[2:300[\t.\t.\t.\n";
        let records = VcfRecords::new(input)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].info("SVTYPE").and_then(|v| v.string()), Some("INS"));
        assert_eq!(records[1].alleles(), ["A", "A[2:300["]);
    }
}
