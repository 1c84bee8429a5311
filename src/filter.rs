//! Site filters: each one inspects a decoded record and, when the record
//! fails, has its name appended to the record's FILTER column.

use crate::record::{Annotate, Record};
use crate::types::{Header, HeaderFilter, HeaderValue};

pub trait SiteFilter {
    fn name(&self) -> &str;

    fn short_name(&self) -> &str;

    fn description(&self) -> &str;

    fn threshold(&self) -> f32;

    /// The identifier written into FILTER, e.g. `sq30`.
    fn filter_name(&self) -> String {
        format!("{}{}", self.short_name(), self.threshold())
    }

    /// The offending value if `record` fails this filter.
    fn check(&self, record: &dyn Record) -> Option<f32>;
}

/// Filter sites whose QUAL is below a threshold.
#[derive(Debug, Clone)]
pub struct SiteQuality {
    threshold: f32,
}

impl SiteQuality {
    pub fn new(threshold: f32) -> Self {
        SiteQuality { threshold }
    }
}

impl Default for SiteQuality {
    fn default() -> Self {
        SiteQuality::new(30.0)
    }
}

impl SiteFilter for SiteQuality {
    fn name(&self) -> &str {
        "site_quality"
    }

    fn short_name(&self) -> &str {
        "sq"
    }

    fn description(&self) -> &str {
        "Filter sites by quality"
    }

    fn threshold(&self) -> f32 {
        self.threshold
    }

    fn check(&self, record: &dyn Record) -> Option<f32> {
        record.qual().filter(|&q| q < self.threshold)
    }
}

/// Demand a minimum GQ for at least one non-reference call.
#[derive(Debug, Clone)]
pub struct VariantGenotypeQuality {
    threshold: f32,
}

impl VariantGenotypeQuality {
    pub fn new(threshold: f32) -> Self {
        VariantGenotypeQuality { threshold }
    }
}

impl Default for VariantGenotypeQuality {
    fn default() -> Self {
        VariantGenotypeQuality::new(50.0)
    }
}

impl SiteFilter for VariantGenotypeQuality {
    fn name(&self) -> &str {
        "min_genotype_quality"
    }

    fn short_name(&self) -> &str {
        "mgq"
    }

    fn description(&self) -> &str {
        "Demand a minimum quality associated with a non reference call"
    }

    fn threshold(&self) -> f32 {
        self.threshold
    }

    fn check(&self, record: &dyn Record) -> Option<f32> {
        // sites without a variant call have nothing to judge
        let best = record
            .calls()
            .iter()
            .filter(|c| c.is_variant())
            .flat_map(|c| c.value("GQ").floats())
            .flatten()
            .fold(None, |best: Option<f32>, gq| {
                Some(best.map_or(gq, |b| b.max(gq)))
            })?;
        if best < self.threshold {
            Some(best)
        } else {
            None
        }
    }
}

/// The `##FILTER` declaration for the names `filter` writes into records.
pub fn declaration(filter: &dyn SiteFilter) -> HeaderFilter {
    HeaderFilter::new(filter.filter_name(), filter.description())
}

/// Declare every filter in `header`, so that output written with it covers
/// the names [`apply_filters`] adds.
pub fn declare_filters(header: &mut Header, filters: &[Box<dyn SiteFilter>]) {
    for filter in filters {
        header.push("FILTER".to_owned(), HeaderValue::Filter(declaration(&**filter)));
    }
}

/// Run `filters` over `record`, appending the name of each failed filter to
/// its FILTER column. Stops at the first failure when `short_circuit` is set.
/// Returns the names of the failed filters.
pub fn apply_filters<R: Record + Annotate>(
    record: &mut R,
    filters: &[Box<dyn SiteFilter>],
    short_circuit: bool,
) -> Vec<String> {
    let mut failed = Vec::new();
    for filter in filters {
        if let Some(value) = filter.check(&*record) {
            let name = filter.filter_name();
            log::debug!(
                "{}:{} failed {} ({})",
                record.chrom(),
                record.pos(),
                filter.name(),
                value
            );
            record.add_filter(&name);
            failed.push(name);
            if short_circuit {
                break;
            }
        }
    }
    failed
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decode::DecodeOptions;
    use crate::reader::VcfRecords;
    use crate::record::SiteRecord;

    fn records() -> Vec<SiteRecord> {
        VcfRecords::from_path("resources/example.vcf")
            .unwrap()
            .collect::<crate::error::Result<Vec<_>>>()
            .unwrap()
    }

    fn stock_filters() -> Vec<Box<dyn SiteFilter>> {
        vec![
            Box::new(SiteQuality::default()),
            Box::new(VariantGenotypeQuality::default()),
        ]
    }

    #[test]
    fn test_filter_names() {
        assert_eq!(SiteQuality::default().filter_name(), "sq30");
        assert_eq!(VariantGenotypeQuality::new(12.5).filter_name(), "mgq12.5");
    }

    #[test]
    fn test_declare_filters() {
        let reader = VcfRecords::from_path("resources/example.vcf").unwrap();
        let mut header = reader.header().clone();
        declare_filters(&mut header, &stock_filters());
        assert_eq!(header.filters().len(), 4);
        assert_eq!(
            header.filters()["sq30"].description(),
            "Filter sites by quality"
        );
        assert_eq!(header.filters()["mgq50"].id(), "mgq50");
        assert_eq!(header.filters()["q10"].description(), "Quality below 10");
    }

    #[test]
    fn test_site_quality() {
        let records = records();
        let filter = SiteQuality::default();
        assert_eq!(filter.check(&records[0]), Some(29.0));
        assert_eq!(filter.check(&records[2]), None);
    }

    #[test]
    fn test_variant_genotype_quality() {
        let records = records();
        let filter = VariantGenotypeQuality::default();
        // NA00002 (GQ 48) and NA00003 (GQ 43) carry the variant
        assert_eq!(filter.check(&records[0]), Some(48.0));
        // hom-ref only
        assert_eq!(filter.check(&records[3]), None);
        assert_eq!(VariantGenotypeQuality::new(40.0).check(&records[0]), None);
    }

    #[test]
    fn test_apply_filters() {
        let mut records = records();
        let failed = apply_filters(&mut records[0], &stock_filters(), false);
        assert_eq!(failed, ["sq30", "mgq50"]);
        assert_eq!(records[0].filters(), ["sq30", "mgq50"]);

        let failed = apply_filters(&mut records[1], &stock_filters(), true);
        assert_eq!(failed, ["sq30"]);
        assert_eq!(records[1].filters(), ["q10", "sq30"]);

        let mut passing = SiteRecord::from_line(
            "20\t1\t.\tA\tG\t99\tPASS\t.",
            &crate::types::SharedHeader::default(),
            &DecodeOptions::default(),
        )
        .unwrap();
        assert!(apply_filters(&mut passing, &stock_filters(), false).is_empty());
        assert_eq!(passing.filters(), ["PASS"]);
    }
}
