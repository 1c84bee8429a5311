use std::fmt;

use getset::Getters;
use itertools::Itertools;

use crate::decode::CallFields;
use crate::parser;
use crate::record::{Record, SiteRecord};
use crate::types::{Sample, Value, MISSING, MISSING_DIPLOID_GENOTYPE, MISSING_VALUE};

pub(crate) const GENOTYPE_KEY: &str = "GT";

/// Phased or unphased alleles, represented as indices.
///
/// An allele is phased when the separator preceding it is `|`; the first
/// allele of a genotype is always unphased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenotypeAllele {
    Unphased(i32),
    Phased(i32),
    UnphasedMissing,
    PhasedMissing,
}

impl GenotypeAllele {
    pub(crate) fn new(index: Option<i32>, phased: bool) -> Self {
        match (index, phased) {
            (Some(i), false) => GenotypeAllele::Unphased(i),
            (Some(i), true) => GenotypeAllele::Phased(i),
            (None, false) => GenotypeAllele::UnphasedMissing,
            (None, true) => GenotypeAllele::PhasedMissing,
        }
    }

    /// Get the index into the list of alleles.
    pub fn index(self) -> Option<u32> {
        match self {
            GenotypeAllele::Unphased(i) | GenotypeAllele::Phased(i) => Some(i as u32),
            GenotypeAllele::UnphasedMissing | GenotypeAllele::PhasedMissing => None,
        }
    }

    pub fn is_phased(self) -> bool {
        matches!(
            self,
            GenotypeAllele::Phased(_) | GenotypeAllele::PhasedMissing
        )
    }
}

/// The alleles of a GT value, in written order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Genotype(Vec<GenotypeAllele>);

impl Genotype {
    pub(crate) fn new(alleles: Vec<GenotypeAllele>) -> Self {
        Genotype(alleles)
    }

    pub fn alleles(&self) -> &[GenotypeAllele] {
        &self.0
    }

    pub fn indices(&self) -> Vec<Option<u32>> {
        self.0.iter().map(|a| a.index()).collect()
    }

    fn called_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().filter_map(|a| a.index())
    }

    pub fn is_phased(&self) -> bool {
        self.0.iter().any(|a| a.is_phased())
    }

    /// At least two different alleles among the called positions.
    pub fn is_het(&self) -> bool {
        self.called_indices().unique().count() > 1
    }

    /// Some called allele is not the reference.
    pub fn is_variant(&self) -> bool {
        self.called_indices().any(|i| i != 0)
    }

    /// Render with the separators of the source text, mapping each index
    /// through `allele`.
    fn render_with<F: Fn(u32) -> Option<String>>(&self, allele: F) -> Option<String> {
        let mut out = String::new();
        for (i, a) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(if a.is_phased() { '|' } else { '/' });
            }
            match a.index() {
                Some(idx) => out.push_str(&allele(idx)?),
                None => out.push_str(MISSING),
            }
        }
        Some(out)
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .render_with(|i| Some(i.to_string()))
            .unwrap_or_default();
        f.write_str(&text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenotypeType {
    HomRef,
    Het,
    HomAlt,
}

/// The decoded FORMAT fields of one sample at one site.
///
/// A call does not hold its site; it knows its position within
/// [`SiteRecord::calls`], and operations needing the site take it as an
/// argument.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct GenotypeCall {
    sample_index: usize,
    #[getset(get = "pub")]
    sample: Sample,
    #[getset(get = "pub")]
    fields: CallFields,
}

impl GenotypeCall {
    pub(crate) fn new(sample_index: usize, sample: Sample, fields: CallFields) -> Self {
        GenotypeCall {
            sample_index,
            sample,
            fields,
        }
    }

    /// Position of this call in its site, equal to the sample's header index.
    pub fn sample_index(&self) -> usize {
        self.sample_index
    }

    /// The decoded value of `key`, or `None` if the sample omitted it.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Like [`get`](Self::get), but omitted fields read as `Value::Missing`.
    pub fn value(&self, key: &str) -> &Value {
        self.fields.get(key).unwrap_or(&MISSING_VALUE)
    }

    pub fn genotype(&self) -> Option<Genotype> {
        self.value(GENOTYPE_KEY)
            .string()
            .and_then(parser::genotype)
    }

    /// GT is present and parses as a genotype; `./.`, `.` and an empty
    /// column are not called.
    pub fn is_called(&self) -> bool {
        self.genotype().is_some()
    }

    pub fn is_het(&self) -> bool {
        self.genotype().map_or(false, |gt| gt.is_het())
    }

    pub fn is_variant(&self) -> bool {
        self.genotype().map_or(false, |gt| gt.is_variant())
    }

    pub fn is_phased(&self) -> bool {
        self.genotype().map_or(false, |gt| gt.is_phased())
    }

    /// Hom-ref, het or hom-alt; `None` for uncalled or unparsable genotypes.
    pub fn gt_type(&self) -> Option<GenotypeType> {
        let gt = self.genotype()?;
        if gt.called_indices().next().is_none() {
            return None;
        }
        Some(if gt.is_het() {
            GenotypeType::Het
        } else if gt.is_variant() {
            GenotypeType::HomAlt
        } else {
            GenotypeType::HomRef
        })
    }

    /// The genotype spelled with allele sequences of `site`, e.g. `A|G`.
    pub fn gt_bases(&self, site: &SiteRecord) -> Option<String> {
        let alleles = site.alleles();
        let bases = self
            .genotype()?
            .render_with(|i| alleles.get(i as usize).cloned());
        if bases.is_none() {
            log::warn!(
                "{}:{} {}: allele index not found in {:?}",
                site.chrom(),
                site.pos(),
                self.sample,
                alleles
            );
        }
        bases
    }

    /// The sample column text for this call.
    pub fn render(&self) -> String {
        self.fields
            .iter()
            .map(|(key, value)| match value {
                Value::Missing if key == GENOTYPE_KEY => MISSING_DIPLOID_GENOTYPE.to_owned(),
                v => v.to_string(),
            })
            .join(":")
    }
}

impl fmt::Display for GenotypeCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Call(sample={}, GT={})", self.sample, self.value(GENOTYPE_KEY))
    }
}
