mod alt;
mod call;
mod site;

use crate::types::Value;
pub use alt::{AltRecord, Orientation};
pub use call::{Genotype, GenotypeAllele, GenotypeCall, GenotypeType};
pub use site::SiteRecord;

/// Read access to a decoded site.
pub trait Record {
    fn id(&self) -> Option<&str>;

    fn chrom(&self) -> &str;

    fn pos(&self) -> u32;

    fn ref_allele(&self) -> &str;

    fn alt_alleles(&self) -> &[AltRecord];

    fn qual(&self) -> Option<f32>;

    fn filters(&self) -> Vec<&str>;

    fn info(&self, tag: &str) -> Option<&Value>;

    /// Per-sample values of a FORMAT key, `None` if the site does not declare it.
    fn format(&self, tag: &str) -> Option<Vec<&Value>>;

    fn calls(&self) -> &[GenotypeCall];

    fn genotypes(&self) -> Vec<Option<Genotype>>;

    fn has_flag(&self, tag: &str) -> bool;
}

/// The mutations a filter or annotation step may apply to a site. Calls and
/// alleles stay read-only.
pub trait Annotate {
    /// Record a failed filter; replaces `PASS` or a missing FILTER.
    fn add_filter(&mut self, filter: &str);

    fn add_info(&mut self, key: &str, value: Value);

    fn remove_info(&mut self, key: &str) -> Option<Value>;
}
