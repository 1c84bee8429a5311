pub mod decode;
pub mod error;
pub mod filter;
pub(crate) mod parser;
pub mod reader;
pub mod record;
pub mod types;

pub use decode::{decode_sample, CoercionPolicy, DecodeOptions};
pub use error::DecodeError;
pub use parser::RawRecord;
pub use reader::VcfRecords;
pub use record::{Annotate, Record, SiteRecord};

#[cfg(test)]
mod test {

    use super::reader::VcfRecords;

    #[test]
    fn test_samples() {
        let records = VcfRecords::from_path("resources/example.vcf").unwrap();
        assert_eq!(records.header().samples(), &["NA00001", "NA00002", "NA00003"]);
    }
}
