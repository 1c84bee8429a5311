use std::time::Instant;

use anyhow::{Context, Result};
use itertools::Itertools;

use rust_vcf::filter::{apply_filters, SiteFilter, SiteQuality, VariantGenotypeQuality};
use rust_vcf::record::GenotypeType;
use rust_vcf::{Record, VcfRecords};

fn input_path<I: IntoIterator<Item = String>>(args: I) -> Result<String> {
    args.into_iter()
        .nth(1)
        .context("usage: rust-vcf <file.vcf[.gz]>")
}

fn main() -> Result<()> {
    env_logger::init();
    let path = input_path(std::env::args())?;

    let now = Instant::now();
    let filters: Vec<Box<dyn SiteFilter>> = vec![
        Box::new(SiteQuality::default()),
        Box::new(VariantGenotypeQuality::default()),
    ];
    let records = VcfRecords::from_path(&path)?;
    let mut sites = 0usize;
    let mut failed = Vec::new();
    let mut gt_types = Vec::new();
    for record in records {
        let mut record = record?;
        sites += 1;
        failed.extend(apply_filters(&mut record, &filters, false));
        gt_types.extend(record.calls().iter().map(|c| c.gt_type()));
    }
    log::info!("decoded {} sites in {:?}", sites, now.elapsed());

    let counts = gt_types.into_iter().counts();
    for (label, gt_type) in [
        ("hom_ref", Some(GenotypeType::HomRef)),
        ("het", Some(GenotypeType::Het)),
        ("hom_alt", Some(GenotypeType::HomAlt)),
        ("uncalled", None),
    ] {
        println!("{}\t{}", label, counts.get(&gt_type).copied().unwrap_or(0));
    }
    for (name, n) in failed.into_iter().counts().into_iter().sorted() {
        println!("filtered:{}\t{}", name, n);
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_input_path() {
        let args = vec!["rust-vcf".to_owned(), "calls.vcf.gz".to_owned()];
        assert_eq!(input_path(args).unwrap(), "calls.vcf.gz");
        let err = input_path(vec!["rust-vcf".to_owned()]).unwrap_err();
        assert!(err.to_string().starts_with("usage: rust-vcf"));
    }
}
