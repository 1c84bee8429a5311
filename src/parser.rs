use std::convert::TryFrom;

use nom::branch::alt;
use nom::bytes::complete::{escaped, is_not, tag, take_till1, take_while1};
use nom::character::complete::{char, digit1, none_of, one_of};
use nom::combinator::{all_consuming, map, map_res, opt, recognize, rest, value};
use nom::error::{Error, ErrorKind};
use nom::multi::{many0, separated_list0};
use nom::sequence::{delimited, pair, preceded, separated_pair, terminated};
use nom::IResult;

use crate::error::{DecodeError, Result};
use crate::record::{AltRecord, Genotype, GenotypeAllele, Orientation};
use crate::types::{
    HeaderContig, HeaderFilter, HeaderFormat, HeaderInfo, HeaderValue, Number, MISSING,
};

pub(crate) fn number(input: &str) -> IResult<&str, Number> {
    alt((
        map_res(recognize(pair(opt(char('-')), digit1)), |n: &str| {
            n.parse::<i64>().map(|n| {
                if n < 0 {
                    Number::Unknown
                } else {
                    Number::Count(n as usize)
                }
            })
        }),
        value(Number::AlternateAlleles, char('A')),
        value(Number::Alleles, char('R')),
        value(Number::Genotypes, char('G')),
        value(Number::Unknown, char('.')),
    ))(input)
}

fn string(input: &str) -> IResult<&str, &str> {
    delimited(
        tag("\""),
        map(
            opt(escaped(none_of("\\\""), '\\', alt((tag("\\"), tag("\""))))),
            |s| s.unwrap_or(""),
        ),
        tag("\""),
    )(input)
}

fn keys_and_values(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
    fn key_value(input: &str) -> IResult<&str, (&str, &str)> {
        separated_pair(is_not("<,=>"), tag("="), alt((string, is_not(">,"))))(input)
    }
    separated_list0(tag(","), key_value)(input)
}

fn structured(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
    delimited(tag("<"), keys_and_values, tag(">"))(input)
}

fn header_entry(input: &str) -> IResult<&str, (&str, &str)> {
    preceded(tag("##"), separated_pair(is_not("="), tag("="), rest))(input)
}

/// Parse one `##key=value` meta-information line.
pub(crate) fn header_line(line: &str) -> Result<(String, HeaderValue)> {
    let malformed = |reason: String| DecodeError::MalformedHeader {
        line: line.to_owned(),
        reason,
    };
    let (_, (key, value)) =
        header_entry(line).map_err(|_| malformed("expected ##key=value".into()))?;
    let fields = || {
        structured(value)
            .map(|(_, fields)| fields)
            .map_err(|_| malformed("expected <key=value,...>".into()))
    };
    let value = match key {
        "INFO" => HeaderValue::Info(HeaderInfo::try_from(fields()?).map_err(malformed)?),
        "FORMAT" => HeaderValue::Format(HeaderFormat::try_from(fields()?).map_err(malformed)?),
        "FILTER" => HeaderValue::Filter(HeaderFilter::try_from(fields()?).map_err(malformed)?),
        "contig" => HeaderValue::Contig(HeaderContig::try_from(fields()?).map_err(malformed)?),
        _ => HeaderValue::String(value.to_owned()),
    };
    Ok((key.to_owned(), value))
}

/// The tab-separated columns of one data line, undecoded.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord<'a> {
    pub chrom: &'a str,
    pub pos: u32,
    pub id: &'a str,
    pub ref_allele: &'a str,
    pub alt: &'a str,
    pub qual: &'a str,
    pub filter: &'a str,
    pub info: &'a str,
    pub format: Option<&'a str>,
    pub samples: Vec<&'a str>,
}

impl<'a> RawRecord<'a> {
    pub fn parse(line: &'a str) -> Result<Self> {
        raw_record(line)
    }
}

pub(crate) fn raw_record(line: &str) -> Result<RawRecord> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() < 8 {
        return Err(DecodeError::MalformedRecord(format!(
            "expected at least 8 tab-separated columns, found {}: {:?}",
            columns.len(),
            line
        )));
    }
    let pos = columns[1].parse().map_err(|_| {
        DecodeError::MalformedRecord(format!("{}: invalid POS {:?}", columns[0], columns[1]))
    })?;
    Ok(RawRecord {
        chrom: columns[0],
        pos,
        id: columns[2],
        ref_allele: columns[3],
        alt: columns[4],
        qual: columns[5],
        filter: columns[6],
        info: columns[7],
        format: columns.get(8).copied(),
        samples: columns.iter().skip(9).copied().collect(),
    })
}

fn is_base(c: char) -> bool {
    matches!(
        c.to_ascii_uppercase(),
        'A' | 'C' | 'G' | 'T' | 'N' | 'R' | 'Y' | 'S' | 'W' | 'K' | 'M' | 'B' | 'D' | 'H' | 'V'
    )
}

fn bases(input: &str) -> IResult<&str, &str> {
    take_while1(is_base)(input)
}

fn symbolic(input: &str) -> IResult<&str, AltRecord> {
    map(delimited(char('<'), is_not("<>"), char('>')), |sv_type: &str| {
        AltRecord::Sv {
            sv_type: sv_type.to_owned(),
        }
    })(input)
}

/// `[chrom:pos[` or `]chrom:pos]`; `[` means the joined mate sequence extends
/// to the right of `pos`, `]` to the left.
fn mate(input: &str) -> IResult<&str, (Orientation, &str, u32)> {
    let (remaining, open) = one_of("[]")(input)?;
    let (remaining, locus) = terminated(take_till1(|c: char| c == open), char(open))(remaining)?;
    let verify = || nom::Err::Error(Error::new(input, ErrorKind::Verify));
    let (chrom, pos) = locus.rsplit_once(':').ok_or_else(verify)?;
    let pos: u32 = pos.parse().map_err(|_| verify())?;
    if chrom.is_empty() {
        return Err(verify());
    }
    let orientation = if open == '[' {
        Orientation::Right
    } else {
        Orientation::Left
    };
    Ok((remaining, (orientation, chrom, pos)))
}

fn breakend(input: &str) -> IResult<&str, AltRecord> {
    let joined = |sequence: &str, orientation, (mate_orientation, chrom, pos): (_, &str, _)| {
        AltRecord::Breakend {
            sequence: sequence.to_owned(),
            mate_chrom: chrom.to_owned(),
            mate_pos: pos,
            mate_orientation,
            orientation,
        }
    };
    alt((
        map(pair(bases, mate), move |(sequence, mate)| {
            joined(sequence, Orientation::Right, mate)
        }),
        map(pair(mate, bases), move |(mate, sequence)| {
            joined(sequence, Orientation::Left, mate)
        }),
    ))(input)
}

fn single_breakend(input: &str) -> IResult<&str, AltRecord> {
    let single = |sequence: &str, orientation| AltRecord::SingleBreakend {
        sequence: sequence.to_owned(),
        orientation,
    };
    alt((
        map(terminated(bases, char('.')), move |s| {
            single(s, Orientation::Right)
        }),
        map(preceded(char('.'), bases), move |s| single(s, Orientation::Left)),
    ))(input)
}

fn substitution(input: &str) -> IResult<&str, AltRecord> {
    map(alt((tag("*"), bases)), |sequence: &str| {
        AltRecord::Substitution {
            sequence: sequence.to_owned(),
        }
    })(input)
}

/// Decode a single ALT allele.
pub(crate) fn alt_allele(token: &str) -> Result<AltRecord> {
    alt((
        all_consuming(symbolic),
        all_consuming(breakend),
        all_consuming(single_breakend),
        all_consuming(substitution),
    ))(token)
    .map(|(_, allele)| allele)
    .map_err(|_| DecodeError::UnrecognizedAltToken(token.to_owned()))
}

/// Decode the whole ALT column; `.` means no alternate allele.
pub(crate) fn alt_alleles(column: &str) -> Result<Vec<AltRecord>> {
    if column == MISSING {
        return Ok(vec![]);
    }
    column.split(',').map(alt_allele).collect()
}

fn allele_index(input: &str) -> IResult<&str, Option<i32>> {
    alt((
        value(None, char('.')),
        map_res(digit1, |d: &str| d.parse().map(Some)),
    ))(input)
}

fn genotype_alleles(input: &str) -> IResult<&str, Vec<GenotypeAllele>> {
    let (input, first) = allele_index(input)?;
    let (input, rest) = many0(pair(one_of("/|"), allele_index))(input)?;
    let mut alleles = Vec::with_capacity(rest.len() + 1);
    alleles.push(GenotypeAllele::new(first, false));
    alleles.extend(
        rest.into_iter()
            .map(|(separator, index)| GenotypeAllele::new(index, separator == '|')),
    );
    Ok((input, alleles))
}

/// Parse a GT value such as `0/1`, `1|0` or `.`.
pub(crate) fn genotype(input: &str) -> Option<Genotype> {
    all_consuming(genotype_alleles)(input)
        .ok()
        .map(|(_, alleles)| Genotype::new(alleles))
}
