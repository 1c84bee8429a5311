use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;
use crate::parser;

/// Side of a breakend on which the adjoining sequence is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Left,
    Right,
}

/// A decoded ALT allele.
///
/// For breakends, `orientation` is `Right` when the anchor sequence precedes
/// the join (`t[p[`, `t]p]`, `t.`) and `Left` when it follows it (`]p]t`,
/// `[p[t`, `.t`). `mate_orientation` is `Right` for `[` (the mate sequence
/// continues to the right of `p`) and `Left` for `]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AltRecord {
    Substitution {
        sequence: String,
    },
    Sv {
        sv_type: String,
    },
    SingleBreakend {
        sequence: String,
        orientation: Orientation,
    },
    Breakend {
        sequence: String,
        mate_chrom: String,
        mate_pos: u32,
        mate_orientation: Orientation,
        orientation: Orientation,
    },
}

impl AltRecord {
    pub fn is_structural(&self) -> bool {
        !matches!(self, AltRecord::Substitution { .. })
    }

    /// The anchoring or replacement sequence, if any.
    pub fn sequence(&self) -> Option<&str> {
        match self {
            AltRecord::Substitution { sequence }
            | AltRecord::SingleBreakend { sequence, .. }
            | AltRecord::Breakend { sequence, .. } => Some(sequence),
            AltRecord::Sv { .. } => None,
        }
    }
}

impl FromStr for AltRecord {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parser::alt_allele(s)
    }
}

impl fmt::Display for AltRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AltRecord::Substitution { sequence } => f.write_str(sequence),
            AltRecord::Sv { sv_type } => write!(f, "<{}>", sv_type),
            AltRecord::SingleBreakend {
                sequence,
                orientation: Orientation::Right,
            } => write!(f, "{}.", sequence),
            AltRecord::SingleBreakend {
                sequence,
                orientation: Orientation::Left,
            } => write!(f, ".{}", sequence),
            AltRecord::Breakend {
                sequence,
                mate_chrom,
                mate_pos,
                mate_orientation,
                orientation,
            } => {
                let bracket = match mate_orientation {
                    Orientation::Right => '[',
                    Orientation::Left => ']',
                };
                let mate = format!("{b}{}:{}{b}", mate_chrom, mate_pos, b = bracket);
                match orientation {
                    Orientation::Right => write!(f, "{}{}", sequence, mate),
                    Orientation::Left => write!(f, "{}{}", mate, sequence),
                }
            }
        }
    }
}
