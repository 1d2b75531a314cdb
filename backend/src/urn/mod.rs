//! # URN parsing
//!
//! A Unique Reference Number identifies a court case. It has four positional
//! segments:
//!
//! ```text
//! 06 / AA / 1234567 / 16
//! |    |    |         `- year, two digits
//! |    |    `----------- case sequence, seven digits
//! |    `---------------- court code, two letters
//! `--------------------- police region code, two digits
//! ```
//!
//! Users type URNs in every imaginable way, so parsing accepts any letter case
//! and any of `/ - _ .` or whitespace between segments, with spaces allowed
//! around a separator character. The segment structure
//! itself is mandatory: `06AA/1234567/16` is rejected even though its
//! characters would line up.
//!
//! A parsed [`Urn`] renders in three ways, see [`Urn::canonical`],
//! [`Urn::standardised`] and [`Urn::display`].

use common::model::matching::UrnForms;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[/\-_.]\s*|\s+").expect("separator pattern is valid"));

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\W_]+").expect("non-alphanumeric pattern is valid"));

const SEQUENCE_LEN: usize = 7;
const LEGACY_SEQUENCE_LEN: usize = 5;

/// Grammar options that vary between deployments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UrnRules {
    /// Accept the five digit case sequences some regions issued before the
    /// seven digit scheme. They are zero-padded in the canonical form.
    pub accept_legacy_sequences: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrnSegment {
    Region,
    Court,
    Sequence,
    Year,
}

impl UrnSegment {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrnSegment::Region => "region",
            UrnSegment::Court => "court",
            UrnSegment::Sequence => "sequence",
            UrnSegment::Year => "year",
        }
    }
}

impl fmt::Display for UrnSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UrnSegment::Region => "region code",
            UrnSegment::Court => "court code",
            UrnSegment::Sequence => "case sequence",
            UrnSegment::Year => "year",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Digits,
    Letters,
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharClass::Digits => f.write_str("digits"),
            CharClass::Letters => f.write_str("letters"),
        }
    }
}

/// Why a string is not a URN.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrnError {
    #[error("the URN is empty")]
    Empty,

    #[error("the URN must have four segments, found {found}")]
    SegmentCount { found: usize },

    #[error("the {segment} must be {expected} characters long, found {found}")]
    Length {
        segment: UrnSegment,
        expected: &'static str,
        found: usize,
    },

    #[error("the {segment} must contain only {expected}")]
    CharacterClass {
        segment: UrnSegment,
        expected: CharClass,
    },
}

impl UrnError {
    /// The segment at fault, when the structure was intact enough to tell.
    pub fn segment(&self) -> Option<UrnSegment> {
        match self {
            UrnError::Length { segment, .. } | UrnError::CharacterClass { segment, .. } => {
                Some(*segment)
            }
            UrnError::Empty | UrnError::SegmentCount { .. } => None,
        }
    }
}

/// A validated URN. Immutable; a new entry means a new `Urn`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Urn {
    region: String,
    court: String,
    /// Always seven digits.
    sequence: String,
    /// The sequence as entered, which differs only for legacy URNs.
    entered_sequence: String,
    year: String,
}

impl Urn {
    pub fn parse(raw: &str, rules: &UrnRules) -> Result<Urn, UrnError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UrnError::Empty);
        }

        let segments: Vec<&str> = SEPARATOR.split(trimmed).collect();
        if segments.len() != 4 {
            return Err(UrnError::SegmentCount {
                found: segments.len(),
            });
        }

        let region = check_segment(segments[0], UrnSegment::Region, CharClass::Digits, &[2])?;
        let court = check_segment(segments[1], UrnSegment::Court, CharClass::Letters, &[2])?;
        let allowed: &[usize] = if rules.accept_legacy_sequences {
            &[SEQUENCE_LEN, LEGACY_SEQUENCE_LEN]
        } else {
            &[SEQUENCE_LEN]
        };
        let entered_sequence =
            check_segment(segments[2], UrnSegment::Sequence, CharClass::Digits, allowed)?;
        let year = check_segment(segments[3], UrnSegment::Year, CharClass::Digits, &[2])?;

        Ok(Urn {
            region,
            court,
            sequence: format!("{:0>width$}", entered_sequence, width = SEQUENCE_LEN),
            entered_sequence,
            year,
        })
    }

    /// `06/AA/1234567/16`. Parsing the canonical form gives the same URN back.
    pub fn canonical(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.region, self.court, self.sequence, self.year
        )
    }

    /// The entry with every separator stripped: `06AA123456716`.
    pub fn standardised(&self) -> String {
        format!(
            "{}{}{}{}",
            self.region, self.court, self.entered_sequence, self.year
        )
    }

    /// The form shown back to the defendant. Legacy sequences keep the five
    /// digits printed on their notice.
    pub fn display(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.region, self.court, self.entered_sequence, self.year
        )
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn forms(&self) -> UrnForms {
        UrnForms {
            canonical: self.canonical(),
            standardised: self.standardised(),
            display: self.display(),
        }
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Strips everything but letters and digits and uppercases the rest.
///
/// Does not validate; used to record what a user typed even when it is not a
/// URN. Returns `None` when nothing is left.
pub fn standardise(raw: &str) -> Option<String> {
    let out = NON_ALPHANUMERIC.replace_all(raw, "").to_uppercase();
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

fn check_segment(
    value: &str,
    segment: UrnSegment,
    class: CharClass,
    lengths: &[usize],
) -> Result<String, UrnError> {
    let found = value.chars().count();
    if !lengths.contains(&found) {
        return Err(UrnError::Length {
            segment,
            expected: expected_lengths(lengths),
            found,
        });
    }

    let ok = match class {
        CharClass::Digits => value.chars().all(|c| c.is_ascii_digit()),
        CharClass::Letters => value.chars().all(|c| c.is_ascii_alphabetic()),
    };
    if !ok {
        return Err(UrnError::CharacterClass {
            segment,
            expected: class,
        });
    }

    Ok(value.to_ascii_uppercase())
}

fn expected_lengths(lengths: &[usize]) -> &'static str {
    match lengths {
        [2] => "2",
        [7] => "7",
        [7, 5] | [5, 7] => "5 or 7",
        _ => "a fixed number of",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict(raw: &str) -> Result<Urn, UrnError> {
        Urn::parse(raw, &UrnRules::default())
    }

    fn legacy(raw: &str) -> Result<Urn, UrnError> {
        Urn::parse(
            raw,
            &UrnRules {
                accept_legacy_sequences: true,
            },
        )
    }

    #[test]
    fn accepts_well_formed_urns() {
        for raw in ["00/AA/0000000/00", "12/bb/1234567/12", "06/aB/7654321/99"] {
            assert!(strict(raw).is_ok(), "{raw} should parse");
        }
    }

    #[test]
    fn rejects_malformed_urns() {
        for raw in [
            "123",
            "00bb/0000000/00",
            "AA/bb/0000000/00",
            "00/bb/000000/00",
            "0/bb/0000000/00",
            "00/bb/0000000/0",
            "",
            "   ",
            "00/bb/0000000/00/00",
            "00//bb/0000000/00",
            "00 / / bb/0000000/00",
        ] {
            assert!(strict(raw).is_err(), "{raw:?} should not parse");
        }
    }

    #[test]
    fn errors_name_the_segment() {
        assert_eq!(
            strict("AA/bb/0000000/00").unwrap_err(),
            UrnError::CharacterClass {
                segment: UrnSegment::Region,
                expected: CharClass::Digits,
            }
        );
        assert_eq!(
            strict("00/b1/0000000/00").unwrap_err().segment(),
            Some(UrnSegment::Court)
        );
        assert_eq!(
            strict("00/bb/000000/00").unwrap_err(),
            UrnError::Length {
                segment: UrnSegment::Sequence,
                expected: "7",
                found: 6,
            }
        );
        assert_eq!(
            strict("00/bb/0000000/0").unwrap_err().segment(),
            Some(UrnSegment::Year)
        );
        assert_eq!(
            strict("00bb/0000000/00").unwrap_err(),
            UrnError::SegmentCount { found: 3 }
        );
        assert_eq!(strict("  ").unwrap_err(), UrnError::Empty);
    }

    #[test]
    fn normalises_case_and_separators() {
        let urn = strict(" 12-bb 1234567.12 ").unwrap();
        assert_eq!(urn.canonical(), "12/BB/1234567/12");
        assert_eq!(urn.standardised(), "12BB123456712");
        assert_eq!(urn.display(), "12/BB/1234567/12");
        assert_eq!(urn.region(), "12");

        for raw in ["06 / AA / 1234567 / 16", "06 - aa -1234567_ 16", "06  AA\t1234567 16"] {
            assert_eq!(strict(raw).unwrap().canonical(), "06/AA/1234567/16", "{raw:?}");
        }
    }

    #[test]
    fn mixed_case_urns_are_equivalent() {
        assert_eq!(
            strict("06/aa/1234567/16").unwrap(),
            strict("06/AA/1234567/16").unwrap()
        );
    }

    #[test]
    fn canonical_form_is_idempotent() {
        for raw in ["00/AA/0000000/00", "12/bb/1234567/12", "06_xy_7654321_01"] {
            let once = strict(raw).unwrap().canonical();
            let twice = strict(&once).unwrap().canonical();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn legacy_sequences_need_opt_in() {
        assert!(strict("51/AA/00000/00").is_err());

        let urn = legacy("51/aa/12345/00").unwrap();
        assert_eq!(urn.canonical(), "51/AA/0012345/00");
        assert_eq!(urn.display(), "51/AA/12345/00");
        assert_eq!(urn.standardised(), "51AA1234500");
        assert_eq!(legacy(&urn.canonical()).unwrap().canonical(), urn.canonical());
    }

    #[test]
    fn legacy_rules_still_reject_other_lengths() {
        assert_eq!(
            legacy("06/BB/123456/99").unwrap_err(),
            UrnError::Length {
                segment: UrnSegment::Sequence,
                expected: "5 or 7",
                found: 6,
            }
        );
    }

    #[test]
    fn standardise_strips_everything_but_alphanumerics() {
        assert_eq!(standardise("00/aa/11111/99").as_deref(), Some("00AA1111199"));
        assert_eq!(standardise("0-0-aa_11111-99").as_deref(), Some("00AA1111199"));
        assert_eq!(standardise("aaaa-00099").as_deref(), Some("AAAA00099"));
        assert_eq!(standardise("/ -_"), None);
        assert_eq!(standardise(""), None);
    }
}
