//! # Case matching
//!
//! Resolves a validated URN to the case records it refers to. The exact
//! lookup on the canonical URN is authoritative. Only when it finds nothing,
//! fuzzy matching is enabled and the defendant supplied some details does the
//! matcher fall back to a bounded search over cases in the same police
//! region that share the postcode or date of birth.
//!
//! Fuzzy candidates are scored as the mean of whichever of these apply:
//! - positional similarity of the entered URN and the case URN,
//! - surname similarity,
//! - forenames similarity,
//! - postcode equality,
//! - date of birth equality.
//!
//! Candidates under the threshold are dropped. The rest are ranked by score,
//! then by creation time (earliest wins ties), then by id.

mod similarity;

use crate::store::{postcode_key, Store, StoreError};
use crate::urn::Urn;
use chrono::NaiveDate;
use common::model::case::Case;
use common::model::matching::{CaseSummary, MatchSummary};
use log::debug;
use similarity::{name_similarity, sequence_similarity};
use std::cmp::Ordering;

/// Settings for the fuzzy fallback. Disabled unless configured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyConfig {
    pub enabled: bool,
    /// Minimum mean score, in `(0, 1]`.
    pub threshold: f64,
    /// Upper bound on rows read by the secondary search.
    pub max_candidates: usize,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        FuzzyConfig {
            enabled: false,
            threshold: 0.85,
            max_candidates: 25,
        }
    }
}

/// Details a defendant may give alongside the URN.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefendantDetails {
    pub forenames: Option<String>,
    pub surname: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub postcode: Option<String>,
}

impl DefendantDetails {
    pub fn is_empty(&self) -> bool {
        self.forenames.is_none()
            && self.surname.is_none()
            && self.date_of_birth.is_none()
            && self.postcode.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub case: Case,
    /// `None` for exact URN matches.
    pub score: Option<f64>,
}

impl Candidate {
    fn exact(case: Case) -> Self {
        Candidate { case, score: None }
    }

    fn summary(&self) -> CaseSummary {
        CaseSummary::from_case(&self.case, self.score)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    NotFound,
    Matched(Candidate),
    /// Ranked; callers must disambiguate.
    Ambiguous(Vec<Candidate>),
}

impl MatchOutcome {
    pub fn match_count(&self) -> u32 {
        match self {
            MatchOutcome::NotFound => 0,
            MatchOutcome::Matched(_) => 1,
            MatchOutcome::Ambiguous(candidates) => candidates.len() as u32,
        }
    }

    /// The case id worth recording against an attempt: set only for a
    /// single match.
    pub fn matched_case_id(&self) -> Option<i64> {
        match self {
            MatchOutcome::Matched(candidate) => Some(candidate.case.id),
            _ => None,
        }
    }

    pub fn summary(&self) -> MatchSummary {
        match self {
            MatchOutcome::NotFound => MatchSummary::NotFound,
            MatchOutcome::Matched(candidate) => MatchSummary::Matched {
                case: candidate.summary(),
            },
            MatchOutcome::Ambiguous(candidates) => MatchSummary::Ambiguous {
                candidates: candidates.iter().map(Candidate::summary).collect(),
            },
        }
    }
}

pub struct CaseMatcher<'a> {
    store: &'a Store,
    fuzzy: FuzzyConfig,
}

impl<'a> CaseMatcher<'a> {
    pub fn new(store: &'a Store, fuzzy: FuzzyConfig) -> Self {
        CaseMatcher { store, fuzzy }
    }

    pub fn find(
        &self,
        urn: &Urn,
        details: Option<&DefendantDetails>,
    ) -> Result<MatchOutcome, StoreError> {
        let canonical = urn.canonical();
        let mut exact = self.store.cases_by_urn(&canonical)?;
        debug!("{} exact match(es) for {}", exact.len(), canonical);

        match exact.len() {
            0 => {}
            1 => return Ok(MatchOutcome::Matched(Candidate::exact(exact.remove(0)))),
            _ => {
                return Ok(MatchOutcome::Ambiguous(
                    exact.into_iter().map(Candidate::exact).collect(),
                ))
            }
        }

        match details {
            Some(details) if self.fuzzy.enabled && !details.is_empty() => {
                self.find_fuzzy(urn, details)
            }
            _ => Ok(MatchOutcome::NotFound),
        }
    }

    /// A URN can be used for a plea unless one has already been sent for it.
    pub fn can_use_urn(&self, urn: &Urn) -> Result<bool, StoreError> {
        Ok(!self.store.urn_already_sent(&urn.canonical())?)
    }

    fn find_fuzzy(
        &self,
        urn: &Urn,
        details: &DefendantDetails,
    ) -> Result<MatchOutcome, StoreError> {
        let rows = self.store.fuzzy_candidates(
            urn.region(),
            details.postcode.as_deref(),
            details.date_of_birth,
            self.fuzzy.max_candidates,
        )?;
        let canonical = urn.canonical();

        let mut candidates: Vec<Candidate> = rows
            .into_iter()
            .map(|case| {
                let score = score(&canonical, details, &case);
                Candidate {
                    case,
                    score: Some(score),
                }
            })
            .filter(|c| c.score.unwrap_or(0.0) >= self.fuzzy.threshold)
            .collect();
        candidates.sort_by(rank);

        debug!(
            "{} fuzzy candidate(s) for {} at threshold {}",
            candidates.len(),
            canonical,
            self.fuzzy.threshold
        );

        Ok(match candidates.len() {
            0 => MatchOutcome::NotFound,
            1 => MatchOutcome::Matched(candidates.remove(0)),
            _ => MatchOutcome::Ambiguous(candidates),
        })
    }
}

fn score(canonical: &str, details: &DefendantDetails, case: &Case) -> f64 {
    let mut parts = vec![sequence_similarity(canonical, &case.urn)];

    if let (Some(wanted), Some(found)) = (details.surname.as_deref(), case.surname.as_deref()) {
        parts.push(name_similarity(wanted, found));
    }
    if let (Some(wanted), Some(found)) = (details.forenames.as_deref(), case.forenames.as_deref())
    {
        parts.push(name_similarity(wanted, found));
    }
    if let (Some(wanted), Some(found)) = (details.postcode.as_deref(), case.postcode.as_deref()) {
        parts.push(if postcode_key(wanted) == postcode_key(found) {
            1.0
        } else {
            0.0
        });
    }
    if let (Some(wanted), Some(found)) = (details.date_of_birth, case.date_of_birth) {
        parts.push(if wanted == found { 1.0 } else { 0.0 });
    }

    parts.iter().sum::<f64>() / parts.len() as f64
}

fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    let a_score = a.score.unwrap_or(0.0);
    let b_score = b.score.unwrap_or(0.0);
    b_score
        .total_cmp(&a_score)
        .then_with(|| a.case.created.cmp(&b.case.created))
        .then_with(|| a.case.id.cmp(&b.case.id))
}
