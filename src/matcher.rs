//! Resolves which building a question is about, independently of the model.
//!
//! Every building and facility contributes keywords to a single ordered
//! candidate list: building-name keywords for the whole dataset come first,
//! then facility-name keywords, each in dataset order. The first candidate
//! found in the question wins.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::dataset::{Building, FacilityDataset};

const BUILDING_SUFFIX: &str = "호관";
const LIBRARY_ALIAS: &str = "도서관";
const FACILITY_SUFFIXES: [&str; 2] = ["사무실", "실"];
const DIGEST_MAX_FLOORS: usize = 5;
const DIGEST_HEADER_SUFFIX: &str = "시설 정보:";

static NUMERAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("numeral regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    BuildingName,
    FacilityName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedBy {
    pub stage: MatchStage,
    pub keyword: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult<'a> {
    pub building: Option<&'a Building>,
    pub image_url: Option<String>,
    pub facility_digest: String,
    pub matched_by: Option<MatchedBy>,
}

impl MatchResult<'_> {
    pub fn is_match(&self) -> bool {
        self.building.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    /// Whole keyword, or any whitespace sub-token longer than one char.
    Phrase,
    /// Whole keyword only.
    Exact,
    /// Any whitespace token longer than two chars.
    Tokens,
}

struct Candidate<'a> {
    building: &'a Building,
    stage: MatchStage,
    keyword: String,
    probe: Probe,
}

impl Candidate<'_> {
    fn hit(&self, question: &str) -> Option<String> {
        let keyword = self.keyword.to_lowercase();
        if keyword.is_empty() {
            return None;
        }

        match self.probe {
            Probe::Exact => question.contains(&keyword).then(|| self.keyword.clone()),
            Probe::Phrase => {
                if question.contains(&keyword) {
                    return Some(self.keyword.clone());
                }
                if !keyword.contains(char::is_whitespace) {
                    return None;
                }
                keyword
                    .split_whitespace()
                    .find(|token| token.chars().count() > 1 && question.contains(token))
                    .map(str::to_string)
            }
            Probe::Tokens => keyword
                .split_whitespace()
                .find(|token| token.chars().count() > 2 && question.contains(token))
                .map(str::to_string),
        }
    }
}

pub fn match_question<'a>(
    question: &str,
    dataset: Option<&'a FacilityDataset>,
) -> MatchResult<'a> {
    let Some(dataset) = dataset else {
        return MatchResult::default();
    };

    let question = question.to_lowercase();
    let winner = ranked_candidates(dataset).find_map(|candidate| {
        candidate.hit(&question).map(|keyword| {
            (
                candidate.building,
                MatchedBy {
                    stage: candidate.stage,
                    keyword,
                },
            )
        })
    });

    match winner {
        Some((building, matched_by)) => MatchResult {
            building: Some(building),
            image_url: building.image_url.clone(),
            facility_digest: facility_digest(building),
            matched_by: Some(matched_by),
        },
        None => MatchResult::default(),
    }
}

fn ranked_candidates(dataset: &FacilityDataset) -> impl Iterator<Item = Candidate<'_>> {
    let by_name = dataset.buildings.iter().flat_map(|building| {
        building_keywords(building)
            .into_iter()
            .map(move |keyword| Candidate {
                building,
                stage: MatchStage::BuildingName,
                keyword,
                probe: Probe::Phrase,
            })
    });

    let by_facility = dataset.buildings.iter().flat_map(|building| {
        building
            .floors
            .iter()
            .flat_map(|floor| floor.facilities.iter())
            .flat_map(move |facility| {
                [
                    Candidate {
                        building,
                        stage: MatchStage::FacilityName,
                        keyword: facility.clone(),
                        probe: Probe::Exact,
                    },
                    Candidate {
                        building,
                        stage: MatchStage::FacilityName,
                        keyword: strip_facility_suffixes(facility),
                        probe: Probe::Tokens,
                    },
                ]
            })
    });

    by_name.chain(by_facility)
}

fn building_keywords(building: &Building) -> Vec<String> {
    let name = building.match_name();
    let mut keywords = vec![name.clone()];

    if name.contains(BUILDING_SUFFIX) {
        keywords.push(name.replace(BUILDING_SUFFIX, "").trim().to_string());
        keywords.extend(NUMERAL_RE.find_iter(&name).map(|m| m.as_str().to_string()));
    } else if name.contains(LIBRARY_ALIAS) && name != LIBRARY_ALIAS {
        keywords.push(LIBRARY_ALIAS.to_string());
    }

    let mut seen = Vec::with_capacity(keywords.len());
    keywords.retain(|keyword| {
        if keyword.is_empty() || seen.contains(keyword) {
            return false;
        }
        seen.push(keyword.clone());
        true
    });
    keywords
}

fn strip_facility_suffixes(facility: &str) -> String {
    facility
        .split_whitespace()
        .map(|token| {
            FACILITY_SUFFIXES
                .iter()
                .find_map(|suffix| token.strip_suffix(suffix))
                .unwrap_or(token)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Per-floor listing of a building, capped at the first few stocked floors.
pub fn facility_digest(building: &Building) -> String {
    let lines: Vec<String> = building
        .stocked_floors()
        .take(DIGEST_MAX_FLOORS)
        .map(|floor| format!("{}: {}", floor.label, floor.facilities.join(", ")))
        .collect();

    if lines.is_empty() {
        return String::new();
    }

    format!(
        "{} {DIGEST_HEADER_SUFFIX}\n{}",
        building.name,
        lines.join("\n")
    )
}
