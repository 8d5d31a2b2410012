//! Turns a normalized model reply into display fields.
//!
//! Replies that follow the prompted `제목:` / `설명:` / `추가 정보:` layout are
//! split on those labels. Anything else goes through a heuristic scan of the
//! opening lines for a building or floor name.

use serde::Serialize;

pub const SENTINEL_TITLE: &str = "안내";

const TITLE_LABEL: &str = "제목:";
const DESCRIPTION_LABEL: &str = "설명:";
const EXTRA_INFO_LABEL: &str = "추가 정보:";

const PLACE_KEYWORDS: [&str; 3] = ["호관", "도서관", "층"];
const HEURISTIC_SCAN_LINES: usize = 3;
const HYPHEN_TITLE_MAX_CHARS: usize = 20;
const TITLE_MAX_CHARS: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedReply {
    pub title: String,
    pub description: String,
    pub extra_info: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Title,
    Description,
    ExtraInfo,
}

impl Section {
    fn detect(line: &str) -> Option<(Section, &str)> {
        [
            (TITLE_LABEL, Section::Title),
            (DESCRIPTION_LABEL, Section::Description),
            (EXTRA_INFO_LABEL, Section::ExtraInfo),
        ]
        .into_iter()
        .find_map(|(label, section)| {
            line.strip_prefix(label).map(|rest| (section, rest.trim()))
        })
    }
}

#[derive(Default)]
struct SectionBuffers {
    title: Option<String>,
    description: Vec<String>,
    extra_info: Vec<String>,
}

impl SectionBuffers {
    fn push(&mut self, section: Section, text: &str) {
        match section {
            Section::Title => {
                if self.title.is_none() {
                    self.title = Some(text.to_string());
                }
            }
            Section::Description => self.description.push(text.to_string()),
            Section::ExtraInfo => self.extra_info.push(text.to_string()),
        }
    }
}

pub fn parse_reply(normalized: &str) -> ParsedReply {
    parse_labeled(normalized).unwrap_or_else(|| parse_heuristic(normalized))
}

/// Returns `None` when the reply carries no section label at all.
pub fn parse_labeled(normalized: &str) -> Option<ParsedReply> {
    let mut buffers = SectionBuffers::default();
    let mut current: Option<Section> = None;
    let mut saw_label = false;

    for line in normalized.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some((section, rest)) = Section::detect(line) {
            saw_label = true;
            current = Some(section);
            if !rest.is_empty() {
                buffers.push(section, rest);
            }
            continue;
        }

        if let Some(section) = current {
            buffers.push(section, line);
        }
    }

    if !saw_label {
        return None;
    }

    let title = buffers
        .title
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| SENTINEL_TITLE.to_string());
    let description = match buffers.description.join("\n") {
        joined if joined.is_empty() => normalized.trim().to_string(),
        joined => joined,
    };

    Some(ParsedReply {
        title,
        description,
        extra_info: buffers.extra_info.join("\n"),
    })
}

pub fn parse_heuristic(normalized: &str) -> ParsedReply {
    let text = normalized.trim();
    let lines: Vec<&str> = text.split('\n').collect();

    let title = lines
        .iter()
        .take(HEURISTIC_SCAN_LINES)
        .map(|line| line.trim())
        .find(|line| PLACE_KEYWORDS.iter().any(|keyword| line.contains(keyword)))
        .map(title_candidate)
        .filter(|title| !title.is_empty());

    match title {
        Some(title) => {
            let rest = lines[1..].join("\n").trim().to_string();
            let description = if rest.is_empty() {
                text.to_string()
            } else {
                rest
            };
            ParsedReply {
                title,
                description,
                extra_info: String::new(),
            }
        }
        None => ParsedReply {
            title: SENTINEL_TITLE.to_string(),
            description: text.to_string(),
            extra_info: String::new(),
        },
    }
}

fn title_candidate(line: &str) -> String {
    if let Some((head, _)) = line.split_once(':') {
        return head.trim().to_string();
    }

    if let Some((head, _)) = line.split_once('-') {
        if head.chars().count() < HYPHEN_TITLE_MAX_CHARS {
            return head.trim().to_string();
        }
    }

    line.chars()
        .take(TITLE_MAX_CHARS)
        .collect::<String>()
        .trim()
        .to_string()
}
