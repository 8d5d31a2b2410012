use once_cell::sync::Lazy;
use regex::Regex;

const FENCE: &str = "```";

static ENUMERATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([ \t]*)(?:[0-9]+\.[ \t]+)+").expect("enumerator regex"));

/// Prepares a raw model reply for section parsing.
///
/// Fence unwrapping and enumerator stripping repeat until the text settles,
/// so nested fences come off together and a normalized reply is a fixed point.
pub fn normalize_reply(raw: &str) -> String {
    let mut text = raw.trim().to_string();
    loop {
        // Both steps only remove text, so this ends once nothing changes.
        let next = strip_enumerators(&strip_code_fences(&text));
        if next == text {
            return text;
        }
        text = next;
    }
}

/// Removes `1. ` style list numbering from the start of every line. Runs of
/// enumerators (`1. 2. `) go together so a second pass changes nothing.
pub fn strip_enumerators(text: &str) -> String {
    ENUMERATOR_RE.replace_all(text, "$1").into_owned()
}

/// Unwraps one fenced block around the whole reply. A reply that opens with a
/// fence but is not a well-formed block just loses its fence markers.
pub fn strip_code_fences(text: &str) -> String {
    let text = text.trim();
    let Some(inner) = text.strip_prefix(FENCE) else {
        return text.to_string();
    };

    let block = inner
        .strip_suffix(FENCE)
        .and_then(|inner| inner.split_once('\n'))
        .filter(|(info, _)| is_info_string(info));

    match block {
        Some((_, body)) => body.trim().to_string(),
        None => text.replace(FENCE, "").trim().to_string(),
    }
}

fn is_info_string(info: &str) -> bool {
    info.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '+')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_enumerators_at_line_start() {
        let input = "1. 제목: 도서관 4층\n2. 설명: 자료실\n3. 추가 정보: 4F";
        assert_eq!(
            strip_enumerators(input),
            "제목: 도서관 4층\n설명: 자료실\n추가 정보: 4F"
        );
    }

    #[test]
    fn keeps_numbers_inside_lines() {
        let input = "7호관 3.5층이 아니라 3층입니다.\n운영 시간은 9. 00부터";
        assert_eq!(strip_enumerators(input), input);
    }

    #[test]
    fn keeps_line_structure_and_indent() {
        let input = "  1. 첫째\n\n10.\t둘째\n3.셋째";
        assert_eq!(strip_enumerators(input), "  첫째\n\n둘째\n3.셋째");
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let input = "1. 2. 제목: 3호관\n 4. 설명: 전산실습실";
        let once = strip_enumerators(input);
        assert_eq!(once, "제목: 3호관\n 설명: 전산실습실");
        assert_eq!(strip_enumerators(&once), once);
    }

    #[test]
    fn unwraps_fenced_reply() {
        let input = "```markdown\n1. 제목: 7호관\n```".to_string();
        assert_eq!(normalize_reply(&input), "제목: 7호관");
    }

    #[test]
    fn drops_stray_fence_markers() {
        assert_eq!(strip_code_fences("```제목: 7호관"), "제목: 7호관");
        assert_eq!(strip_code_fences("```설명 ```"), "설명");
        assert_eq!(strip_code_fences("  plain  "), "plain");
    }

    #[test]
    fn bare_fence_without_language_unwraps() {
        assert_eq!(strip_code_fences("```\n제목: 도서관\n```"), "제목: 도서관");
    }

    #[test]
    fn nested_fences_unwrap_in_one_call() {
        let input = "```text\n```\n1. 제목: a\n```\n```";
        assert_eq!(normalize_reply(input), "제목: a");
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let replies = [
            "```text\n```\n1. 제목: a\n```\n```",
            "```markdown\n1. 2. 제목: 3호관\n 3. 설명: 전산실습실\n```",
            "1. \n2. 제목: 도서관",
            "```제목: 7호관```",
            "  7호관 3층에 있습니다.  ",
            "",
        ];
        for raw in replies {
            let once = normalize_reply(raw);
            assert_eq!(normalize_reply(&once), once, "reply {raw:?}");
        }
    }
}
