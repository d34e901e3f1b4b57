//! Display helpers for terminal output

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::api::models::Work;

/// Pinyin dynasty keys as sent by the backend, and their display names
const DYNASTIES: &[(&str, &str)] = &[
    ("tang", "唐"),
    ("song", "宋"),
    ("yuan", "元"),
    ("ming", "明"),
    ("qing", "清"),
    ("preqin", "先秦"),
    ("wudai", "五代"),
    // Southern Tang, one of the Five Dynasties kingdoms
    ("nan", "南唐"),
    ("jin", "金"),
    ("liao", "辽"),
];

/// Display name of a dynasty key, case-insensitive
///
/// Unknown values pass through unchanged; empty input yields an empty string.
///
/// ```
/// use shici::format::format_dynasty;
///
/// assert_eq!(format_dynasty("Tang"), "唐");
/// assert_eq!(format_dynasty("三国"), "三国");
/// ```
pub fn format_dynasty(dynasty: &str) -> String {
    if dynasty.is_empty() {
        return String::new();
    }

    let key = dynasty.to_lowercase();
    DYNASTIES
        .iter()
        .find(|(pinyin, _)| *pinyin == key)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| dynasty.to_string())
}

/// Truncate to at most `max_width` terminal columns, marking the cut with `…`
///
/// Width is measured in display columns, so a CJK character counts as two.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }

    // Leave room for the ellipsis (1 column)
    let target_width = max_width.saturating_sub(1);
    let mut current_width = 0;
    let mut truncate_at = 0;
    for (i, c) in text.char_indices() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > target_width {
            break;
        }
        current_width += char_width;
        truncate_at = i + c.len_utf8();
    }

    let mut line = text[..truncate_at].to_string();
    line.push('…');
    line
}

/// `[唐] 李白`, or whichever half is known
pub fn byline(work: &Work) -> String {
    let dynasty = format_dynasty(&work.author.dynasty);
    match (dynasty.is_empty(), work.author.name.is_empty()) {
        (false, false) => format!("[{}] {}", dynasty, work.author.name),
        (true, false) => work.author.name.clone(),
        (false, true) => format!("[{}]", dynasty),
        (true, true) => String::new(),
    }
}

/// One-line list entry: `#12  静夜思  [唐] 李白`
pub fn poem_summary(work: &Work, max_width: usize) -> String {
    let line = format!("#{:<6} {}  {}", work.id, work.display_title(), byline(work));
    truncate_to_width(line.trim_end(), max_width)
}

/// Full poem text: title, byline, prologue, then one paragraph per line
pub fn format_poem(work: &Work) -> String {
    let mut out = String::new();
    out.push_str(work.display_title());
    out.push('\n');

    let byline = byline(work);
    if !byline.is_empty() {
        out.push_str(&byline);
        out.push('\n');
    }

    if !work.prologue.is_empty() {
        out.push('\n');
        out.push_str(&work.prologue);
        out.push('\n');
    }

    if !work.content.is_empty() {
        out.push('\n');
        for paragraph in &work.content {
            out.push_str(paragraph);
            out.push('\n');
        }
    }
    out
}

/// `page 2/7 (130 total)`
pub fn page_footer(page: u32, total_pages: u32, total: u64) -> String {
    format!("page {}/{} ({} total)", page, total_pages.max(1), total)
}
