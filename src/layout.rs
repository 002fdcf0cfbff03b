//! Text layout for dividers, bordered blocks, spacers and title banners.
//!
//! Every function here is pure; widths are counted in `char`s. Out-of-range
//! lengths are clamped to the smallest layout that still renders.

use std::collections::VecDeque;

/// Shortest divider: two borders around a single fill.
pub const MIN_DIVIDER_LENGTH: usize = 3;

/// Shortest bordered line: borders, padding and one content character.
pub const MIN_BORDERED_LENGTH: usize = 5;

/// `border + fill × (length - 2) + border`.
pub fn divider(length: usize, border: &str, fill: &str) -> String {
    let length = length.max(MIN_DIVIDER_LENGTH);
    format!("{border}{}{border}", fill.repeat(length - 2))
}

/// Content budget inside a bordered line of `length` characters.
pub fn interior_width(length: usize) -> usize {
    length.max(MIN_BORDERED_LENGTH) - 4
}

/// Lay `message` out as bordered lines of `length` characters.
///
/// Explicit line breaks are kept, each line is wrapped to the interior width
/// and padded, then framed as `border + " " + line + " " + border`.
pub fn bordered_lines(message: &str, border: &str, length: usize) -> Vec<String> {
    let width = interior_width(length);
    let mut paragraphs: Vec<&str> = message.lines().collect();
    if paragraphs.is_empty() {
        paragraphs.push("");
    }

    paragraphs
        .into_iter()
        .flat_map(|paragraph| wrap(paragraph, width))
        .map(|line| format!("{border} {line:<width$} {border}"))
        .collect()
}

/// `border × length + " 'title' " + border × length`.
pub fn title_banner(title: &str, length: usize, border: &str) -> String {
    let rule = border.repeat(length);
    format!("{rule} '{title}' {rule}")
}

/// Number of blank records a spacer emits.
pub fn spacer_count(lines: usize) -> usize {
    lines.max(1)
}

/// Tab stops used when expanding tabs before wrapping.
pub const TAB_SIZE: usize = 8;

#[derive(Debug)]
struct Chunk {
    text: String,
    len: usize,
    blank: bool,
}

fn is_break(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r')
}

/// Expand tabs to the next [`TAB_SIZE`] column, then turn every other
/// whitespace character into a single space.
fn expand_whitespace(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        match c {
            '\t' => {
                let pad = TAB_SIZE - column % TAB_SIZE;
                out.push_str(&" ".repeat(pad));
                column += pad;
            }
            '\n' | '\r' => {
                out.push(' ');
                column = 0;
            }
            c if is_break(c) => {
                out.push(' ');
                column += 1;
            }
            c => {
                out.push(c);
                column += 1;
            }
        }
    }
    out
}

/// Runs of spaces and non-spaces.
fn chunks(line: &str) -> VecDeque<Chunk> {
    let mut out: VecDeque<Chunk> = VecDeque::new();
    for c in line.chars() {
        let blank = c == ' ';
        match out.back_mut() {
            Some(last) if last.blank == blank => {
                last.text.push(c);
                last.len += 1;
            }
            _ => out.push_back(Chunk {
                text: c.to_string(),
                len: 1,
                blank,
            }),
        }
    }
    out
}

/// Greedy word wrap of a single line to `width` characters.
///
/// Tabs expand to [`TAB_SIZE`] columns first. Lines break at whitespace,
/// dropping the whitespace at each break. A word wider than `width` fills
/// what is left of the current line and continues on the next ones. A line
/// without content wraps to a single empty line.
pub fn wrap(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut chunks = chunks(&expand_whitespace(line));
    let mut lines: Vec<String> = Vec::new();

    while !chunks.is_empty() {
        // leading whitespace survives only on the first line
        if !lines.is_empty() && chunks.front().is_some_and(|chunk| chunk.blank) {
            chunks.pop_front();
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0;
        while let Some(chunk) = chunks.front() {
            if current_len + chunk.len > width {
                break;
            }
            current_len += chunk.len;
            current.push_str(&chunk.text);
            chunks.pop_front();
        }

        if let Some(chunk) = chunks.front_mut()
            && chunk.len > width
        {
            let take = width - current_len;
            let split = chunk
                .text
                .char_indices()
                .nth(take)
                .map_or(chunk.text.len(), |(idx, _)| idx);
            let rest = chunk.text.split_off(split);
            current.push_str(&std::mem::replace(&mut chunk.text, rest));
            chunk.len -= take;
        }

        let trimmed = current.trim_end_matches(' ');
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
