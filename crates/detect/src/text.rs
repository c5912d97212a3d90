//! Text cleanup applied before segmentation.

/// Normalize line endings to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Clean OCR or pasted text for question segmentation.
///
/// Typographic quotes and dashes are folded to ASCII, control characters
/// are dropped, runs of spaces inside a line collapse to one, and trailing
/// whitespace is removed from every line. Line breaks are kept because the
/// segmenter treats blank lines as boundaries.
pub fn normalize_text(text: &str) -> String {
    let text = normalize_line_endings(text);

    let mut folded = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{2032}' => folded.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201F}' | '\u{2033}' => folded.push('"'),
            '\u{2010}'..='\u{2015}' => folded.push('-'),
            '\u{2026}' => folded.push_str("..."),
            '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\t' => folded.push(' '),
            '\u{200B}' | '\u{FEFF}' => {}
            '\n' => folded.push('\n'),
            c if c.is_control() => {}
            c => folded.push(c),
        }
    }

    let lines: Vec<String> = folded
        .lines()
        .map(|line| {
            let mut out = String::with_capacity(line.len());
            let mut previous_space = false;
            for c in line.chars() {
                if c == ' ' {
                    if !previous_space {
                        out.push(' ');
                    }
                    previous_space = true;
                } else {
                    out.push(c);
                    previous_space = false;
                }
            }
            out.trim_end().to_string()
        })
        .collect();

    lines.join("\n").trim().to_string()
}

/// Collapse every run of whitespace (including newlines) to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters without splitting a char.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
