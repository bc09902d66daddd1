use console::{Style, style};
use scrubline_core::{AnswerFragment, Inline, RenderedSegment};

const INDENT: &str = "            ";

/// One transcript row: cyan timestamp column, then styled text.
pub fn render_row(row: &RenderedSegment, active: bool) -> String {
    let marker = if active {
        style("▶").green().bold().to_string()
    } else {
        " ".to_string()
    };
    let label = if row.segment.timestamp_display.is_empty() {
        style("--".to_string()).dim()
    } else {
        style(row.segment.timestamp_display.clone()).cyan()
    };
    format!(
        "{} {:>4} {}\n{}{}",
        marker,
        style(format!("#{}", row.index)).dim(),
        label,
        INDENT,
        render_inlines(&row.inlines)
    )
}

pub fn render_inlines(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text { text, bold, italic } => {
                let mut s = Style::new();
                if *bold {
                    s = s.bold();
                }
                if *italic {
                    s = s.italic();
                }
                out.push_str(&s.apply_to(text).to_string());
            }
            Inline::LineBreak => {
                out.push('\n');
                out.push_str(INDENT);
            }
        }
    }
    out
}

/// Answer text with citations highlighted and numbered.
pub fn render_answer(fragments: &[AnswerFragment]) -> String {
    let mut out = String::new();
    let mut n = 0;
    for fragment in fragments {
        match fragment {
            AnswerFragment::Text(text) => out.push_str(text),
            AnswerFragment::Citation { label, .. } => {
                n += 1;
                out.push_str(&style(label).yellow().underlined().to_string());
                out.push_str(&style(superscript(n)).dim().to_string());
            }
        }
    }
    out
}

fn superscript(n: usize) -> String {
    const DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];
    n.to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| DIGITS[d as usize])
        .collect()
}

/// `sk-abc…wxyz` for display.
pub fn mask(credential: &str) -> String {
    let chars: Vec<char> = credential.chars().collect();
    if chars.len() <= 8 {
        return "•".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}
