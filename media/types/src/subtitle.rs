/*!
    Subtitle rectangles and best-effort text extraction.
*/

/// Comma-delimited fields ahead of the text in a bare ASS event line
/// (ReadOrder, Layer, Style, Name, MarginL, MarginR, MarginV, Effect).
const EVENT_LEADING_FIELDS: usize = 8;

/// Fields ahead of the text in a full `Dialogue:` line
/// (Layer/Marked, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect).
const DIALOGUE_LEADING_FIELDS: usize = 9;

/**
    One rectangle of a decoded subtitle.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubtitleRect {
    /// Structured dialogue line (SSA/ASS).
    Ass(String),
    /// Plain text.
    Text(String),
    /// Picture-based subtitle; carries no text.
    Bitmap,
}

/**
    Strip an ASS dialogue line down to its text.

    Leading fields are dropped and every markup escape (a backslash and the
    character after it) is replaced with blanks. Returns `None` when the
    line has fewer fields than expected.
*/
pub fn dialogue_text(line: &str) -> Option<String> {
    let (body, leading) = match line.strip_prefix("Dialogue:") {
        Some(rest) => (rest, DIALOGUE_LEADING_FIELDS),
        None => (line, EVENT_LEADING_FIELDS),
    };
    let text = body.splitn(leading + 1, ',').nth(leading)?;

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.push(' ');
            if chars.next().is_some() {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/**
    Extract text from the first text-bearing rectangle.

    ASS rectangles go through [`dialogue_text`], plain text is returned
    verbatim, bitmap rectangles are skipped. No rectangles means no text.
*/
pub fn extract_text(rects: &[SubtitleRect]) -> Option<String> {
    rects.iter().find_map(|rect| match rect {
        SubtitleRect::Ass(line) => Some(dialogue_text(line)),
        SubtitleRect::Text(text) => Some(Some(text.clone())),
        SubtitleRect::Bitmap => None,
    })?
}
