//! Minimal HTML scanning primitives for the modem status page.
//!
//! The status pages served by cable modems are small, flat and frequently
//! sloppy (unclosed `<td>`/`<tr>`, stray `&nbsp;`, inconsistent casing), so
//! this module scans tag blocks in the raw text instead of building a DOM.
//! All lookups are case-insensitive and tolerate truncated documents: a
//! missing close tag ends a region at the next sibling open tag or at the
//! end of input, never in a panic.

/// Find the next `<name ...>` open tag at or after `from`.
///
/// `lower` must be the ASCII-lowercased document (same byte offsets as the
/// original). Returns `(tag_start, content_start)` where `content_start` is
/// the offset just past the open tag's `>`.
fn find_open(lower: &str, name: &str, from: usize) -> Option<(usize, usize)> {
    let pat = format!("<{name}");
    let mut pos = from;
    loop {
        let start = pos + lower.get(pos..)?.find(&pat)?;
        let after = start + pat.len();
        // Reject prefixes of longer tag names, e.g. `<td` matching `<tdata`.
        let boundary = matches!(
            lower.as_bytes().get(after).copied(),
            Some(b' ' | b'\t' | b'\r' | b'\n' | b'>' | b'/')
        );
        if boundary {
            let content = after + lower[after..].find('>')? + 1;
            return Some((start, content));
        }
        pos = after;
    }
}

/// Find the next `</name>` close tag at or after `from`.
///
/// Returns `(tag_start, tag_end)` with `tag_end` just past the `>`.
fn find_close(lower: &str, name: &str, from: usize) -> Option<(usize, usize)> {
    let pat = format!("</{name}");
    let start = from + lower.get(from..)?.find(&pat)?;
    let after = start + pat.len();
    let end = after + lower[after..].find('>')? + 1;
    Some((start, end))
}

/// End offset of the table whose content starts at `content`, accounting for
/// nested tables. A truncated document ends the table at end of input.
fn table_end(lower: &str, content: usize) -> usize {
    let mut depth = 1usize;
    let mut pos = content;
    loop {
        let open = find_open(lower, "table", pos);
        let close = find_close(lower, "table", pos);
        match (open, close) {
            (Some((o, oc)), Some((c, _))) if o < c => {
                depth += 1;
                pos = oc;
            }
            (_, Some((c, ce))) => {
                depth -= 1;
                if depth == 0 {
                    return c;
                }
                pos = ce;
            }
            (_, None) => return lower.len(),
        }
    }
}

/// Content of the `n`-th (1-based) `<table>` in document order, or `None`
/// if the document has fewer tables. Nested tables count towards `n` in the
/// order their open tags appear, matching XPath's `//table[n]`.
pub fn nth_table(document: &str, n: usize) -> Option<&str> {
    let lower = document.to_ascii_lowercase();
    let mut from = 0;
    let mut seen = 0;
    loop {
        let (_, content) = find_open(&lower, "table", from)?;
        seen += 1;
        if seen == n {
            let end = table_end(&lower, content);
            return Some(&document[content..end]);
        }
        from = content;
    }
}

/// Content of the first `<name>` element in `s`, ending at its close tag or
/// at end of input when the close tag is missing.
pub fn first_region<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    let lower = s.to_ascii_lowercase();
    let (_, content) = find_open(&lower, name, 0)?;
    let end = match find_close(&lower, name, content) {
        Some((start, _)) => start,
        None => s.len(),
    };
    Some(&s[content..end])
}

/// Contents of every `<name>` element in `s`, in document order.
///
/// Lenient about vintage markup: an element with no close tag ends at the
/// next sibling open tag or at end of input.
pub fn regions<'a>(s: &'a str, name: &str) -> Vec<&'a str> {
    let lower = s.to_ascii_lowercase();
    let mut out = Vec::new();
    let mut from = 0;

    while let Some((_, content)) = find_open(&lower, name, from) {
        let close = find_close(&lower, name, content);
        let next_open = find_open(&lower, name, content).map(|(start, _)| start);

        let end = match (close, next_open) {
            (Some((c, _)), Some(n)) => c.min(n),
            (Some((c, _)), None) => c,
            (None, Some(n)) => n,
            (None, None) => s.len(),
        };
        out.push(&s[content..end]);

        from = match close {
            Some((c, ce)) if c == end => ce,
            _ => end,
        };
        if from >= s.len() {
            break;
        }
    }

    out
}

/// Flatten an element's markup to its text content: descendant tags are
/// dropped, the handful of entities modem pages actually use are decoded,
/// and whitespace runs collapse to a single space.
pub fn flatten_text(s: &str) -> String {
    let mut text = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    normalize_ws(&text)
}

/// Collapse whitespace runs to one space and trim the ends.
fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}
