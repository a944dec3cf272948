//! Translation phases 1 and 2, as described in section 5.1.1.2 of C17.
//!
//! Both phases rewrite the source bytes. To report diagnostics against the text the user actually
//! wrote, every rewritten buffer carries a position map: `positions[i]` is the offset in the
//! original source of the byte at offset `i` of the rewritten buffer. The map has one extra entry
//! so the end of a span can be mapped too.

/// A rewritten source buffer and its position map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub bytes: Vec<u8>,
    pub positions: Vec<usize>,
}

impl Normalized {
    /// Wrap bytes that have not been rewritten yet.
    pub fn identity(source: &[u8]) -> Self {
        Self {
            bytes: source.to_vec(),
            positions: (0..=source.len()).collect(),
        }
    }

    /// Map an offset of the rewritten buffer back to the original source.
    pub fn original_offset(&self, offset: usize) -> usize {
        self.positions
            .get(offset)
            .or(self.positions.last())
            .copied()
            .unwrap_or_default()
    }
}

/// Run phases 1 and 2 over `source`.
pub fn normalize(source: &[u8], trigraphs: bool) -> Normalized {
    let input = Normalized::identity(source);
    let input = if trigraphs {
        replace_trigraphs(input)
    } else {
        input
    };
    splice_lines(input)
}

/// The replacement for the trigraph `??byte`, as listed in section 5.2.1.1 of C17.
fn trigraph(byte: u8) -> Option<u8> {
    Some(match byte {
        b'=' => b'#',
        b'(' => b'[',
        b'/' => b'\\',
        b')' => b']',
        b'\'' => b'^',
        b'<' => b'{',
        b'!' => b'|',
        b'>' => b'}',
        b'-' => b'~',
        _ => return None,
    })
}

/// Replace every trigraph sequence by the single byte it stands for.
pub fn replace_trigraphs(input: Normalized) -> Normalized {
    let Normalized { bytes, positions } = input;
    let mut output = Normalized {
        bytes: Vec::with_capacity(bytes.len()),
        positions: Vec::with_capacity(positions.len()),
    };

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'?' && bytes.get(i + 1) == Some(&b'?') {
            if let Some(replacement) = bytes.get(i + 2).copied().and_then(trigraph) {
                output.bytes.push(replacement);
                output.positions.push(positions[i]);
                i += 3;
                continue;
            }
        }
        output.bytes.push(bytes[i]);
        output.positions.push(positions[i]);
        i += 1;
    }
    output.positions.push(positions[bytes.len()]);

    output
}

/// Delete every backslash immediately followed by a new-line, joining physical source lines into
/// logical ones. A `\r\n` line ending counts as a new-line here.
pub fn splice_lines(input: Normalized) -> Normalized {
    let Normalized { bytes, positions } = input;
    let mut output = Normalized {
        bytes: Vec::with_capacity(bytes.len()),
        positions: Vec::with_capacity(positions.len()),
    };

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            match (bytes.get(i + 1), bytes.get(i + 2)) {
                (Some(b'\n'), _) => {
                    i += 2;
                    continue;
                }
                (Some(b'\r'), Some(b'\n')) => {
                    i += 3;
                    continue;
                }
                _ => {}
            }
        }
        output.bytes.push(bytes[i]);
        output.positions.push(positions[i]);
        i += 1;
    }
    output.positions.push(positions[bytes.len()]);

    output
}

/// The offset at which every physical line of `source` starts.
pub fn line_starts(source: &[u8]) -> Vec<usize> {
    std::iter::once(0)
        .chain(
            source
                .iter()
                .enumerate()
                .filter(|(_, byte)| **byte == b'\n')
                .map(|(i, _)| i + 1),
        )
        .collect()
}

/// Turn an offset into a 1-based `(line, column)` pair using the output of [`line_starts`].
pub fn line_column(line_starts: &[usize], offset: usize) -> (usize, usize) {
    let line = match line_starts.binary_search(&offset) {
        Ok(line) => line,
        Err(next) => next - 1,
    };
    (line + 1, offset - line_starts[line] + 1)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn trigraphs_are_replaced() {
        let output = replace_trigraphs(Normalized::identity(b"??=define X ??- 1"));
        assert_eq!(output.bytes, b"#define X ~ 1");
        assert_eq!(output.original_offset(0), 0);
        assert_eq!(output.original_offset(1), 3);
        assert_eq!(output.original_offset(output.bytes.len()), 17);
    }

    #[test]
    fn unknown_trigraph_is_kept() {
        let output = replace_trigraphs(Normalized::identity(b"a ??? b"));
        assert_eq!(output.bytes, b"a ??? b");
    }

    #[test]
    fn trigraph_backslash_splices() {
        let output = normalize(b"#define A 1 ??/\n + 2\n", true);
        assert_eq!(output.bytes, b"#define A 1  + 2\n");
    }

    #[test]
    fn escaped_newlines_are_removed() {
        let output = splice_lines(Normalized::identity(b"ab\\\ncd\\\r\nef\\g"));
        assert_eq!(output.bytes, b"abcdef\\g");
        assert_eq!(output.original_offset(2), 4);
        assert_eq!(output.original_offset(4), 9);
    }

    #[test]
    fn lines_and_columns() {
        let starts = line_starts(b"a\nbc\n\nd");
        assert_eq!(starts, vec![0, 2, 5, 6]);
        assert_eq!(line_column(&starts, 0), (1, 1));
        assert_eq!(line_column(&starts, 3), (2, 2));
        assert_eq!(line_column(&starts, 6), (4, 1));
    }
}
