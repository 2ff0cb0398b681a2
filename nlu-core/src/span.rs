//! # Span alignment
//!
//! Maps a character-offset entity annotation onto the range of token indices
//! it covers. The contract assumes tokens were produced from the sentence by
//! rejoining on a single space and re-splitting, so counting space-separated
//! chunks of the text *before* the span gives the index of its first token.
//!
//! ## Offset arithmetic
//!
//! For an annotation `{begin, end}` over `text`:
//!
//! ```text
//! prefix           = text[0 .. begin-1]        (note the one-char back-off)
//! first            = count(split(prefix, ' '))
//! span_text        = text[begin .. end]
//! covered          = first ..= first + count(split(span_text, ' ')) - 1
//! ```
//!
//! The `begin-1` upper bound and the `split` semantics (an empty string and a
//! trailing separator both contribute an empty chunk) are load-bearing: they
//! are what makes the arithmetic land on the right token when `begin` points
//! at a token start. This is legacy arithmetic kept for compatibility with
//! existing annotation data; it is isolated here so callers never touch it
//! and it can be swapped for a char-to-token index map later.
//!
//! Offsets are **character** offsets, not byte offsets.

use crate::error::SpanError;

/// Inclusive range of token indices covered by an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    /// Index of the first covered token (gets the `B-` label).
    pub first: usize,
    /// Index of the last covered token, inclusive (`I-` labels after `first`).
    pub last: usize,
}

impl TokenSpan {
    /// Iterator over the covered token indices.
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        self.first..=self.last
    }
}

/// Byte offset of the `char_pos`-th character. `char_pos` may equal the
/// character count (yielding `text.len()`); anything further is `None`.
fn byte_offset(text: &str, char_pos: usize) -> Option<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .nth(char_pos)
}

/// Slice `text` by character positions `[start, end)`.
fn char_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    let byte_start = byte_offset(text, start)?;
    let byte_end = byte_offset(text, end)?;
    text.get(byte_start..byte_end)
}

/// Number of chunks produced by splitting on a single space.
///
/// Matches the split convention of the annotation source: `""` counts as one
/// chunk and a trailing space contributes an extra empty chunk.
fn space_chunks(s: &str) -> usize {
    s.split(' ').count()
}

/// Resolve an annotation's character offsets to the token indices it covers.
///
/// `token_count` is the length of the tokenized sentence. Fails with
/// [`SpanError`] when the offsets are unresolvable: `begin == 0` (the
/// back-off has nothing to slice), `begin > end`, `end` past the text, or a
/// resolved index past `token_count`. Pure computation, no side effects.
pub fn align(
    text: &str,
    token_count: usize,
    begin: usize,
    end: usize,
) -> Result<TokenSpan, SpanError> {
    let prefix_end = begin
        .checked_sub(1)
        .ok_or(SpanError::InvalidOffsets { begin, end })?;
    if begin > end {
        return Err(SpanError::InvalidOffsets { begin, end });
    }
    let len = text.chars().count();
    if end > len {
        return Err(SpanError::OutOfText { end, len });
    }

    // prefix_end <= end <= len, so both slices are in range.
    let prefix = char_slice(text, 0, prefix_end).ok_or(SpanError::OutOfText { end, len })?;
    let span_text = char_slice(text, begin, end).ok_or(SpanError::OutOfText { end, len })?;

    let first = space_chunks(prefix);
    let last = first + space_chunks(span_text) - 1;
    if last >= token_count {
        return Err(SpanError::OutOfTokens {
            first,
            last,
            token_count,
        });
    }
    Ok(TokenSpan { first, last })
}
