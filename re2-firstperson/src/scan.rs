use crate::error::{Error, Result};

/// Byte pattern with wildcards, parsed from the usual `"8B 87 ? 01"` notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    bytes: Vec<Option<u8>>,
}

impl Pattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut bytes = Vec::new();

        for token in pattern.split_whitespace() {
            if token.chars().all(|c| c == '?') && token.len() <= 2 {
                bytes.push(None);
                continue;
            }

            let byte = u8::from_str_radix(token, 16)
                .ok()
                .filter(|_| token.len() == 2)
                .ok_or_else(|| Error::InvalidPattern {
                    pattern: pattern.to_string(),
                    token: token.to_string(),
                })?;

            bytes.push(Some(byte));
        }

        if bytes.is_empty() {
            return Err(Error::InvalidPattern {
                pattern: pattern.to_string(),
                token: String::new(),
            });
        }

        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn matches_at(&self, haystack: &[u8], offset: usize) -> bool {
        self.bytes
            .iter()
            .zip(&haystack[offset..offset + self.bytes.len()])
            .all(|(expected, actual)| expected.map_or(true, |b| b == *actual))
    }

    /// First match at or after `start`.
    pub fn find(&self, haystack: &[u8], start: usize) -> Option<usize> {
        if self.bytes.len() > haystack.len() {
            return None;
        }

        (start..=haystack.len() - self.bytes.len()).find(|&i| self.matches_at(haystack, i))
    }

    /// All matches, each search resuming one byte past the previous hit.
    pub fn find_iter<'a>(&'a self, haystack: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
        let mut next = Some(0);

        std::iter::from_fn(move || {
            let found = self.find(haystack, next?)?;
            next = Some(found + 1);
            Some(found)
        })
    }
}

/// Resolves the rel32 displacement stored at `disp_offset` (relative to the
/// image start) into an absolute address, given the image's load address.
pub fn relative_target(image: &[u8], base: usize, disp_offset: usize) -> Option<usize> {
    let raw = image.get(disp_offset..disp_offset + 4)?;
    let disp = i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    let next_instruction = base.checked_add(disp_offset + 4)?;

    next_instruction.checked_add_signed(disp as isize)
}
