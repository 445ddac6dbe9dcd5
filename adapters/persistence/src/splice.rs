//! In-place edits of JSON text that leave every unrelated byte untouched.
//!
//! The scanner assumes the text already parsed as valid JSON; it only
//! records where values start and end.

use std::ops::Range;

struct Member {
    key: Range<usize>,
    value: Range<usize>,
}

struct Scanner<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Scanner<'a> {
    fn at(text: &'a str, position: usize) -> Self {
        Self {
            bytes: text.as_bytes(),
            position,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.position).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.position += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Option<()> {
        self.skip_whitespace();
        if self.peek()? != byte {
            return None;
        }
        self.position += 1;
        Some(())
    }

    fn value(&mut self) -> Option<Range<usize>> {
        self.skip_whitespace();
        let start = self.position;
        match self.peek()? {
            b'"' => return self.string(),
            b'{' | b'[' => self.container()?,
            _ => {
                while !matches!(
                    self.peek(),
                    None | Some(b',' | b'}' | b']' | b' ' | b'\t' | b'\r' | b'\n')
                ) {
                    self.position += 1;
                }
            }
        }
        (self.position > start).then_some(start..self.position)
    }

    fn string(&mut self) -> Option<Range<usize>> {
        let start = self.position;
        self.expect(b'"')?;
        loop {
            match self.peek()? {
                b'\\' => self.position += 2,
                b'"' => {
                    self.position += 1;
                    return Some(start..self.position);
                }
                _ => self.position += 1,
            }
        }
    }

    fn container(&mut self) -> Option<()> {
        let mut depth = 0usize;
        loop {
            match self.peek()? {
                b'"' => {
                    let _ = self.string()?;
                    continue;
                }
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        self.position += 1;
                        return Some(());
                    }
                }
                _ => {}
            }
            self.position += 1;
        }
    }

    fn members(&mut self) -> Option<Vec<Member>> {
        self.expect(b'{')?;
        let mut members = Vec::new();
        self.skip_whitespace();
        if self.peek()? == b'}' {
            return Some(members);
        }

        loop {
            self.skip_whitespace();
            let key = self.string()?;
            self.expect(b':')?;
            let value = self.value()?;
            members.push(Member { key, value });

            self.skip_whitespace();
            match self.peek()? {
                b',' => self.position += 1,
                b'}' => return Some(members),
                _ => return None,
            }
        }
    }
}

fn find<'m>(text: &str, members: &'m [Member], wanted: &str) -> Option<&'m Member> {
    members.iter().rev().find(|member| {
        serde_json::from_str::<String>(&text[member.key.clone()])
            .is_ok_and(|key| key == wanted)
    })
}

/// Sets `key` of the object reached through `parents` to the raw JSON `replacement`.
///
/// An existing value is replaced in place; a missing key is appended after the
/// object's last member. Returns `None` when a parent is missing or not an
/// object.
pub(crate) fn set_member(
    text: &str,
    parents: &[&str],
    key: &str,
    replacement: &str,
) -> Option<String> {
    let mut object = Scanner::at(text, 0).value()?;
    for parent in parents {
        let members = Scanner::at(text, object.start).members()?;
        object = find(text, &members, parent)?.value.clone();
    }

    let members = Scanner::at(text, object.start).members()?;
    let (span, inserted) = match find(text, &members, key) {
        Some(member) => (member.value.clone(), replacement.to_owned()),
        None => {
            let quoted = serde_json::to_string(key).ok()?;
            match members.last() {
                Some(last) => (
                    last.value.end..last.value.end,
                    format!(", {quoted}: {replacement}"),
                ),
                None => (
                    object.start + 1..object.start + 1,
                    format!("{quoted}: {replacement}"),
                ),
            }
        }
    };

    let mut edited = String::with_capacity(text.len() + inserted.len());
    edited.push_str(&text[..span.start]);
    edited.push_str(&inserted);
    edited.push_str(&text[span.end..]);
    Some(edited)
}
