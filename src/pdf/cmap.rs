//! ToUnicode CMap parsing.
//!
//! Only the pieces needed to turn character codes into text are supported:
//! `codespacerange`, `bfchar` and `bfrange` (including the array form).

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Word(String),
    ArrayStart,
    ArrayEnd,
}

#[derive(Debug, Clone)]
struct CodeSpace {
    low: Vec<u8>,
    high: Vec<u8>,
}

impl CodeSpace {
    fn matches(&self, bytes: &[u8]) -> bool {
        bytes.len() >= self.low.len()
            && self
                .low
                .iter()
                .zip(&self.high)
                .zip(bytes)
                .all(|((lo, hi), b)| lo <= b && b <= hi)
    }
}

#[derive(Debug, Clone)]
enum RangeTarget {
    /// Destination of the first code; later codes increment the last UTF-16 unit.
    Offset(Vec<u16>),
    Explicit(Vec<String>),
}

#[derive(Debug, Clone)]
struct BfRange {
    low: u32,
    high: u32,
    target: RangeTarget,
}

#[derive(Debug, Clone, Default)]
pub struct CMap {
    codespaces: Vec<CodeSpace>,
    chars: HashMap<u32, String>,
    ranges: Vec<BfRange>,
}

impl CMap {
    pub fn parse(data: &[u8]) -> Self {
        let tokens = tokenize(data);
        let mut cmap = CMap::default();
        let mut i = 0;

        while i < tokens.len() {
            match &tokens[i] {
                Token::Word(w) if w == "begincodespacerange" => {
                    i += 1;
                    while let (Some(Token::Hex(low)), Some(Token::Hex(high))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        cmap.codespaces.push(CodeSpace {
                            low: low.clone(),
                            high: high.clone(),
                        });
                        i += 2;
                    }
                }
                Token::Word(w) if w == "beginbfchar" => {
                    i += 1;
                    while let (Some(Token::Hex(src)), Some(Token::Hex(dst))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        cmap.chars.insert(code_value(src), utf16_be(dst));
                        i += 2;
                    }
                }
                Token::Word(w) if w == "beginbfrange" => {
                    i += 1;
                    loop {
                        let (Some(Token::Hex(low)), Some(Token::Hex(high))) =
                            (tokens.get(i), tokens.get(i + 1))
                        else {
                            break;
                        };
                        let (low, high) = (code_value(low), code_value(high));
                        match tokens.get(i + 2) {
                            Some(Token::Hex(dst)) => {
                                cmap.ranges.push(BfRange {
                                    low,
                                    high,
                                    target: RangeTarget::Offset(utf16_units(dst)),
                                });
                                i += 3;
                            }
                            Some(Token::ArrayStart) => {
                                let mut values = Vec::new();
                                i += 3;
                                while let Some(Token::Hex(dst)) = tokens.get(i) {
                                    values.push(utf16_be(dst));
                                    i += 1;
                                }
                                if tokens.get(i) == Some(&Token::ArrayEnd) {
                                    i += 1;
                                }
                                cmap.ranges.push(BfRange {
                                    low,
                                    high,
                                    target: RangeTarget::Explicit(values),
                                });
                            }
                            _ => break,
                        }
                    }
                }
                _ => i += 1,
            }
        }

        cmap
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty() && self.ranges.is_empty()
    }

    pub fn lookup(&self, code: u32) -> Option<String> {
        if let Some(s) = self.chars.get(&code) {
            return Some(s.clone());
        }
        self.ranges
            .iter()
            .find(|r| r.low <= code && code <= r.high)
            .and_then(|r| {
                let offset = (code - r.low) as usize;
                match &r.target {
                    RangeTarget::Offset(units) => {
                        let mut units = units.clone();
                        let last = units.last_mut()?;
                        *last = last.wrapping_add(offset as u16);
                        Some(String::from_utf16_lossy(&units))
                    }
                    RangeTarget::Explicit(values) => values.get(offset).cloned(),
                }
            })
    }

    /// Decodes a string operand into `(code, text)` pairs.
    ///
    /// Codes without a mapping come out as U+FFFD so that a missing glyph still
    /// separates its neighbours. A one-byte space code is the exception.
    pub fn decode(&self, bytes: &[u8]) -> Vec<(u32, String)> {
        self.split_codes(bytes, 2)
            .into_iter()
            .map(|(code, len)| {
                let text = self.lookup(code).unwrap_or_else(|| {
                    if len == 1 && code == 0x20 {
                        " ".to_string()
                    } else {
                        char::REPLACEMENT_CHARACTER.to_string()
                    }
                });
                (code, text)
            })
            .collect()
    }

    /// Splits a string operand into `(code, byte length)` pairs.
    fn split_codes(&self, bytes: &[u8], default_len: usize) -> Vec<(u32, usize)> {
        let mut codes = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            let rest = &bytes[i..];
            let len = self
                .codespaces
                .iter()
                .find(|cs| cs.matches(rest))
                .map(|cs| cs.low.len())
                .unwrap_or(default_len)
                .clamp(1, 4)
                .min(rest.len());
            codes.push((code_value(&rest[..len]), len));
            i += len;
        }
        codes
    }
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => u16::from(*single),
            _ => 0,
        })
        .collect()
}

fn utf16_be(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let c = data[i];
        match c {
            b'<' if data.get(i + 1) == Some(&b'<') => {
                tokens.push(Token::Word("<<".to_string()));
                i += 2;
            }
            b'<' => {
                let start = i + 1;
                let end = data[start..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map(|p| start + p)
                    .unwrap_or(data.len());
                tokens.push(Token::Hex(decode_hex(&data[start..end])));
                i = end + 1;
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'(' => {
                // Literal strings only appear in CMap metadata; skip them.
                let mut depth = 0;
                while i < data.len() {
                    match data[i] {
                        b'\\' => i += 1,
                        b'(' => depth += 1,
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                i += 1;
            }
            _ if c.is_ascii_whitespace() || c == b'>' => i += 1,
            _ => {
                let start = i;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !matches!(data[i], b'<' | b'[' | b']' | b'(' | b'%')
                {
                    i += 1;
                }
                if i == start {
                    i += 1;
                    continue;
                }
                tokens.push(Token::Word(
                    String::from_utf8_lossy(&data[start..i]).into_owned(),
                ));
            }
        }
    }

    tokens
}

fn decode_hex(digits: &[u8]) -> Vec<u8> {
    let nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|&d| (d as char).to_digit(16).map(|v| v as u8))
        .collect();
    nibbles
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => (hi << 4) | lo,
            [hi] => hi << 4,
            _ => 0,
        })
        .collect()
}
