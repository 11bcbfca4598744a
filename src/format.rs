//! CPF/CNPJ input masking.
//!
//! DESIGN
//! ======
//! Masking is a pure transformation: strip everything that is not an ASCII
//! digit, cap at the document type's length, then insert separators by
//! position. Because the digits are re-extracted on every call, formatting an
//! already formatted value is a no-op.

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;

use serde::{Deserialize, Serialize};

pub const CPF_DIGITS: usize = 11;
pub const CNPJ_DIGITS: usize = 14;

/// Brazilian taxpayer document type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    /// Individual taxpayer, `000.000.000-00`.
    #[default]
    #[serde(rename = "CPF")]
    Cpf,
    /// Company taxpayer, `00.000.000/0000-00`.
    #[serde(rename = "CNPJ")]
    Cnpj,
}

impl DocumentKind {
    /// Pick the document type implied by a digit count.
    #[must_use]
    pub fn detect(digit_count: usize) -> Self {
        if digit_count <= CPF_DIGITS { Self::Cpf } else { Self::Cnpj }
    }

    #[must_use]
    pub fn max_digits(self) -> usize {
        match self {
            Self::Cpf => CPF_DIGITS,
            Self::Cnpj => CNPJ_DIGITS,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cpf => "CPF",
            Self::Cnpj => "CNPJ",
        }
    }

    /// Parse `cpf`/`cnpj` in any case.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CPF" => Some(Self::Cpf),
            "CNPJ" => Some(Self::Cnpj),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keep only ASCII digits.
#[must_use]
pub fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Mask `input` as a CPF, `000.000.000-00`.
#[must_use]
pub fn format_cpf(input: &str) -> String {
    mask(input, CPF_DIGITS, |i| match i {
        3 | 6 => Some('.'),
        9 => Some('-'),
        _ => None,
    })
}

/// Mask `input` as a CNPJ, `00.000.000/0000-00`.
#[must_use]
pub fn format_cnpj(input: &str) -> String {
    mask(input, CNPJ_DIGITS, |i| match i {
        2 | 5 => Some('.'),
        8 => Some('/'),
        12 => Some('-'),
        _ => None,
    })
}

/// Mask `input` as whichever document type its digit count implies.
#[must_use]
pub fn format_document(input: &str) -> String {
    let count = input.chars().filter(char::is_ascii_digit).count();
    format_as(DocumentKind::detect(count), input)
}

/// Mask `input` as the given document type.
#[must_use]
pub fn format_as(kind: DocumentKind, input: &str) -> String {
    match kind {
        DocumentKind::Cpf => format_cpf(input),
        DocumentKind::Cnpj => format_cnpj(input),
    }
}

/// Insert `separator_before(i)` ahead of the digit at index `i`.
fn mask(input: &str, max_digits: usize, separator_before: impl Fn(usize) -> Option<char>) -> String {
    let mut out = String::with_capacity(max_digits + 4);
    for (i, digit) in input.chars().filter(char::is_ascii_digit).take(max_digits).enumerate() {
        if let Some(sep) = separator_before(i) {
            out.push(sep);
        }
        out.push(digit);
    }
    out
}
