//! Checks of `{N}` message-format parameters between English and translations.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BraceError {
    #[error("has unclosed brace at character {at}")]
    Unclosed { at: usize },
    #[error("has invalid brace parameter '{body}' at character {at}")]
    Invalid { body: String, at: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("English {0}")]
    Source(BraceError),
    #[error(transparent)]
    Translation(BraceError),
    #[error("{}", describe_mismatch(.missing, .extra))]
    Mismatch { missing: Vec<u32>, extra: Vec<u32> },
}

fn join(nums: &[u32]) -> String {
    nums.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_mismatch(missing: &[u32], extra: &[u32]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("is missing parameter(s): {}", join(missing)));
    }
    if !extra.is_empty() {
        parts.push(format!("has extra parameter(s): {}", join(extra)));
    }
    parts.join("; ")
}

/// Extract the integer parameters of every `{...}` group, in order of appearance.
/// Character positions are 0-based and count chars, not bytes.
pub fn check_braces(s: &str) -> Result<Vec<u32>, BraceError> {
    let chars: Vec<char> = s.chars().collect();
    let mut params = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        if chars[pos] != '{' {
            pos += 1;
            continue;
        }
        let Some(close) = chars[pos + 1..].iter().position(|&c| c == '}') else {
            return Err(BraceError::Unclosed { at: pos });
        };
        let body: String = chars[pos + 1..pos + 1 + close].iter().collect();
        match body.parse::<u32>() {
            Ok(n) if body.chars().all(|c| c.is_ascii_digit()) => params.push(n),
            _ => return Err(BraceError::Invalid { body, at: pos }),
        }
        pos += close + 2;
    }
    Ok(params)
}

/// Compare the parameters of `translation` against `source` as multisets.
pub fn check_params(source: &str, translation: &str) -> Result<(), ParamError> {
    let mut expected = check_braces(source).map_err(ParamError::Source)?;
    let mut actual = check_braces(translation).map_err(ParamError::Translation)?;
    expected.sort_unstable();
    actual.sort_unstable();

    let (mut missing, mut extra) = (Vec::new(), Vec::new());
    let (mut i, mut j) = (0, 0);
    while i < expected.len() || j < actual.len() {
        match (expected.get(i), actual.get(j)) {
            (Some(a), Some(b)) if a == b => {
                i += 1;
                j += 1;
            }
            (Some(a), Some(b)) if a < b => {
                missing.push(*a);
                i += 1;
            }
            (Some(_), Some(b)) => {
                extra.push(*b);
                j += 1;
            }
            (Some(a), None) => {
                missing.push(*a);
                i += 1;
            }
            (None, Some(b)) => {
                extra.push(*b);
                j += 1;
            }
            (None, None) => break,
        }
    }
    if missing.is_empty() && extra.is_empty() {
        Ok(())
    } else {
        Err(ParamError::Mismatch { missing, extra })
    }
}
