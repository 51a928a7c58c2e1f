//! Port-expression grammar: the same bracket/negation/range grammar as
//! address expressions, but over integer ports instead of IP literals.
//! Attached to address ranges as [`crate::addr::AddrRange::ports`].

use crate::error::{RuleError, RuleResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    pub lo: u16,
    pub hi: u16,
}

impl PortRange {
    pub fn single(port: u16) -> Self {
        Self { lo: port, hi: port }
    }

    pub fn contains(&self, port: u16) -> bool {
        self.lo <= port && port <= self.hi
    }
}

/// Parses `expr:= atom | '[' list ']' | '!' expr`, where `atom` is an
/// integer, an integer range `n1-n2`, or `any`. Negation is not supported
/// on ports in this core (the grammar only extends the address negation
/// rule to integer ranges); a leading `!` is rejected.
pub fn parse_port_expr(input: &str) -> RuleResult<Vec<PortRange>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(RuleError::InvalidPort("empty port expression".into()));
    }
    if let Some(stripped) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let mut out = Vec::new();
        for part in split_top_level(stripped) {
            out.extend(parse_port_expr(part)?);
        }
        return Ok(out);
    }
    if trimmed.eq_ignore_ascii_case("any") {
        return Ok(vec![PortRange { lo: 0, hi: u16::MAX }]);
    }
    if let Some((lo, hi)) = trimmed.split_once('-') {
        let lo: u16 = lo
            .trim()
            .parse()
            .map_err(|_| RuleError::InvalidPort(trimmed.to_string()))?;
        let hi: u16 = hi
            .trim()
            .parse()
            .map_err(|_| RuleError::InvalidPort(trimmed.to_string()))?;
        if lo > hi {
            return Err(RuleError::InvalidPort(trimmed.to_string()));
        }
        return Ok(vec![PortRange { lo, hi }]);
    }
    let port: u16 = trimmed
        .parse()
        .map_err(|_| RuleError::InvalidPort(trimmed.to_string()))?;
    Ok(vec![PortRange::single(port)])
}

/// Splits a comma-separated list at the top bracket level only (nested
/// `[...]` are kept intact), mirroring `list:= expr (',' expr)*`.
pub(crate) fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in input.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(input[start..].trim());
    parts
}
