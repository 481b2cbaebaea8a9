//! IPv6 address canonicalization.
//!
//! Canonical form is 8 colon-separated groups of exactly 4 lowercase
//! hex digits (39 characters). Because every group is zero-padded to
//! equal width, plain lexicographic comparison of canonical strings
//! matches numeric comparison of the underlying 128-bit values. That
//! invariant is what lets the rest of the pipeline sort and merge
//! addresses as strings.

use memchr::memmem;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while counting distinct addresses.
#[derive(Error, Debug)]
pub enum CountError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("input file not found: {path}")]
    MissingInput { path: PathBuf },

    #[error("malformed address at line {line}: '{address}'")]
    MalformedAddress { line: usize, address: String },
}

pub type Result<T> = std::result::Result<T, CountError>;

/// Number of groups in a fully expanded address.
const GROUP_COUNT: usize = 8;

/// Width every group is padded to.
const GROUP_WIDTH: usize = 4;

/// Length of a canonical address: 8 groups of 4 digits plus 7 colons.
pub const CANONICAL_LEN: usize = GROUP_COUNT * GROUP_WIDTH + (GROUP_COUNT - 1);

/// Canonicalize an IPv6 address string.
///
/// Lowercases the input, expands a "::" zero-run into the missing
/// all-zero groups, left-pads every group to 4 digits and joins with
/// ':'. This is best-effort: input that does not decompose into a
/// clean 8-group structure still produces *some* output, which may be
/// semantically wrong. Use [`is_well_formed`] first when that matters.
pub fn canonicalize(addr: &str) -> String {
    let addr = addr.to_ascii_lowercase();

    let mut out = String::with_capacity(CANONICAL_LEN);
    if memmem::find(addr.as_bytes(), b"::").is_some() {
        // Splitting on ':' turns the zero-run marker into an empty
        // token ("::1" -> ["", "", "1"]); the first empty token marks
        // the run position. Non-empty tokens strictly before it form
        // the left groups, non-empty tokens after it the right groups.
        let parts: Vec<&str> = addr.split(':').collect();
        let marker = parts
            .iter()
            .position(|p| p.is_empty())
            .unwrap_or(parts.len());

        let left: Vec<&str> = parts[..marker]
            .iter()
            .copied()
            .filter(|p| !p.is_empty())
            .collect();
        let right: Vec<&str> = parts[(marker + 1).min(parts.len())..]
            .iter()
            .copied()
            .filter(|p| !p.is_empty())
            .collect();

        let missing = GROUP_COUNT.saturating_sub(left.len() + right.len());
        let groups = left
            .into_iter()
            .chain(std::iter::repeat("0").take(missing))
            .chain(right);
        join_padded(&mut out, groups);
    } else {
        join_padded(&mut out, addr.split(':'));
    }
    out
}

/// Pad each group to 4 digits and join with ':'.
fn join_padded<'a, I: Iterator<Item = &'a str>>(out: &mut String, groups: I) {
    for (i, group) in groups.enumerate() {
        if i > 0 {
            out.push(':');
        }
        for _ in group.len()..GROUP_WIDTH {
            out.push('0');
        }
        out.push_str(group);
    }
}

/// Check that an address decomposes into a clean 8-group structure.
///
/// Accepts at most one zero-run marker, requires every explicit group
/// to be 1-4 hex digits, and requires the expanded group count to be
/// exactly 8 (a marker must stand for at least one omitted group).
/// Case-insensitive. This is the structural check behind strict mode;
/// it does not attempt full RFC 4291 validation (no embedded IPv4
/// forms, no zone indices).
pub fn is_well_formed(addr: &str) -> bool {
    let bytes = addr.as_bytes();
    match memmem::find(bytes, b"::") {
        Some(pos) => {
            // A second marker (including ":::") is malformed.
            if memmem::find(&bytes[pos + 1..], b"::").is_some() {
                return false;
            }
            let left = &addr[..pos];
            let right = &addr[pos + 2..];
            let left_count = match count_groups(left) {
                Some(n) => n,
                None => return false,
            };
            let right_count = match count_groups(right) {
                Some(n) => n,
                None => return false,
            };
            // The marker must replace at least one group.
            left_count + right_count < GROUP_COUNT
        }
        None => {
            let mut count = 0;
            for group in addr.split(':') {
                if !is_group(group) {
                    return false;
                }
                count += 1;
            }
            count == GROUP_COUNT
        }
    }
}

/// Count the groups in one side of a zero-run marker.
/// Returns None if any group is invalid or a stray ':' leaves an
/// empty token (e.g. ":1::2").
fn count_groups(side: &str) -> Option<usize> {
    if side.is_empty() {
        return Some(0);
    }
    let mut count = 0;
    for group in side.split(':') {
        if !is_group(group) {
            return None;
        }
        count += 1;
    }
    Some(count)
}

fn is_group(group: &str) -> bool {
    !group.is_empty()
        && group.len() <= GROUP_WIDTH
        && group.bytes().all(|b| b.is_ascii_hexdigit())
}
