//! Version probe (§4.D): read the banner line, compute the version
//! number, and decide which v1.2 layout applies.

use crate::byte_source::{read_sized, ByteSource};
use crate::error::{FormatError, Result};
use crate::header::Header;
use crate::record::op;

/// Detected bag version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Version {
    V103,
    V102Indexed,
    V102Unindexed,
}

/// Parse the `#ROS<tag> V<M>.<m>` banner, returning `M*100 + m`.
fn parse_banner(line: &str) -> Result<u16> {
    let line = line.trim_end();
    let rest = line
        .strip_prefix("#ROS")
        .ok_or_else(|| FormatError::InvalidVersionBanner(line.to_string()))?;
    let v_pos = rest
        .rfind(" V")
        .ok_or_else(|| FormatError::InvalidVersionBanner(line.to_string()))?;
    let version_part = &rest[v_pos + 2..];
    let mut it = version_part.splitn(2, '.');
    let major = it.next().unwrap_or_default();
    let minor = it.next().unwrap_or_default();
    if major.len() != 1 || minor.len() != 1 {
        return Err(FormatError::InvalidVersionBanner(line.to_string()).into());
    }
    let major: u16 = major
        .parse()
        .map_err(|_| FormatError::InvalidVersionBanner(line.to_string()))?;
    let minor: u16 = minor
        .parse()
        .map_err(|_| FormatError::InvalidVersionBanner(line.to_string()))?;
    Ok(major * 100 + minor)
}

/// Read the version banner and, for version 102, peek the first
/// record to decide indexed vs. unindexed. Restores the read position
/// to right after the banner before returning.
pub(crate) fn probe(src: &mut dyn ByteSource) -> Result<Version> {
    let line = src.readline()?;
    let version = parse_banner(&line)?;

    match version {
        103 => Ok(Version::V103),
        102 => {
            let pos = src.tell()?;
            let header_buf = read_sized(src)?;
            let header = Header::parse(header_buf)?;
            src.seek_abs(pos)?;
            let op = header.get_u8("op")?;
            if op == op::FILE_HEADER {
                Ok(Version::V102Indexed)
            } else {
                Ok(Version::V102Unindexed)
            }
        }
        other => Err(FormatError::UnsupportedVersion(other).into()),
    }
}
