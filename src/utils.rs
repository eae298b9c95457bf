use anyhow::Context;

/// Format bytes as a `0x`-prefixed lowercase hex string
pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse hex with or without a `0x` prefix
pub fn parse_hex(s: &str) -> anyhow::Result<Vec<u8>> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(digits).context("Invalid hex string")
}

/// Short blake3 digest used to identify payloads in logs
pub fn blob_digest(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    hash.to_hex()[..16].to_string()
}
