//! The 16-bit one's-complement Internet checksum (RFC 1071).
//! 16 位反码互联网校验和 (RFC 1071)。

/// Computes the Internet checksum over `data`.
///
/// Consecutive big-endian 16-bit words are summed with end-around carry, an
/// odd trailing byte is padded with a zero byte on the right, and the
/// one's-complement of the folded sum is returned. A result of `0x0000` is
/// reported as `0xFFFF`, so a valid checksum field is never zero.
///
/// The caller must zero any checksum field inside `data` beforehand.
///
/// 计算 `data` 的互联网校验和。调用方必须先将 `data` 中的校验和字段清零。
pub fn internet_checksum(data: &[u8]) -> u16 {
    // A u64 accumulator cannot overflow for any slice that fits in memory.
    let mut chunks = data.chunks_exact(2);
    let mut sum: u64 = chunks
        .by_ref()
        .map(|word| u64::from(u16::from_be_bytes([word[0], word[1]])))
        .sum();
    if let [last] = chunks.remainder() {
        sum += u64::from(*last) << 8;
    }

    while sum > 0xffff {
        sum = (sum & 0xffff) + (sum >> 16);
    }

    match !(sum as u16) {
        0 => 0xffff,
        folded => folded,
    }
}
