//! Field-element packing for blob networks that store data as bn254
//! scalars. Each 31-byte input chunk is written out as a 32-byte symbol with
//! a leading zero byte, which keeps every symbol below the field modulus.

/// Size of one field element on the wire
pub const BYTES_PER_SYMBOL: usize = 32;

const CHUNK_SIZE: usize = BYTES_PER_SYMBOL - 1;

/// Insert a zero byte in front of every 31-byte chunk. The last chunk is
/// not right-padded, so the output length is `len + ceil(len / 31)`.
pub fn pack(data: &[u8]) -> Vec<u8> {
    let symbols = data.len().div_ceil(CHUNK_SIZE);
    let mut out = Vec::with_capacity(data.len() + symbols);
    for chunk in data.chunks(CHUNK_SIZE) {
        out.push(0x00);
        out.extend_from_slice(chunk);
    }
    out
}

/// Drop the leading byte of every 32-byte symbol. Total over any input;
/// `unpack(pack(x)) == x` for every `x`.
pub fn unpack(data: &[u8]) -> Vec<u8> {
    let symbols = data.len().div_ceil(BYTES_PER_SYMBOL);
    let mut out = Vec::with_capacity(data.len().saturating_sub(symbols));
    for symbol in data.chunks(BYTES_PER_SYMBOL) {
        out.extend_from_slice(&symbol[1..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn test_round_trip_across_chunk_boundaries() {
        for len in [0, 1, 30, 31, 32, 61, 62, 63, 1000] {
            let data = sample(len);
            assert_eq!(unpack(&pack(&data)), data, "len {len}");
        }
    }

    #[test]
    fn test_pack_layout() {
        let data = sample(40);
        let packed = pack(&data);
        assert_eq!(packed.len(), 42);
        assert_eq!(packed[0], 0x00);
        assert_eq!(&packed[1..32], &data[..31]);
        assert_eq!(packed[32], 0x00);
        assert_eq!(&packed[33..], &data[31..]);
    }

    #[test]
    fn test_every_full_symbol_starts_with_zero() {
        let data = vec![0xff; 31 * 4];
        let packed = pack(&data);
        assert_eq!(packed.len(), 32 * 4);
        for symbol in packed.chunks(BYTES_PER_SYMBOL) {
            assert_eq!(symbol[0], 0x00);
            assert!(symbol[1..].iter().all(|&b| b == 0xff));
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(pack(&[]).is_empty());
        assert!(unpack(&[]).is_empty());
    }

    #[test]
    fn test_unpack_lone_padding_byte() {
        // a trailing symbol of only the padding byte yields nothing
        let mut packed = pack(&sample(31));
        packed.push(0x00);
        assert_eq!(unpack(&packed), sample(31));
    }
}
