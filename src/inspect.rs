//! Byte level view of a binary, for diagnostics. Nothing is decoded.

/// Renders `bytes` as space separated two digit uppercase hex, in file order.
pub fn render_hex(bytes: &[u8]) -> String {
  bytes
    .iter()
    .map(|byte| format!("{:02X}", byte))
    .collect::<Vec<String>>()
    .join(" ")
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn renders_bytes(){
    assert_eq!(render_hex(&[0x1B, 0x00, 0x00, 0x2A]), "1B 00 00 2A");
    assert_eq!(render_hex(&[0xff, 0x0a, 0x15]), "FF 0A 15");
  }

  #[test]
  fn empty_input(){
    assert_eq!(render_hex(&[]), "");
  }
}
