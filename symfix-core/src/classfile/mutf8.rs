//! Modified UTF-8
//!
//! 类文件常量池使用的字符串编码：NUL 编码为 `C0 80`，
//! 补充平面字符编码为两个 3 字节的代理项。

/// 编码为 modified UTF-8
pub fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for unit in text.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

/// 解码 modified UTF-8，非法序列返回 `None`
pub fn decode(bytes: &[u8]) -> Option<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b0 = bytes[i];
        match b0 {
            0x01..=0x7F => {
                units.push(b0 as u16);
                i += 1;
            }
            0xC0..=0xDF => {
                let b1 = continuation(bytes, i + 1)?;
                units.push(((b0 as u16 & 0x1F) << 6) | b1);
                i += 2;
            }
            0xE0..=0xEF => {
                let b1 = continuation(bytes, i + 1)?;
                let b2 = continuation(bytes, i + 2)?;
                units.push(((b0 as u16 & 0x0F) << 12) | (b1 << 6) | b2);
                i += 3;
            }
            _ => return None,
        }
    }

    String::from_utf16(&units).ok()
}

fn continuation(bytes: &[u8], at: usize) -> Option<u16> {
    match bytes.get(at) {
        Some(&b) if b & 0xC0 == 0x80 => Some((b & 0x3F) as u16),
        _ => None,
    }
}
