use rand::Rng;

/// 兑换码字符集（大写字母 + 数字）
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 生成指定长度的随机兑换码
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// 规范化用户输入：去掉首尾空白并转为大写；结果可能为空串
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}
