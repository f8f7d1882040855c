/// 导出 CSV 用：非空字段一律加双引号，内部双引号加倍；空值输出为空字段
pub fn quote_field(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => format!("\"{}\"", v.replace('"', "\"\"")),
        _ => String::new(),
    }
}

/// 把一行字段拼成以 `\n` 结尾的 CSV 行
pub fn write_row(out: &mut String, fields: &[String]) {
    out.push_str(&fields.join(","));
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_field() {
        assert_eq!(quote_field(Some("Ana")), "\"Ana\"");
        assert_eq!(quote_field(Some("Calle Mayor, 3")), "\"Calle Mayor, 3\"");
        assert_eq!(quote_field(Some("say \"hi\"")), "\"say \"\"hi\"\"\"");
        assert_eq!(quote_field(Some("")), "");
        assert_eq!(quote_field(None), "");
    }

    #[test]
    fn test_write_row() {
        let mut out = String::new();
        write_row(&mut out, &[quote_field(Some("a")), quote_field(None), "2026-01-01".into()]);
        assert_eq!(out, "\"a\",,2026-01-01\n");
    }
}
