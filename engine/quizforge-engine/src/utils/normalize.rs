/// Canonical form used for every answer comparison. Answers are authored
/// and entered in a mixed-punctuation, mixed-language environment, so
/// superficially different but identical strings must compare equal
/// without a judge round-trip.
///
/// Rules, in order: trim, drop every internal whitespace run, uppercase,
/// map full-width Chinese punctuation to ASCII, then map the accepted
/// true/false spellings (对/错 and TRUE/FALSE) to 正确/错误.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        if ch.is_whitespace() {
            continue;
        }
        let mapped = match ch {
            '。' => '.',
            '，' => ',',
            '！' => '!',
            '？' => '?',
            '、' => ',',
            '；' => ';',
            '：' => ':',
            '“' | '”' => '"',
            '（' => '(',
            '）' => ')',
            other => other,
        };
        for upper in mapped.to_uppercase() {
            out.push(upper);
        }
    }
    match out.as_str() {
        "对" | "TRUE" => "正确".to_string(),
        "错" | "FALSE" => "错误".to_string(),
        _ => out,
    }
}
