/// JSON 預處理器，支援 C-style 註解
///
/// 授權人員習慣在技能目錄檔裡寫註解，
/// 解析前先移除 // 單行註解與 /* */ 多行註解
pub struct JsonPreprocessor;

impl JsonPreprocessor {
    /// 移除 JSON 字串中的 C-style 註解
    pub fn remove_comments(json_str: &str) -> String {
        let mut result = String::with_capacity(json_str.len());
        let chars: Vec<char> = json_str.chars().collect();
        let mut i = 0;
        let mut in_string = false;

        while i < chars.len() {
            let c = chars[i];

            if in_string {
                result.push(c);
                if c == '\\' && i + 1 < chars.len() {
                    // 跳脫序列原樣保留
                    result.push(chars[i + 1]);
                    i += 2;
                    continue;
                }
                if c == '"' {
                    in_string = false;
                }
                i += 1;
                continue;
            }

            match c {
                '"' => {
                    in_string = true;
                    result.push(c);
                    i += 1;
                }
                '/' if i + 1 < chars.len() && chars[i + 1] == '/' => {
                    // 單行註解：吃到行尾
                    while i < chars.len() && chars[i] != '\n' {
                        i += 1;
                    }
                }
                '/' if i + 1 < chars.len() && chars[i + 1] == '*' => {
                    // 多行註解：吃到 */
                    i += 2;
                    while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                        i += 1;
                    }
                    i = (i + 2).min(chars.len());
                }
                _ => {
                    result.push(c);
                    i += 1;
                }
            }
        }

        result
    }
}
