/// Shell-like argument splitting.
///
/// Whitespace separates arguments outside quotes. Single quotes keep their
/// content verbatim; inside double quotes a backslash escapes the next
/// character. An unterminated quote runs to the end of the input.
pub fn shell_split(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escape_next = false;

    for ch in input.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_double_quote => escape_next = true,
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
                in_token = true;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
                in_token = true;
            }
            c if c.is_whitespace() && !in_single_quote && !in_double_quote => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_token {
        args.push(current);
    }

    args
}
