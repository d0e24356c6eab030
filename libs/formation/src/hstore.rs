//! hstore text format: `"key1"=>"value1", "key2"=>"value2"`.
//!
//! This is the on-disk representation of composite columns, so external
//! tools reading the database see exactly what [`encode`] writes. The
//! decoder follows `hstore_in`: unquoted keys end at whitespace or `=`,
//! unquoted values at whitespace or `,`, and an unquoted `NULL` value is
//! SQL NULL.

use crate::error::CodecError;

/// Encodes pairs in the order given.
///
/// Keys and values are always quoted; `"` and `\` are backslash-escaped.
pub fn encode<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = String::new();
    for (i, (key, value)) in pairs.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        push_quoted(&mut out, key);
        out.push_str("=>");
        push_quoted(&mut out, value);
    }
    out
}

fn push_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

/// Decodes hstore text into `(key, value)` pairs in input order.
///
/// `None` values are SQL NULLs. Duplicate keys are passed through; callers
/// decide whether they are an error.
pub fn decode(input: &str) -> Result<Vec<(String, Option<String>)>, CodecError> {
    let mut parser = Parser { input, pos: 0 };
    let mut pairs = Vec::new();

    loop {
        parser.skip_whitespace();
        if parser.at_end() {
            break;
        }
        let key = parser.token(Slot::Key)?;

        parser.skip_whitespace();
        if !(parser.eat('=') && parser.eat('>')) {
            return Err(parser.error("expected '=>'"));
        }

        parser.skip_whitespace();
        let value = parser.token(Slot::Value)?;
        let value = if value.is_null() {
            None
        } else {
            Some(value.text)
        };
        pairs.push((key.text, value));

        parser.skip_whitespace();
        match parser.bump() {
            None => break,
            Some(',') => continue,
            Some(_) => return Err(parser.error("expected ',' between pairs")),
        }
    }

    Ok(pairs)
}

#[derive(Clone, Copy)]
enum Slot {
    Key,
    Value,
}

impl Slot {
    fn ends_unquoted(self, c: char) -> bool {
        c.is_whitespace()
            || match self {
                Slot::Key => c == '=',
                Slot::Value => c == ',',
            }
    }
}

struct Token {
    text: String,
    quoted: bool,
}

impl Token {
    fn is_null(&self) -> bool {
        !self.quoted && self.text.eq_ignore_ascii_case("NULL")
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, reason: &'static str) -> CodecError {
        CodecError::Malformed {
            position: self.pos,
            reason,
        }
    }

    fn token(&mut self, slot: Slot) -> Result<Token, CodecError> {
        if self.eat('"') {
            return self.quoted();
        }

        let mut text = String::new();
        while let Some(c) = self.peek() {
            if slot.ends_unquoted(c) {
                break;
            }
            self.bump();
            if c == '\\' {
                match self.bump() {
                    Some(escaped) => text.push(escaped),
                    None => return Err(self.error("dangling escape")),
                }
            } else {
                text.push(c);
            }
        }

        if text.is_empty() {
            return Err(self.error("expected key or value"));
        }

        Ok(Token {
            text,
            quoted: false,
        })
    }

    fn quoted(&mut self) -> Result<Token, CodecError> {
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated quoted string")),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some(escaped) => text.push(escaped),
                    None => return Err(self.error("unterminated quoted string")),
                },
                Some(c) => text.push(c),
            }
        }
        Ok(Token { text, quoted: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, Option<&str>)]) -> Vec<(String, Option<String>)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode(std::iter::empty()), "");
        assert_eq!(
            encode([("web", "./bin/web"), ("worker", "rake jobs:work")]),
            r#""web"=>"./bin/web", "worker"=>"rake jobs:work""#
        );
    }

    #[test]
    fn test_encode_escapes_quotes_and_backslashes() {
        assert_eq!(
            encode([("a\"b", "echo \"hi\" \\n")]),
            r#""a\"b"=>"echo \"hi\" \\n""#
        );
    }

    #[test]
    fn test_decode_postgres_output() {
        let decoded = decode(r#""web"=>"./bin/web", "worker"=>"rake jobs:work""#).unwrap();
        assert_eq!(
            decoded,
            pairs(&[
                ("web", Some("./bin/web")),
                ("worker", Some("rake jobs:work"))
            ])
        );
    }

    #[test]
    fn test_decode_empty_and_whitespace() {
        assert!(decode("").unwrap().is_empty());
        assert!(decode("   ").unwrap().is_empty());
    }

    #[test]
    fn test_decode_unquoted_and_null() {
        let decoded = decode("a=>1 ,b => NULL, c=>\"NULL\"").unwrap();
        assert_eq!(
            decoded,
            pairs(&[("a", Some("1")), ("b", None), ("c", Some("NULL"))])
        );
    }

    #[test]
    fn test_decode_unquoted_terminators() {
        assert_eq!(decode("a=>b>c").unwrap(), pairs(&[("a", Some("b>c"))]));
        assert_eq!(decode("a=>b=c").unwrap(), pairs(&[("a", Some("b=c"))]));
        assert_eq!(
            decode("k>1=>v,w=>x").unwrap(),
            pairs(&[("k>1", Some("v")), ("w", Some("x"))])
        );
        assert_eq!(decode("NULL=>x").unwrap(), pairs(&[("NULL", Some("x"))]));
    }

    #[test]
    fn test_decode_trailing_comma() {
        assert_eq!(decode("\"a\"=>\"b\", ").unwrap(), pairs(&[("a", Some("b"))]));
    }

    #[test]
    fn test_decode_escapes() {
        let decoded = decode(r#""a\"b"=>"x\\y, z=>w""#).unwrap();
        assert_eq!(decoded, pairs(&[("a\"b", Some("x\\y, z=>w"))]));
    }

    #[test]
    fn test_decode_malformed() {
        for input in [
            r#""web"=>"unterminated"#,
            r#""web" "./web""#,
            r#""web"=>"./web" "worker"=>"./worker""#,
            r#"=>"./web""#,
            r#""web"=>"#,
            r#""web"=>"./web",,"#,
            "a=b=>c",
        ] {
            assert!(
                matches!(decode(input), Err(CodecError::Malformed { .. })),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_encode_decode_preserves_pairs() {
        let original = [("we=>b", "a, \"b\""), ("k\\", "")];
        let decoded = decode(&encode(original)).unwrap();
        assert_eq!(
            decoded,
            pairs(&[("we=>b", Some("a, \"b\"")), ("k\\", Some(""))])
        );
    }
}
