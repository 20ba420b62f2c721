//! Minimal HTML-fragment parser and serializer for the memory document.
//!
//! Scoped to the fragments the overlay actually ships: elements, quoted
//! attributes, self-closing and void tags, and text. Not a general HTML
//! parser.

/// Tags serialized without a closing tag.
const VOID_TAGS: &[&str] = &["img", "input", "br", "hr", "meta", "link"];

/// Parsed element tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedElement {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<ParsedElement>,
}

impl ParsedElement {
    fn new(tag: String, attributes: Vec<(String, String)>) -> Self {
        Self {
            tag,
            attributes,
            text: String::new(),
            children: Vec::new(),
        }
    }
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

pub(crate) fn escape_text(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn escape_attribute(raw: &str) -> String {
    escape_text(raw).replace('"', "&quot;")
}

fn unescape(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

/// Parses a markup fragment into its top-level elements.
///
/// Unclosed elements are closed at end of input; a close tag that matches no
/// open element is an error.
pub(crate) fn parse_fragment(markup: &str) -> Result<Vec<ParsedElement>, String> {
    let mut roots = Vec::new();
    let mut stack: Vec<ParsedElement> = Vec::new();
    let chars: Vec<char> = markup.chars().collect();
    let mut pos = 0usize;

    while pos < chars.len() {
        if chars[pos] == '<' {
            if chars[pos..].starts_with(&['<', '!', '-', '-']) {
                pos = skip_comment(&chars, pos)?;
                continue;
            }
            if pos + 1 < chars.len() && chars[pos + 1] == '/' {
                let (tag, next) = read_close_tag(&chars, pos)?;
                let element = stack
                    .pop()
                    .ok_or_else(|| format!("unmatched close tag </{tag}>"))?;
                if element.tag != tag {
                    return Err(format!(
                        "close tag </{tag}> does not match open <{}>",
                        element.tag
                    ));
                }
                attach(&mut roots, &mut stack, element);
                pos = next;
                continue;
            }
            let (element, self_closed, next) = read_open_tag(&chars, pos)?;
            if self_closed || is_void_tag(&element.tag) {
                attach(&mut roots, &mut stack, element);
            } else {
                stack.push(element);
            }
            pos = next;
            continue;
        }

        let start = pos;
        while pos < chars.len() && chars[pos] != '<' {
            pos += 1;
        }
        let text: String = chars[start..pos].iter().collect();
        if !text.trim().is_empty() {
            if let Some(open) = stack.last_mut() {
                open.text.push_str(&unescape(text.trim()));
            }
        }
    }

    while let Some(element) = stack.pop() {
        attach(&mut roots, &mut stack, element);
    }
    Ok(roots)
}

fn attach(roots: &mut Vec<ParsedElement>, stack: &mut [ParsedElement], element: ParsedElement) {
    if let Some(open) = stack.last_mut() {
        open.children.push(element);
    } else {
        roots.push(element);
    }
}

fn skip_comment(chars: &[char], start: usize) -> Result<usize, String> {
    let mut pos = start + 4;
    while pos + 2 < chars.len() {
        if chars[pos] == '-' && chars[pos + 1] == '-' && chars[pos + 2] == '>' {
            return Ok(pos + 3);
        }
        pos += 1;
    }
    Err("unterminated comment".to_string())
}

fn read_close_tag(chars: &[char], start: usize) -> Result<(String, usize), String> {
    let mut pos = start + 2;
    let mut tag = String::new();
    while pos < chars.len() && chars[pos] != '>' {
        if !chars[pos].is_whitespace() {
            tag.push(chars[pos].to_ascii_lowercase());
        }
        pos += 1;
    }
    if pos >= chars.len() {
        return Err("unterminated close tag".to_string());
    }
    Ok((tag, pos + 1))
}

fn read_open_tag(chars: &[char], start: usize) -> Result<(ParsedElement, bool, usize), String> {
    let mut pos = start + 1;
    let mut tag = String::new();
    while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '-') {
        tag.push(chars[pos].to_ascii_lowercase());
        pos += 1;
    }
    if tag.is_empty() {
        return Err(format!("malformed tag at offset {start}"));
    }

    let mut attributes = Vec::new();
    let mut self_closed = false;
    loop {
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }
        if pos >= chars.len() {
            return Err(format!("unterminated tag <{tag}>"));
        }
        if chars[pos] == '>' {
            pos += 1;
            break;
        }
        if chars[pos] == '/' {
            self_closed = true;
            pos += 1;
            continue;
        }

        let mut name = String::new();
        while pos < chars.len() && !chars[pos].is_whitespace() && !"=/>".contains(chars[pos]) {
            name.push(chars[pos]);
            pos += 1;
        }
        if name.is_empty() {
            return Err(format!("malformed attribute in <{tag}>"));
        }
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }
        if pos < chars.len() && chars[pos] == '=' {
            pos += 1;
            while pos < chars.len() && chars[pos].is_whitespace() {
                pos += 1;
            }
            let value = if pos < chars.len() && (chars[pos] == '"' || chars[pos] == '\'') {
                let quote = chars[pos];
                pos += 1;
                let start = pos;
                while pos < chars.len() && chars[pos] != quote {
                    pos += 1;
                }
                if pos >= chars.len() {
                    return Err(format!("unterminated attribute value in <{tag}>"));
                }
                let raw: String = chars[start..pos].iter().collect();
                pos += 1;
                raw
            } else {
                let start = pos;
                while pos < chars.len() && !chars[pos].is_whitespace() && !"/>".contains(chars[pos])
                {
                    pos += 1;
                }
                chars[start..pos].iter().collect()
            };
            attributes.push((name, unescape(&value)));
        } else {
            attributes.push((name, String::new()));
        }
    }

    Ok((ParsedElement::new(tag, attributes), self_closed, pos))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_nested_elements_with_attributes() {
        let roots = parse_fragment(
            r#"<tr id="row"><td class="cell one"></td><td><div id="inner"></div></td></tr>"#,
        )
        .expect("parse");

        assert_eq!(roots.len(), 1);
        let row = &roots[0];
        assert_eq!(row.tag, "tr");
        assert_eq!(row.attributes, vec![("id".to_string(), "row".to_string())]);
        assert_eq!(row.children.len(), 2);
        assert_eq!(row.children[1].children[0].tag, "div");
    }

    #[test]
    fn self_closing_and_void_tags_take_no_children() {
        let roots =
            parse_fragment(r#"<span><img class="icon" src="x.png" /><input type="file"></span>"#)
                .expect("parse");

        let span = &roots[0];
        assert_eq!(span.children.len(), 2);
        assert_eq!(span.children[0].tag, "img");
        assert_eq!(span.children[1].tag, "input");
    }

    #[test]
    fn text_content_lands_on_the_enclosing_element() {
        let roots = parse_fragment("<span>Attach a file</span>").expect("parse");
        assert_eq!(roots[0].text, "Attach a file");
    }

    #[test]
    fn mismatched_close_tag_is_an_error() {
        assert!(parse_fragment("<div><span></div>").is_err());
    }

    #[test]
    fn escaped_entities_round_trip() {
        let roots = parse_fragment(r#"<span title="a &quot;b&quot;">x &amp; y</span>"#)
            .expect("parse");
        assert_eq!(roots[0].attributes[0].1, "a \"b\"");
        assert_eq!(roots[0].text, "x & y");
    }
}
