//! Minimal XML reader for KiCad netlist exports.
//!
//! Covers exactly the subset KiCad emits: a prolog, comments, an optional
//! DOCTYPE, nested elements with quoted attributes, text content, CDATA,
//! and the predefined/character entity references. Not a general XML
//! implementation; no namespaces, no DTD expansion.

use crate::core::error::PindefsError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    /// Attributes in document order.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Concatenated character data directly inside this element.
    pub text: String,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn children_named<'e>(&'e self, name: &'e str) -> impl Iterator<Item = &'e Element> + 'e {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// All elements reached by walking a slash-separated child path,
    /// e.g. `components/comp`.
    pub fn descendants<'e>(&'e self, path: &str) -> Vec<&'e Element> {
        let mut nodes: Vec<&Element> = vec![self];
        for segment in path.split('/') {
            let mut next = Vec::new();
            for node in nodes {
                next.extend(node.children.iter().filter(|c| c.name == segment));
            }
            nodes = next;
        }
        nodes
    }

    pub fn descendant<'e>(&'e self, path: &str) -> Option<&'e Element> {
        self.descendants(path).into_iter().next()
    }

    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }
}

/// Parse a complete document and return its root element.
pub fn parse(input: &str) -> Result<Element, PindefsError> {
    let mut reader = Reader {
        input: input.strip_prefix('\u{feff}').unwrap_or(input),
        pos: 0,
        line: 1,
    };
    let mut root = None;
    loop {
        reader.skip_misc()?;
        if reader.at_end() {
            break;
        }
        if root.is_some() {
            return Err(reader.err("content after the root element"));
        }
        root = Some(reader.parse_element()?);
    }
    root.ok_or_else(|| PindefsError::XmlError {
        line: 1,
        message: "no root element".to_string(),
    })
}

struct Reader<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Reader<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn err(&self, message: impl Into<String>) -> PindefsError {
        PindefsError::XmlError {
            line: self.line,
            message: message.into(),
        }
    }

    fn advance(&mut self, n: usize) {
        let consumed = &self.input[self.pos..self.pos + n];
        self.line += consumed.bytes().filter(|&b| b == b'\n').count();
        self.pos += n;
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.advance(token.len());
            true
        } else {
            false
        }
    }

    /// Consume through the end of `terminator`, failing at end of input.
    fn skip_until(&mut self, terminator: &str, what: &str) -> Result<(), PindefsError> {
        match self.rest().find(terminator) {
            Some(at) => {
                self.advance(at + terminator.len());
                Ok(())
            }
            None => Err(self.err(format!("unterminated {}", what))),
        }
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        let n = self.rest().len() - trimmed.len();
        self.advance(n);
    }

    /// Skip whitespace, the prolog, comments, and DOCTYPE between elements.
    fn skip_misc(&mut self) -> Result<(), PindefsError> {
        loop {
            self.skip_ws();
            if self.rest().starts_with("<?") {
                self.skip_until("?>", "processing instruction")?;
            } else if self.rest().starts_with("<!--") {
                self.skip_until("-->", "comment")?;
            } else if self.rest().starts_with("<!") {
                self.skip_until(">", "DOCTYPE declaration")?;
            } else {
                return Ok(());
            }
        }
    }

    fn read_name(&mut self) -> Result<String, PindefsError> {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|(_, c)| !is_name_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(self.err("expected a name"));
        }
        let name = rest[..end].to_string();
        self.advance(end);
        Ok(name)
    }

    fn parse_element(&mut self) -> Result<Element, PindefsError> {
        if !self.eat("<") {
            return Err(self.err("expected `<`"));
        }
        let mut element = Element {
            name: self.read_name()?,
            ..Element::default()
        };
        loop {
            self.skip_ws();
            if self.eat("/>") {
                return Ok(element);
            }
            if self.eat(">") {
                self.parse_content(&mut element)?;
                return Ok(element);
            }
            let attr_name = self.read_name()?;
            self.skip_ws();
            if !self.eat("=") {
                return Err(self.err(format!("expected `=` after attribute `{}`", attr_name)));
            }
            self.skip_ws();
            let quote = match self.rest().chars().next() {
                Some(q @ ('"' | '\'')) => q,
                _ => return Err(self.err("expected a quoted attribute value")),
            };
            self.advance(1);
            let raw = match self.rest().find(quote) {
                Some(at) => {
                    let raw = &self.rest()[..at];
                    self.advance(at + 1);
                    raw
                }
                None => return Err(self.err("unterminated attribute value")),
            };
            let value = decode_entities(raw, self.line)?;
            element.attrs.push((attr_name, value));
        }
    }

    fn parse_content(&mut self, element: &mut Element) -> Result<(), PindefsError> {
        loop {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.skip_until("-->", "comment")?;
            } else if rest.starts_with("<![CDATA[") {
                self.advance("<![CDATA[".len());
                match self.rest().find("]]>") {
                    Some(at) => {
                        element.text.push_str(&self.rest()[..at]);
                        self.advance(at + 3);
                    }
                    None => return Err(self.err("unterminated CDATA section")),
                }
            } else if rest.starts_with("</") {
                self.advance(2);
                let close = self.read_name()?;
                if close != element.name {
                    return Err(self.err(format!(
                        "mismatched close tag: expected `</{}>`, got `</{}>`",
                        element.name, close
                    )));
                }
                self.skip_ws();
                if !self.eat(">") {
                    return Err(self.err("expected `>` in close tag"));
                }
                return Ok(());
            } else if rest.starts_with('<') {
                element.children.push(self.parse_element()?);
            } else if rest.is_empty() {
                return Err(self.err(format!("unclosed element `{}`", element.name)));
            } else {
                let until = rest.find('<').unwrap_or(rest.len());
                let text = decode_entities(&rest[..until], self.line)?;
                element.text.push_str(&text);
                self.advance(until);
            }
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')
}

fn decode_entities(raw: &str, line: usize) -> Result<String, PindefsError> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let semi = rest.find(';').ok_or_else(|| PindefsError::XmlError {
            line,
            message: "unterminated entity reference".to_string(),
        })?;
        let entity = &rest[1..semi];
        match entity {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            _ => {
                let code = entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(|dec| dec.parse::<u32>()));
                match code.and_then(|r| r.ok()).and_then(char::from_u32) {
                    Some(c) => out.push(c),
                    None => {
                        return Err(PindefsError::XmlError {
                            line,
                            message: format!("unknown entity `&{};`", entity),
                        });
                    }
                }
            }
        }
        rest = &rest[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
