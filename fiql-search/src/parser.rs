use crate::ast::{CompareOp, FilterExpression};
use crate::config::{QueryBuilderConfig, MAX_DEPTH_LIMIT};
use crate::errors::FiqlError;
use std::str::FromStr;

// Longest operators first so `=ge=` wins over `=` prefixes and `>=` over `>`.
const OPERATORS: [&str; 10] = [
    "=gt=", "=ge=", "=lt=", "=le=", "==", "!=", ">=", "<=", ">", "<",
];

/// Recursive descent parser for FIQL filter expressions.
///
/// The parser keeps no per-call state, so one instance can be shared freely
/// between threads. Conjunction (`;`) binds tighter than disjunction (`,`),
/// and runs of the same combinator collapse into a single n-ary node.
#[derive(Debug, Clone)]
pub struct FiqlParser {
    max_depth: usize,
}

impl Default for FiqlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FiqlParser {
    pub fn new() -> Self {
        Self::with_config(&QueryBuilderConfig::default())
    }

    /// `max_depth` above [`MAX_DEPTH_LIMIT`] is clamped to it.
    pub fn with_config(config: &QueryBuilderConfig) -> Self {
        Self {
            max_depth: config.max_depth.min(MAX_DEPTH_LIMIT),
        }
    }

    pub fn parse(&self, text: &str) -> Result<FilterExpression, FiqlError> {
        let mut cursor = Cursor {
            input: text,
            pos: 0,
            max_depth: self.max_depth,
        };
        cursor.skip_whitespace();
        if cursor.at_end() {
            return Err(FiqlError::malformed(0, "Empty expression"));
        }
        let expr = cursor.disjunction(0)?;
        cursor.skip_whitespace();
        match cursor.peek() {
            None => Ok(expr),
            Some(')') => Err(FiqlError::malformed(
                cursor.pos,
                "Unbalanced ')' without matching '('",
            )),
            Some(c) => Err(FiqlError::malformed(
                cursor.pos,
                format!("Unexpected character '{}'", c),
            )),
        }
    }
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    max_depth: usize,
}

impl Cursor<'_> {
    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn disjunction(&mut self, depth: usize) -> Result<FilterExpression, FiqlError> {
        let mut children = vec![self.conjunction(depth)?];
        loop {
            self.skip_whitespace();
            if self.peek() != Some(',') {
                break;
            }
            self.bump();
            children.push(self.conjunction(depth)?);
        }
        Ok(collapse(children, FilterExpression::or))
    }

    fn conjunction(&mut self, depth: usize) -> Result<FilterExpression, FiqlError> {
        let mut children = vec![self.constraint(depth)?];
        loop {
            self.skip_whitespace();
            if self.peek() != Some(';') {
                break;
            }
            self.bump();
            children.push(self.constraint(depth)?);
        }
        Ok(collapse(children, FilterExpression::and))
    }

    fn constraint(&mut self, depth: usize) -> Result<FilterExpression, FiqlError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(FiqlError::malformed(
                self.pos,
                "Expected a comparison or '(' but reached end of input",
            )),
            Some('(') => {
                let open = self.pos;
                if depth + 1 > self.max_depth {
                    return Err(FiqlError::malformed(
                        open,
                        format!("Groups nested deeper than {} levels", self.max_depth),
                    ));
                }
                self.bump();
                let inner = self.disjunction(depth + 1)?;
                self.skip_whitespace();
                if self.peek() != Some(')') {
                    return Err(FiqlError::malformed(
                        open,
                        "Unbalanced '(' without matching ')'",
                    ));
                }
                self.bump();
                Ok(inner)
            }
            Some(c @ (';' | ',')) => Err(FiqlError::malformed(
                self.pos,
                format!("Dangling combinator '{}'", c),
            )),
            Some(')') => Err(FiqlError::malformed(
                self.pos,
                "Expected a comparison but found ')'",
            )),
            Some(_) => self.comparison(),
        }
    }

    fn comparison(&mut self) -> Result<FilterExpression, FiqlError> {
        let field = self.selector()?;
        self.skip_whitespace();
        let op = self.operator(&field)?;
        self.skip_whitespace();
        let raw_value = self.argument(&field)?;
        Ok(FilterExpression::Comparison {
            field,
            op,
            raw_value,
        })
    }

    fn selector(&mut self) -> Result<String, FiqlError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            self.bump();
        }
        let selector = &self.input[start..self.pos];
        if selector.is_empty() {
            return Err(FiqlError::malformed(start, "Expected a field selector"));
        }
        let well_formed = selector.split('.').all(|segment| {
            segment
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        });
        if !well_formed {
            return Err(FiqlError::malformed(
                start,
                format!("Invalid field selector '{}'", selector),
            ));
        }
        Ok(selector.to_string())
    }

    fn operator(&mut self, field: &str) -> Result<CompareOp, FiqlError> {
        let start = self.pos;
        let rest = self.rest();
        if let Some(token) = OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            let op = CompareOp::from_str(token).map_err(|_| {
                FiqlError::malformed(start, format!("Unknown operator '{}'", token))
            })?;
            self.pos += token.len();
            return Ok(op);
        }
        // FIQL custom operators look like `=name=`; report the whole token.
        if let Some(custom) = rest.strip_prefix('=') {
            let name_len = custom
                .chars()
                .take_while(|c| c.is_ascii_alphabetic())
                .map(char::len_utf8)
                .sum::<usize>();
            if name_len > 0 && custom[name_len..].starts_with('=') {
                return Err(FiqlError::malformed(
                    start,
                    format!("Unknown operator '={}='", &custom[..name_len]),
                ));
            }
        }
        Err(FiqlError::malformed(
            start,
            format!("Expected a comparison operator after '{}'", field),
        ))
    }

    fn argument(&mut self, field: &str) -> Result<String, FiqlError> {
        match self.peek() {
            Some(quote @ ('\'' | '"')) => self.quoted(quote),
            _ => self.bare(field),
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, FiqlError> {
        let start = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(FiqlError::malformed(start, "Unterminated quoted value"));
                }
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => {
                        return Err(FiqlError::malformed(start, "Unterminated quoted value"));
                    }
                },
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
            }
        }
    }

    fn bare(&mut self, field: &str) -> Result<String, FiqlError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            match c {
                '(' | ')' | ';' | ',' => break,
                '\'' | '"' => {
                    return Err(FiqlError::malformed(
                        self.pos,
                        "Quotes must enclose the whole value",
                    ));
                }
                _ => {
                    self.bump();
                }
            }
        }
        let value = self.input[start..self.pos].trim();
        if value.is_empty() {
            return Err(FiqlError::malformed(
                start,
                format!("Missing value for '{}'", field),
            ));
        }
        Ok(value.to_string())
    }
}

fn collapse(
    mut children: Vec<FilterExpression>,
    combine: fn(Vec<FilterExpression>) -> FilterExpression,
) -> FilterExpression {
    if children.len() == 1 {
        children.remove(0)
    } else {
        combine(children)
    }
}
