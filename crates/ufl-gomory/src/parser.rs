use thiserror::Error;

use crate::error::ValidationError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Invalid header at line {line}: expected `<facilities> <customers>`")]
    InvalidHeader { line: usize },
    #[error("Unexpected end of file while reading {expected}")]
    UnexpectedEof { expected: String },
    #[error("Invalid number at line {line}: {text}")]
    InvalidNumber { line: usize, text: String },
}

/// Failure to turn a file into a validated [`Instance`](crate::Instance)
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Invalid instance: {0}")]
    Validation(#[from] ValidationError),
}

/// Instance data as read from the file, before validation
#[derive(Debug, Clone, PartialEq)]
pub struct RawInstance {
    pub num_facilities: usize,
    pub num_customers: usize,
    pub fixed_costs: Vec<f64>,
    pub assignment_costs: Vec<Vec<f64>>,
}

#[derive(Debug, Clone)]
struct Line<'a> {
    number: usize,
    fields: Vec<&'a str>,
}

/// Reader for the OR-Library UFL layout.
///
/// ```text
/// m n
/// [capacity] fixed_cost        (m lines; the last field is the fixed cost)
/// [demand]                     (optional single-integer line per customer)
/// c_1 c_2 ... c_m              (may wrap over several lines)
/// ```
pub struct Parser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let lines = source
            .lines()
            .enumerate()
            .map(|(i, line)| Line {
                number: i + 1,
                fields: line.split_whitespace().collect(),
            })
            .filter(|line| !line.fields.is_empty())
            .collect();
        Self { lines, pos: 0 }
    }

    pub fn parse(source: &'a str) -> Result<RawInstance, ParseError> {
        Parser::new(source).parse_instance()
    }

    fn advance(&mut self, expected: impl FnOnce() -> String) -> Result<Line<'a>, ParseError> {
        let line = self
            .lines
            .get(self.pos)
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof { expected: expected() })?;
        self.pos += 1;
        Ok(line)
    }

    fn parse_instance(&mut self) -> Result<RawInstance, ParseError> {
        let header = self.advance(|| "header".to_string())?;
        if header.fields.len() < 2 {
            return Err(ParseError::InvalidHeader { line: header.number });
        }
        let num_facilities = parse_count(header.fields[0], header.number)?;
        let num_customers = parse_count(header.fields[1], header.number)?;

        let mut fixed_costs = Vec::with_capacity(num_facilities);
        for u in 0..num_facilities {
            let line = self.advance(|| format!("fixed cost of facility {}", u))?;
            // Either `fixed` or `capacity fixed`; the cost is always last
            let text = line.fields[line.fields.len() - 1];
            fixed_costs.push(parse_number(text, line.number)?);
        }

        let mut assignment_costs = Vec::with_capacity(num_customers);
        for v in 0..num_customers {
            assignment_costs.push(self.parse_customer(v, num_facilities)?);
        }

        Ok(RawInstance {
            num_facilities,
            num_customers,
            fixed_costs,
            assignment_costs,
        })
    }

    fn parse_customer(&mut self, customer: usize, num_facilities: usize) -> Result<Vec<f64>, ParseError> {
        let mut costs = Vec::with_capacity(num_facilities);
        let mut first = true;

        while costs.len() < num_facilities {
            let line = self.advance(|| format!("assignment costs of customer {}", customer))?;
            // A lone integer ahead of the costs is the customer's demand. With
            // a single facility that line is the cost itself, so keep it.
            if first && num_facilities > 1 && line.fields.len() == 1 && line.fields[0].parse::<u64>().is_ok() {
                first = false;
                continue;
            }
            first = false;
            for text in &line.fields {
                costs.push(parse_number(text, line.number)?);
            }
        }

        Ok(costs)
    }
}

fn parse_count(text: &str, line: usize) -> Result<usize, ParseError> {
    text.parse().map_err(|_| ParseError::InvalidNumber {
        line,
        text: text.to_string(),
    })
}

fn parse_number(text: &str, line: usize) -> Result<f64, ParseError> {
    text.parse().map_err(|_| ParseError::InvalidNumber {
        line,
        text: text.to_string(),
    })
}
