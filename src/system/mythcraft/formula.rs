//! Evaluation of small arithmetic formulas such as `10 + @dex` or `1d4 + @level`.
//!
//! Named values are referenced with the `@` sigil and looked up case-insensitively in a
//! [`RollData`] table. Unknown references resolve to zero. Formulas used for derived
//! statistics must be deterministic; dice terms are only accepted by [`roll`].

use crate::utility::NotInList;
use std::collections::BTreeMap;

mod roll;
pub use roll::*;

#[derive(thiserror::Error, Debug)]
pub enum FormulaError {
	#[error("Unexpected character {0:?} at position {1}")]
	UnexpectedChar(char, usize),
	#[error("Unexpected token {0:?}")]
	UnexpectedToken(String),
	#[error("Formula ended unexpectedly")]
	UnexpectedEnd,
	#[error("Reference sigil at position {0} is missing a name")]
	EmptyReference(usize),
	#[error(transparent)]
	UnknownFunction(#[from] NotInList),
	#[error("Function {0} expects {1} argument(s), found {2}")]
	WrongArity(&'static str, &'static str, usize),
	#[error("Dice term {0} is not allowed in a deterministic formula")]
	DiceNotAllowed(String),
	#[error("{0}")]
	InvalidDie(#[from] crate::GeneralError),
	#[error("Division by zero")]
	DivisionByZero,
}

/// Flat table of named values a formula can reference.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct RollData(BTreeMap<String, i32>);

impl RollData {
	pub fn insert(&mut self, key: impl AsRef<str>, value: i32) {
		self.0.insert(key.as_ref().to_lowercase(), value);
	}

	pub fn get(&self, key: &str) -> Option<i32> {
		self.0.get(&key.to_lowercase()).copied()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &i32)> {
		self.0.iter()
	}
}

impl<K: AsRef<str>, const N: usize> From<[(K, i32); N]> for RollData {
	fn from(values: [(K, i32); N]) -> Self {
		let mut data = Self::default();
		for (key, value) in values {
			data.insert(key, value);
		}
		data
	}
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum Function {
	Floor,
	Ceil,
	Round,
	Abs,
	Min,
	Max,
}

impl Function {
	const NAMES: [&'static str; 6] = ["floor", "ceil", "round", "abs", "min", "max"];

	fn from_name(name: &str) -> Result<Self, NotInList> {
		match name.to_lowercase().as_str() {
			"floor" => Ok(Self::Floor),
			"ceil" => Ok(Self::Ceil),
			"round" => Ok(Self::Round),
			"abs" => Ok(Self::Abs),
			"min" => Ok(Self::Min),
			"max" => Ok(Self::Max),
			_ => Err(NotInList(name.into(), Self::NAMES.to_vec())),
		}
	}

	fn name(&self) -> &'static str {
		match self {
			Self::Floor => "floor",
			Self::Ceil => "ceil",
			Self::Round => "round",
			Self::Abs => "abs",
			Self::Min => "min",
			Self::Max => "max",
		}
	}

	fn apply(&self, args: Vec<f64>) -> Result<f64, FormulaError> {
		let unary = |args: Vec<f64>| match args.as_slice() {
			[value] => Ok(*value),
			_ => Err(FormulaError::WrongArity(self.name(), "1", args.len())),
		};
		match self {
			Self::Floor => Ok(unary(args)?.floor()),
			Self::Ceil => Ok(unary(args)?.ceil()),
			Self::Round => Ok(unary(args)?.round()),
			Self::Abs => Ok(unary(args)?.abs()),
			Self::Min | Self::Max if args.is_empty() => Err(FormulaError::WrongArity(self.name(), "1+", 0)),
			Self::Min => Ok(args.into_iter().fold(f64::INFINITY, f64::min)),
			Self::Max => Ok(args.into_iter().fold(f64::NEG_INFINITY, f64::max)),
		}
	}
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum BinaryOp {
	Add,
	Subtract,
	Multiply,
	Divide,
}

#[derive(Clone, PartialEq, Debug)]
enum Expr {
	Number(f64),
	Reference(String),
	Dice(Roll),
	Negate(Box<Expr>),
	Binary(BinaryOp, Box<Expr>, Box<Expr>),
	Call(Function, Vec<Expr>),
}

#[derive(Clone, PartialEq, Debug)]
enum Token {
	Number(f64),
	Reference(String),
	Dice(Roll),
	Ident(String),
	Plus,
	Minus,
	Star,
	Slash,
	LParen,
	RParen,
	Comma,
}

impl std::fmt::Display for Token {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Number(value) => write!(f, "{value}"),
			Self::Reference(name) => write!(f, "@{name}"),
			Self::Dice(roll) => write!(f, "{roll}"),
			Self::Ident(name) => write!(f, "{name}"),
			Self::Plus => write!(f, "+"),
			Self::Minus => write!(f, "-"),
			Self::Star => write!(f, "*"),
			Self::Slash => write!(f, "/"),
			Self::LParen => write!(f, "("),
			Self::RParen => write!(f, ")"),
			Self::Comma => write!(f, ","),
		}
	}
}

fn tokenize(source: &str) -> Result<Vec<Token>, FormulaError> {
	let chars = source.char_indices().collect::<Vec<_>>();
	let mut tokens = Vec::new();
	let mut idx = 0;
	// Consumes the run of characters matching `pred` starting at `idx`.
	let take_while = |idx: &mut usize, pred: &dyn Fn(char) -> bool| {
		let mut word = String::new();
		while let Some((_, c)) = chars.get(*idx) {
			if !pred(*c) {
				break;
			}
			word.push(*c);
			*idx += 1;
		}
		word
	};
	while let Some((pos, c)) = chars.get(idx).copied() {
		match c {
			c if c.is_whitespace() => idx += 1,
			'+' | '-' | '*' | '/' | '(' | ')' | ',' => {
				tokens.push(match c {
					'+' => Token::Plus,
					'-' => Token::Minus,
					'*' => Token::Star,
					'/' => Token::Slash,
					'(' => Token::LParen,
					')' => Token::RParen,
					_ => Token::Comma,
				});
				idx += 1;
			}
			'@' => {
				idx += 1;
				let name = take_while(&mut idx, &|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
				if name.is_empty() {
					return Err(FormulaError::EmptyReference(pos));
				}
				tokens.push(Token::Reference(name));
			}
			c if c.is_ascii_digit() || c == '.' => {
				let word = take_while(&mut idx, &|c| c.is_ascii_alphanumeric() || c == '.');
				if word.contains('d') {
					tokens.push(Token::Dice(word.parse::<Roll>()?));
				} else {
					let value = word
						.parse::<f64>()
						.map_err(|_| FormulaError::UnexpectedToken(word.clone()))?;
					tokens.push(Token::Number(value));
				}
			}
			c if c.is_ascii_alphabetic() => {
				let word = take_while(&mut idx, &|c| c.is_ascii_alphanumeric() || c == '_');
				let is_dice = word.len() > 1 && word.starts_with('d') && word[1..].chars().all(|c| c.is_ascii_digit());
				if is_dice {
					tokens.push(Token::Dice(word.parse::<Roll>()?));
				} else {
					tokens.push(Token::Ident(word));
				}
			}
			c => return Err(FormulaError::UnexpectedChar(c, pos)),
		}
	}
	Ok(tokens)
}

struct Parser {
	tokens: std::iter::Peekable<std::vec::IntoIter<Token>>,
}

impl Parser {
	fn next_req(&mut self) -> Result<Token, FormulaError> {
		self.tokens.next().ok_or(FormulaError::UnexpectedEnd)
	}

	fn expect(&mut self, expected: Token) -> Result<(), FormulaError> {
		match self.next_req()? {
			token if token == expected => Ok(()),
			token => Err(FormulaError::UnexpectedToken(token.to_string())),
		}
	}

	fn expression(&mut self) -> Result<Expr, FormulaError> {
		let mut lhs = self.term()?;
		loop {
			let op = match self.tokens.peek() {
				Some(Token::Plus) => BinaryOp::Add,
				Some(Token::Minus) => BinaryOp::Subtract,
				_ => return Ok(lhs),
			};
			self.tokens.next();
			let rhs = self.term()?;
			lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
		}
	}

	fn term(&mut self) -> Result<Expr, FormulaError> {
		let mut lhs = self.unary()?;
		loop {
			let op = match self.tokens.peek() {
				Some(Token::Star) => BinaryOp::Multiply,
				Some(Token::Slash) => BinaryOp::Divide,
				_ => return Ok(lhs),
			};
			self.tokens.next();
			let rhs = self.unary()?;
			lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
		}
	}

	fn unary(&mut self) -> Result<Expr, FormulaError> {
		match self.tokens.peek() {
			Some(Token::Minus) => {
				self.tokens.next();
				Ok(Expr::Negate(Box::new(self.unary()?)))
			}
			Some(Token::Plus) => {
				self.tokens.next();
				self.unary()
			}
			_ => self.primary(),
		}
	}

	fn primary(&mut self) -> Result<Expr, FormulaError> {
		match self.next_req()? {
			Token::Number(value) => Ok(Expr::Number(value)),
			Token::Reference(name) => Ok(Expr::Reference(name)),
			Token::Dice(roll) => Ok(Expr::Dice(roll)),
			Token::LParen => {
				let expr = self.expression()?;
				self.expect(Token::RParen)?;
				Ok(expr)
			}
			Token::Ident(name) => {
				let function = Function::from_name(&name)?;
				self.expect(Token::LParen)?;
				let mut args = Vec::new();
				if self.tokens.peek() != Some(&Token::RParen) {
					loop {
						args.push(self.expression()?);
						if self.tokens.peek() != Some(&Token::Comma) {
							break;
						}
						self.tokens.next();
					}
				}
				self.expect(Token::RParen)?;
				Ok(Expr::Call(function, args))
			}
			token => Err(FormulaError::UnexpectedToken(token.to_string())),
		}
	}
}

/// A parsed formula, ready to be evaluated against any number of roll data tables.
#[derive(Clone, PartialEq, Debug)]
pub struct Formula {
	source: String,
	expr: Expr,
}

impl std::str::FromStr for Formula {
	type Err = FormulaError;

	fn from_str(source: &str) -> Result<Self, Self::Err> {
		let mut parser = Parser { tokens: tokenize(source)?.into_iter().peekable() };
		let expr = parser.expression()?;
		if let Some(token) = parser.tokens.next() {
			return Err(FormulaError::UnexpectedToken(token.to_string()));
		}
		Ok(Self { source: source.to_owned(), expr })
	}
}

impl Formula {
	pub fn source(&self) -> &str {
		&self.source
	}

	/// Evaluates the formula, failing if it contains any dice terms.
	pub fn evaluate(&self, data: &RollData) -> Result<i32, FormulaError> {
		let value = Self::eval(&self.expr, data, &mut |roll: &Roll| {
			Err(FormulaError::DiceNotAllowed(roll.to_string()))
		})?;
		Ok(value.floor() as i32)
	}

	/// Evaluates the formula, rolling any dice terms with `rng`.
	pub fn roll(&self, data: &RollData, rng: &mut impl rand::Rng) -> Result<i32, FormulaError> {
		let value = Self::eval(&self.expr, data, &mut |roll: &Roll| Ok(roll.roll(&mut *rng) as f64))?;
		Ok(value.floor() as i32)
	}

	fn eval(
		expr: &Expr,
		data: &RollData,
		dice: &mut dyn FnMut(&Roll) -> Result<f64, FormulaError>,
	) -> Result<f64, FormulaError> {
		Ok(match expr {
			Expr::Number(value) => *value,
			Expr::Reference(name) => data.get(name).unwrap_or_default() as f64,
			Expr::Dice(roll) => dice(roll)?,
			Expr::Negate(inner) => -Self::eval(inner, data, dice)?,
			Expr::Binary(op, lhs, rhs) => {
				let lhs = Self::eval(lhs, data, dice)?;
				let rhs = Self::eval(rhs, data, dice)?;
				match op {
					BinaryOp::Add => lhs + rhs,
					BinaryOp::Subtract => lhs - rhs,
					BinaryOp::Multiply => lhs * rhs,
					BinaryOp::Divide if rhs == 0.0 => return Err(FormulaError::DivisionByZero),
					BinaryOp::Divide => lhs / rhs,
				}
			}
			Expr::Call(function, args) => {
				let mut values = Vec::with_capacity(args.len());
				for arg in args {
					values.push(Self::eval(arg, data, dice)?);
				}
				function.apply(values)?
			}
		})
	}
}

/// Deterministically evaluates `formula`, reporting malformed formulas and dice terms as errors.
pub fn try_evaluate(formula: &str, data: &RollData) -> Result<i32, FormulaError> {
	formula.parse::<Formula>()?.evaluate(data)
}

/// Deterministically evaluates `formula`. A formula that cannot be evaluated yields 0.
pub fn evaluate(formula: &str, data: &RollData) -> i32 {
	match try_evaluate(formula, data) {
		Ok(value) => value,
		Err(err) => {
			log::warn!(target: "formula", "Failed to evaluate {formula:?}: {err}");
			0
		}
	}
}

/// Evaluates `formula`, rolling any dice it contains.
pub fn roll(formula: &str, data: &RollData, rng: &mut impl rand::Rng) -> Result<i32, FormulaError> {
	formula.parse::<Formula>()?.roll(data, rng)
}
