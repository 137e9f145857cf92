/*!
  The human readable textual form of bytecode is called assembly. This module leverages the
  `strum` derives of the opcode enums to parse assembly back into a program. The format is
  what `Display for Program` prints: one instruction per line, optionally followed by
  `= constant`, with `#` starting a comment.

  ```text
  # Double the value in slot 1 every cycle.
  Copy(1)       = 0.0
  Add(0, 0)     = 4.0
  Cmpz(Ltz, 1)
  Output(2, 1)
  ```

  Blank and comment-only lines do not occupy a slot. The reserved immediate of S-form words
  is always assembled as zero.
*/

use std::str::FromStr;

use nom::{
  branch::alt,
  bytes::complete::tag,
  character::complete::{
    alpha1,
    char as one_char,
    digit1,
    hex_digit1,
    space0
  },
  combinator::{all_consuming, map, map_res, opt, rest, value},
  multi::separated_list,
  number::complete::recognize_float,
  sequence::{delimited, pair, preceded, terminated, tuple},
  IResult
};

use super::{decode_instruction, CompareMode, DualOperation, Instruction, SingleOperation};
use crate::address::ADDRESS_RANGE;
use crate::error::AssemblyError;
use crate::program::Program;

#[derive(Copy, Clone, Debug, PartialEq)]
enum Argument<'a> {
  Number(usize),
  Hex(u32),
  Name(&'a str)
}

impl<'a> Argument<'a> {
  fn text(&self) -> String {
    match self {
      Argument::Number(n) => n.to_string(),
      Argument::Hex(word) => format!("{:#x}", word),
      Argument::Name(name) => name.to_string()
    }
  }
}

// Mnemonic, arguments, constant
type Statement<'a> = (&'a str, Vec<Argument<'a>>, Option<f64>);

fn hex_argument(input: &str) -> IResult<&str, Argument> {
  map_res(
    preceded(tag("0x"), hex_digit1),
    |digits: &str| u32::from_str_radix(digits, 16).map(Argument::Hex)
  )(input)
}

fn number_argument(input: &str) -> IResult<&str, Argument> {
  map_res(digit1, |digits: &str| digits.parse::<usize>().map(Argument::Number))(input)
}

fn name_argument(input: &str) -> IResult<&str, Argument> {
  map(alpha1, Argument::Name)(input)
}

fn argument(input: &str) -> IResult<&str, Argument> {
  alt((hex_argument, number_argument, name_argument))(input)
}

fn arguments(input: &str) -> IResult<&str, Vec<Argument>> {
  delimited(
    terminated(one_char('('), space0),
    separated_list(delimited(space0, one_char(','), space0), argument),
    preceded(space0, one_char(')'))
  )(input)
}

fn float(input: &str) -> IResult<&str, f64> {
  alt((
    value(std::f64::NAN, tag("NaN")),
    value(std::f64::INFINITY, tag("inf")),
    value(std::f64::NEG_INFINITY, tag("-inf")),
    map_res(recognize_float, |text: &str| text.parse::<f64>())
  ))(input)
}

fn constant(input: &str) -> IResult<&str, f64> {
  preceded(delimited(space0, one_char('='), space0), float)(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
  preceded(one_char('#'), rest)(input)
}

fn statement(input: &str) -> IResult<&str, Statement> {
  tuple((
    alpha1,
    map(
      opt(preceded(space0, arguments)),
      |arguments: Option<Vec<Argument>>| arguments.unwrap_or_else(Vec::new)
    ),
    opt(constant)
  ))(input)
}

fn source_line(input: &str) -> IResult<&str, Option<Statement>> {
  all_consuming(
    delimited(space0, opt(statement), pair(space0, opt(comment)))
  )(input)
}

fn address(line: usize, argument: &Argument) -> Result<usize, AssemblyError> {
  match argument {
    Argument::Number(n) if *n < ADDRESS_RANGE => Ok(*n),
    other => Err(AssemblyError::BadArgument { line, argument: other.text() })
  }
}

fn compare_mode(line: usize, argument: &Argument) -> Result<CompareMode, AssemblyError> {
  match argument {
    Argument::Name(name) => {
      CompareMode::from_str(name)
        .map_err(|_e| AssemblyError::BadArgument { line, argument: name.to_string() })
    }
    other => Err(AssemblyError::BadArgument { line, argument: other.text() })
  }
}

fn wrong_arity(line: usize, operation: &str, expected: usize, found: usize) -> AssemblyError {
  AssemblyError::WrongArity { line, operation: operation.to_string(), expected, found }
}

fn assemble(line: usize, name: &str, arguments: &[Argument]) -> Result<Instruction, AssemblyError> {
  if let Ok(operation) = DualOperation::from_str(name) {
    return match arguments {
      [a, b] => Ok(Instruction::dual(operation, address(line, a)?, address(line, b)?)),
      _ => Err(wrong_arity(line, name, 2, arguments.len()))
    };
  }

  if let Ok(operation) = SingleOperation::from_str(name) {
    return match (operation, arguments) {
      (SingleOperation::Noop, []) => Ok(Instruction::noop()),
      (SingleOperation::Noop, _) => Err(wrong_arity(line, name, 0, arguments.len())),
      (SingleOperation::Cmpz, [mode, source]) => {
        Ok(Instruction::compare(compare_mode(line, mode)?, address(line, source)?))
      }
      (SingleOperation::Cmpz, _) => Err(wrong_arity(line, name, 2, arguments.len())),
      (operation, [source]) => Ok(Instruction::single(operation, address(line, source)?)),
      (_, _) => Err(wrong_arity(line, name, 1, arguments.len()))
    };
  }

  // A raw word, as printed for undefined instructions.
  if name == "Invalid" {
    return match arguments {
      [Argument::Hex(word)] => Ok(decode_instruction(*word)),
      [other] => Err(AssemblyError::BadArgument { line, argument: other.text() }),
      _ => Err(wrong_arity(line, name, 1, arguments.len()))
    };
  }

  Err(AssemblyError::NotAnOperation { line, name: name.to_string() })
}

/// Assembles `text` into a program. Errors carry 1-based line numbers.
pub fn parse_assembly(text: &str) -> Result<Program, AssemblyError> {
  let mut program = Program::new();

  for (index, source) in text.lines().enumerate() {
    let line = index + 1;
    let statement = match source_line(source) {
      Ok((_rest, statement)) => statement,
      Err(_e) => {
        return Err(AssemblyError::Syntax { line, text: source.trim().to_string() });
      }
    };

    if let Some((name, arguments, constant)) = statement {
      let instruction = assemble(line, name, &arguments)?;
      program.push(instruction, constant.unwrap_or(0.0));
    }
  }

  Ok(program)
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_every_operation() {
    let text = "
      Add(3, 4)
      Sub(1,2) = 1.5
      Mult( 5 , 6 )
      Div(7, 8)
      Output(2, 10)
      Phi(11, 12)
      Noop = -0.25
      Cmpz(Gtz, 13)
      Sqrt(14)
      Copy(15)
      Input(16000)
    ";
    let program = parse_assembly(text).unwrap();
    let rendered: Vec<String> = program.lines().iter().map(|l| l.instruction.to_string()).collect();
    assert_eq!(
      rendered,
      vec![
        "Add(3, 4)", "Sub(1, 2)", "Mult(5, 6)", "Div(7, 8)", "Output(2, 10)", "Phi(11, 12)",
        "Noop", "Cmpz(Gtz, 13)", "Sqrt(14)", "Copy(15)", "Input(16000)"
      ]
    );
    assert_eq!(program.lines()[1].constant, 1.5);
    assert_eq!(program.lines()[6].constant, -0.25);
    assert_eq!(program.lines()[0].constant, 0.0);
  }

  #[test]
  fn skips_comments_and_blank_lines() {
    let text = "# header\n\nCopy(1) = 6.67428e-11  # gravity\n   \nNoop\n";
    let program = parse_assembly(text).unwrap();
    assert_eq!(program.len(), 2);
    assert_eq!(program.lines()[0].constant, 6.67428e-11);
    assert_eq!(program.lines()[1].slot, 1);
  }

  #[test]
  fn reparses_its_own_listing() {
    let text = "Copy(1) = 3.0\nAdd(0, 0) = 4.0\nCmpz(Lez, 1) = 1e300\nNoop = inf\nInvalid(0xf0000001) = 0.0\n";
    let program = parse_assembly(text).unwrap();
    assert_eq!(program.to_string(), text);
    assert_eq!(parse_assembly(&program.to_string()).unwrap(), program);
  }

  #[test]
  fn reports_errors_with_line_numbers() {
    assert_eq!(
      parse_assembly("Noop\nJump(3)").unwrap_err(),
      AssemblyError::NotAnOperation { line: 2, name: "Jump".to_string() }
    );
    assert_eq!(
      parse_assembly("Add(1)").unwrap_err(),
      AssemblyError::WrongArity { line: 1, operation: "Add".to_string(), expected: 2, found: 1 }
    );
    assert_eq!(
      parse_assembly("Noop\n\nCopy(16384)").unwrap_err(),
      AssemblyError::BadArgument { line: 3, argument: "16384".to_string() }
    );
    assert_eq!(
      parse_assembly("Cmpz(Nez, 1)").unwrap_err(),
      AssemblyError::BadArgument { line: 1, argument: "Nez".to_string() }
    );
    assert_eq!(
      parse_assembly("Add(1, 2) = ").unwrap_err(),
      AssemblyError::Syntax { line: 1, text: "Add(1, 2) =".to_string() }
    );
  }
}
