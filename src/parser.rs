use crate::decimal;
use crate::error::{AnonError, AnonResult};
use crate::registry::Registry;
use crate::tokenizer::Token;

/// Convert an infix token stream into postfix order (shunting-yard).
///
/// Constants are replaced by their value as they are read. Other
/// identifiers are held on the operator stack as opaque symbols; one that
/// is still there once the input runs out is a parse error.
pub fn to_postfix<I>(tokens: I, registry: &Registry) -> AnonResult<Vec<Token>>
where
    I: IntoIterator<Item = AnonResult<Token>>,
{
    let mut output: Vec<Token> = Vec::new();
    let mut stack: Vec<Token> = Vec::new();
    let mut last_function: Option<String> = None;
    let mut previous: Option<Token> = None;

    for token in tokens {
        let token = token?;
        match &token {
            Token::Number(_) => output.push(token.clone()),
            Token::Function(name) => {
                last_function = Some(name.clone());
                stack.push(token.clone());
            }
            Token::Identifier(name) => match registry.constant(name) {
                Some(value) => output.push(Token::Number(decimal::to_plain_string(value))),
                None => stack.push(token.clone()),
            },
            Token::Comma => {
                pop_until_paren(&mut stack, &mut output);
                if stack.is_empty() {
                    return Err(AnonError::Parse(format!(
                        "Parse error for function '{}'",
                        last_function.as_deref().unwrap_or_default()
                    )));
                }
            }
            Token::Operator(symbol) => {
                let current = registry
                    .operator(symbol)
                    .ok_or_else(|| AnonError::Parse(format!("Unknown operator '{}'", symbol)))?;
                while let Some(Token::Operator(top)) = stack.last() {
                    match registry.operator(top) {
                        Some(stacked) if current.yields_to(stacked) => {}
                        _ => break,
                    }
                    if let Some(top) = stack.pop() {
                        output.push(top);
                    }
                }
                stack.push(token.clone());
            }
            Token::LeftParen => {
                if let Some(Token::Number(number)) = &previous {
                    return Err(AnonError::Parse(format!("Missing operator between {} and '('", number)));
                }
                stack.push(Token::LeftParen);
            }
            Token::RightParen => {
                pop_until_paren(&mut stack, &mut output);
                if stack.pop().is_none() {
                    return Err(AnonError::Parse("Mismatched parentheses".into()));
                }
                if let Some(Token::Function(_)) = stack.last() {
                    if let Some(function) = stack.pop() {
                        output.push(function);
                    }
                }
            }
        }
        previous = Some(token);
    }

    while let Some(element) = stack.pop() {
        match element {
            Token::LeftParen | Token::RightParen => {
                return Err(AnonError::Parse("Mismatched parentheses".into()));
            }
            Token::Operator(_) => output.push(element),
            other => {
                return Err(AnonError::Parse(format!("Unknown operator or function: {}", other)));
            }
        }
    }
    Ok(output)
}

fn pop_until_paren(stack: &mut Vec<Token>, output: &mut Vec<Token>) {
    while let Some(top) = stack.last() {
        if *top == Token::LeftParen {
            break;
        }
        if let Some(top) = stack.pop() {
            output.push(top);
        }
    }
}
