use crate::pool::with_parser;
use crate::ts::errors::ParseError;
use crate::ts::lang::Dialect;

/// Validate that source code has no syntax errors.
///
/// Returns Ok(()) if the code parses without ERROR or MISSING nodes.
pub fn validate_syntax(source: &str, dialect: Dialect) -> Result<(), ParseError> {
    with_parser(dialect, |parser| parser.parse_raw(source).map(|_| ()))?
}

/// Validate that a rewrite did not introduce syntax errors.
///
/// Output is only rejected when the original parsed cleanly, so a rewrite
/// of already broken code is not blamed for pre-existing errors.
pub fn validate_rewrite(original: &str, rewritten: &str, dialect: Dialect) -> Result<(), ParseError> {
    if validate_syntax(original, dialect).is_err() {
        return Ok(());
    }
    validate_syntax(rewritten, dialect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_valid_syntax() {
        let source = r#"
function main() {
    console.log("hello");
}
"#;
        assert!(validate_syntax(source, Dialect::JavaScript).is_ok());
    }

    #[test]
    fn validate_invalid_syntax() {
        assert!(validate_syntax("function main( { }", Dialect::JavaScript).is_err());
    }

    #[test]
    fn typescript_only_syntax() {
        let source = "let x: number = 1;";
        assert!(validate_syntax(source, Dialect::TypeScript).is_ok());
        assert!(validate_syntax(source, Dialect::JavaScript).is_err());
    }

    #[test]
    fn rewrite_that_breaks_code_is_rejected() {
        let result = validate_rewrite("f(1);", "f(1;", Dialect::JavaScript);
        assert!(matches!(result, Err(ParseError::Syntax { .. })));
    }

    #[test]
    fn rewrite_of_broken_code_is_not_blamed() {
        assert!(validate_rewrite("f(1;", "g(1;", Dialect::JavaScript).is_ok());
    }
}
