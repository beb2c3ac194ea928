//! Line-driven recursive descent parser for Clot
//!
//! Each statement consumes one or more complete lines; block statements
//! (`if/else/endif`, `while/endwhile`, `func/endfunc`, `try/catch/endtry`)
//! consume their terminator lines as part of themselves. Expressions are
//! parsed from one line's token slice with precedence climbing.
//!
//! The first error wins: parsing reports a single `Diagnostic` with a
//! 1-based line and column and does not attempt recovery.

use crate::diagnostics::Diagnostic;
use crate::parser::ast::*;
use crate::parser::lexer::tokenize_line;
use crate::parser::token::{Token, TokenKind};
use std::rc::Rc;

/// Parser over an ordered sequence of source lines
pub struct Parser {
    lines: Vec<String>,
}

impl Parser {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Parse the whole source into a program, or report the first error.
    pub fn parse(&self) -> Result<Program, Diagnostic> {
        let mut statements = Vec::new();
        let mut line_index = 0usize;
        self.parse_block(&mut line_index, &[], &mut statements)?;
        Ok(Program { statements })
    }

    /// Parse statements until end of input or until the first token of a line
    /// is one of `stops`. The stopping line is not consumed.
    fn parse_block(
        &self,
        line_index: &mut usize,
        stops: &[TokenKind],
        out: &mut Vec<Stmt>,
    ) -> Result<(), Diagnostic> {
        while *line_index < self.lines.len() {
            let tokens = tokenize_line(&self.lines[*line_index]);

            if tokens.is_empty() {
                *line_index += 1;
                continue;
            }

            if tokens[0].kind == TokenKind::Unknown {
                return Err(Diagnostic::new(
                    *line_index + 1,
                    tokens[0].column,
                    format!("unrecognized token: '{}'", tokens[0].lexeme),
                ));
            }

            if stops.contains(&tokens[0].kind) {
                return Ok(());
            }

            self.parse_statement(line_index, &tokens, out)?;
        }

        Ok(())
    }

    /// The first token of a line picks the production.
    fn parse_statement(
        &self,
        line_index: &mut usize,
        tokens: &[Token],
        out: &mut Vec<Stmt>,
    ) -> Result<(), Diagnostic> {
        match tokens[0].kind {
            TokenKind::Print | TokenKind::Println => self.parse_print(line_index, tokens, out),
            TokenKind::If => self.parse_if(line_index, tokens, out),
            TokenKind::While => self.parse_while(line_index, tokens, out),
            TokenKind::Func => self.parse_function(line_index, tokens, out),
            TokenKind::Import => self.parse_import(line_index, tokens, out),
            TokenKind::Return => self.parse_return(line_index, tokens, out),
            TokenKind::Try => self.parse_try(line_index, tokens, out),
            TokenKind::Else
            | TokenKind::EndIf
            | TokenKind::EndFunc
            | TokenKind::EndWhile
            | TokenKind::Catch
            | TokenKind::EndTry => Err(Diagnostic::new(
                *line_index + 1,
                tokens[0].column,
                format!("control token outside block: '{}'", tokens[0].lexeme),
            )),
            TokenKind::Long | TokenKind::Byte => self.parse_assignment(line_index, tokens, out),
            TokenKind::Identifier
                if tokens.len() > 1
                    && matches!(
                        tokens[1].kind,
                        TokenKind::Assign | TokenKind::PlusEqual | TokenKind::MinusEqual
                    ) =>
            {
                self.parse_assignment(line_index, tokens, out)
            }
            _ => {
                if find_top_level_assignment_op(tokens).is_some() {
                    self.parse_mutation(line_index, tokens, out)
                } else {
                    self.parse_expression_statement(line_index, tokens, out)
                }
            }
        }
    }

    fn parse_assignment(
        &self,
        line_index: &mut usize,
        tokens: &[Token],
        out: &mut Vec<Stmt>,
    ) -> Result<(), Diagnostic> {
        let line = *line_index + 1;
        let mut declaration = DeclarationType::Inferred;
        let mut cursor = 0usize;

        match tokens[cursor].kind {
            TokenKind::Long => {
                declaration = DeclarationType::Long;
                cursor += 1;
            }
            TokenKind::Byte => {
                declaration = DeclarationType::Byte;
                cursor += 1;
            }
            _ => {}
        }

        if cursor >= tokens.len() || tokens[cursor].kind != TokenKind::Identifier {
            let bad = tokens.get(cursor).unwrap_or(&tokens[0]);
            return Err(Diagnostic::new(line, bad.column, "expected an identifier"));
        }

        let name = tokens[cursor].lexeme.clone();
        cursor += 1;

        if cursor >= tokens.len() {
            return Err(Diagnostic::new(
                line,
                tokens[tokens.len() - 1].column,
                "missing assignment operator",
            ));
        }

        let op = match tokens[cursor].kind {
            TokenKind::Assign => AssignOp::Set,
            TokenKind::PlusEqual => AssignOp::AddAssign,
            TokenKind::MinusEqual => AssignOp::SubAssign,
            _ => {
                return Err(Diagnostic::new(
                    line,
                    tokens[cursor].column,
                    "invalid assignment operator",
                ));
            }
        };

        if declaration != DeclarationType::Inferred && op != AssignOp::Set {
            return Err(Diagnostic::new(
                line,
                tokens[cursor].column,
                "typed declarations only accept '='",
            ));
        }

        cursor += 1;

        if tokens[tokens.len() - 1].kind != TokenKind::Semicolon {
            return Err(Diagnostic::new(
                line,
                tokens[tokens.len() - 1].column,
                "missing ';' at end of assignment",
            ));
        }

        if cursor >= tokens.len() - 1 {
            return Err(Diagnostic::new(
                line,
                tokens[tokens.len() - 1].column,
                "missing expression in assignment",
            ));
        }

        let expr = self.parse_expression(line, &tokens[cursor..tokens.len() - 1])?;

        out.push(Stmt::Assignment {
            name,
            op,
            declaration,
            expr,
        });
        *line_index += 1;
        Ok(())
    }

    fn parse_print(
        &self,
        line_index: &mut usize,
        tokens: &[Token],
        out: &mut Vec<Stmt>,
    ) -> Result<(), Diagnostic> {
        let line = *line_index + 1;
        let newline = tokens[0].kind == TokenKind::Println;

        if tokens.len() < 5 {
            return Err(Diagnostic::new(
                line,
                tokens[0].column,
                "incomplete print statement",
            ));
        }

        if tokens[1].kind != TokenKind::LeftParen {
            return Err(Diagnostic::new(
                line,
                tokens[1].column,
                "expected '(' after print",
            ));
        }

        if tokens[tokens.len() - 1].kind != TokenKind::Semicolon {
            return Err(Diagnostic::new(
                line,
                tokens[tokens.len() - 1].column,
                "missing ';' at end of print",
            ));
        }

        let mut depth = 0i32;
        let mut closing = tokens.len();
        for (i, token) in tokens.iter().enumerate().skip(1) {
            match token.kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        closing = i;
                        break;
                    }
                }
                _ => {}
            }
        }

        if closing != tokens.len() - 2 {
            return Err(Diagnostic::new(
                line,
                tokens[tokens.len() - 1].column,
                "print requires ')' before ';'",
            ));
        }

        if closing <= 2 {
            return Err(Diagnostic::new(
                line,
                tokens[1].column,
                "print requires an inner expression",
            ));
        }

        let expr = self.parse_expression(line, &tokens[2..closing])?;

        out.push(Stmt::Print { expr, newline });
        *line_index += 1;
        Ok(())
    }

    fn parse_if(
        &self,
        line_index: &mut usize,
        tokens: &[Token],
        out: &mut Vec<Stmt>,
    ) -> Result<(), Diagnostic> {
        let line = *line_index + 1;

        if tokens.len() < 3 {
            return Err(Diagnostic::new(
                line,
                tokens[0].column,
                "incomplete if statement",
            ));
        }

        if tokens[tokens.len() - 1].kind != TokenKind::Colon {
            return Err(Diagnostic::new(
                line,
                tokens[tokens.len() - 1].column,
                "missing ':' at end of if",
            ));
        }

        let condition = self.parse_expression(line, &tokens[1..tokens.len() - 1])?;
        let mut then_branch = Vec::new();
        let mut else_branch = Vec::new();

        *line_index += 1;
        self.parse_block(
            line_index,
            &[TokenKind::Else, TokenKind::EndIf],
            &mut then_branch,
        )?;

        if *line_index >= self.lines.len() {
            return Err(Diagnostic::new(
                *line_index,
                1,
                "missing 'endif' to close if block",
            ));
        }

        let mut control = tokenize_line(&self.lines[*line_index]);

        if control[0].kind == TokenKind::Else {
            if control[control.len() - 1].kind != TokenKind::Colon {
                return Err(Diagnostic::new(
                    *line_index + 1,
                    control[control.len() - 1].column,
                    "missing ':' at end of else",
                ));
            }

            *line_index += 1;
            self.parse_block(
                line_index,
                &[TokenKind::Else, TokenKind::EndIf],
                &mut else_branch,
            )?;

            if *line_index >= self.lines.len() {
                return Err(Diagnostic::new(
                    *line_index,
                    1,
                    "missing 'endif' to close else block",
                ));
            }

            control = tokenize_line(&self.lines[*line_index]);
            if control[0].kind != TokenKind::EndIf {
                return Err(Diagnostic::new(
                    *line_index + 1,
                    control[0].column,
                    "expected 'endif' after else",
                ));
            }
        }

        if control[0].kind != TokenKind::EndIf {
            return Err(Diagnostic::new(
                *line_index + 1,
                control[0].column,
                "expected 'endif'",
            ));
        }

        out.push(Stmt::If {
            condition,
            then_branch,
            else_branch,
        });
        *line_index += 1;
        Ok(())
    }

    fn parse_while(
        &self,
        line_index: &mut usize,
        tokens: &[Token],
        out: &mut Vec<Stmt>,
    ) -> Result<(), Diagnostic> {
        let line = *line_index + 1;

        if tokens.len() < 3 {
            return Err(Diagnostic::new(
                line,
                tokens[0].column,
                "incomplete while statement",
            ));
        }

        if tokens[tokens.len() - 1].kind != TokenKind::Colon {
            return Err(Diagnostic::new(
                line,
                tokens[tokens.len() - 1].column,
                "missing ':' at end of while",
            ));
        }

        let condition = self.parse_expression(line, &tokens[1..tokens.len() - 1])?;
        let mut body = Vec::new();

        *line_index += 1;
        self.parse_block(line_index, &[TokenKind::EndWhile], &mut body)?;

        if *line_index >= self.lines.len() {
            return Err(Diagnostic::new(
                *line_index,
                1,
                "missing 'endwhile' to close while block",
            ));
        }

        let control = tokenize_line(&self.lines[*line_index]);
        if control.len() != 1 {
            return Err(Diagnostic::new(
                *line_index + 1,
                control[1].column,
                "'endwhile' accepts no extra tokens",
            ));
        }

        out.push(Stmt::While { condition, body });
        *line_index += 1;
        Ok(())
    }

    fn parse_function(
        &self,
        line_index: &mut usize,
        tokens: &[Token],
        out: &mut Vec<Stmt>,
    ) -> Result<(), Diagnostic> {
        let line = *line_index + 1;

        if tokens.len() < 5 {
            return Err(Diagnostic::new(
                line,
                tokens[0].column,
                "incomplete function declaration",
            ));
        }

        if tokens[1].kind != TokenKind::Identifier {
            return Err(Diagnostic::new(
                line,
                tokens[1].column,
                "missing valid function name",
            ));
        }

        if tokens[2].kind != TokenKind::LeftParen {
            return Err(Diagnostic::new(
                line,
                tokens[2].column,
                "expected '(' in function declaration",
            ));
        }

        if tokens[tokens.len() - 1].kind != TokenKind::Colon {
            return Err(Diagnostic::new(
                line,
                tokens[tokens.len() - 1].column,
                "missing ':' at end of function declaration",
            ));
        }

        let name = tokens[1].lexeme.clone();
        let mut params = Vec::new();
        let mut cursor = 3usize;

        while cursor < tokens.len() {
            if tokens[cursor].kind == TokenKind::RightParen {
                cursor += 1;
                break;
            }

            let mut by_reference = false;
            if tokens[cursor].kind == TokenKind::Ampersand {
                by_reference = true;
                cursor += 1;
            }

            if cursor >= tokens.len() || tokens[cursor].kind != TokenKind::Identifier {
                let bad = tokens.get(cursor).unwrap_or(&tokens[tokens.len() - 1]);
                return Err(Diagnostic::new(
                    line,
                    bad.column,
                    "invalid parameter in function declaration",
                ));
            }

            params.push(FunctionParam {
                name: tokens[cursor].lexeme.clone(),
                by_reference,
            });
            cursor += 1;

            if cursor < tokens.len() && tokens[cursor].kind == TokenKind::Comma {
                cursor += 1;
                continue;
            }

            if cursor < tokens.len() && tokens[cursor].kind == TokenKind::RightParen {
                continue;
            }

            if cursor >= tokens.len() {
                break;
            }

            return Err(Diagnostic::new(
                line,
                tokens[cursor].column,
                "expected ',' or ')' in function parameters",
            ));
        }

        if cursor >= tokens.len() || tokens[cursor].kind != TokenKind::Colon {
            let bad = tokens.get(cursor).unwrap_or(&tokens[tokens.len() - 1]);
            return Err(Diagnostic::new(
                line,
                bad.column,
                "invalid function declaration: missing final ':'",
            ));
        }

        if cursor != tokens.len() - 1 {
            return Err(Diagnostic::new(
                line,
                tokens[cursor + 1].column,
                "extra tokens after function declaration",
            ));
        }

        let mut body = Vec::new();
        *line_index += 1;
        self.parse_block(line_index, &[TokenKind::EndFunc], &mut body)?;

        if *line_index >= self.lines.len() {
            return Err(Diagnostic::new(
                *line_index,
                1,
                format!("missing 'endfunc' to close function '{}'", name),
            ));
        }

        let control = tokenize_line(&self.lines[*line_index]);
        if control.len() != 1 {
            return Err(Diagnostic::new(
                *line_index + 1,
                control[1].column,
                "'endfunc' accepts no extra tokens",
            ));
        }

        out.push(Stmt::FunctionDecl(Rc::new(FunctionDecl {
            name,
            params,
            body,
        })));
        *line_index += 1;
        Ok(())
    }

    fn parse_import(
        &self,
        line_index: &mut usize,
        tokens: &[Token],
        out: &mut Vec<Stmt>,
    ) -> Result<(), Diagnostic> {
        if tokens.len() != 3
            || tokens[1].kind != TokenKind::Identifier
            || tokens[2].kind != TokenKind::Semicolon
        {
            return Err(Diagnostic::new(
                *line_index + 1,
                tokens[0].column,
                "invalid import format; use: import module;",
            ));
        }

        out.push(Stmt::Import {
            module: tokens[1].lexeme.clone(),
        });
        *line_index += 1;
        Ok(())
    }

    fn parse_return(
        &self,
        line_index: &mut usize,
        tokens: &[Token],
        out: &mut Vec<Stmt>,
    ) -> Result<(), Diagnostic> {
        let line = *line_index + 1;

        if tokens.len() < 2 || tokens[tokens.len() - 1].kind != TokenKind::Semicolon {
            return Err(Diagnostic::new(
                line,
                tokens[0].column,
                "invalid return format; use: return; or return expr;",
            ));
        }

        let expr = if tokens.len() > 2 {
            Some(self.parse_expression(line, &tokens[1..tokens.len() - 1])?)
        } else {
            None
        };

        out.push(Stmt::Return { expr });
        *line_index += 1;
        Ok(())
    }

    fn parse_try(
        &self,
        line_index: &mut usize,
        tokens: &[Token],
        out: &mut Vec<Stmt>,
    ) -> Result<(), Diagnostic> {
        if tokens.len() != 2 || tokens[1].kind != TokenKind::Colon {
            return Err(Diagnostic::new(
                *line_index + 1,
                tokens[0].column,
                "invalid try format; use: try:",
            ));
        }

        let mut try_branch = Vec::new();
        *line_index += 1;
        self.parse_block(
            line_index,
            &[TokenKind::Catch, TokenKind::EndTry],
            &mut try_branch,
        )?;

        if *line_index >= self.lines.len() {
            return Err(Diagnostic::new(
                *line_index,
                1,
                "missing 'catch:' to close try block",
            ));
        }

        let control = tokenize_line(&self.lines[*line_index]);
        if control[0].kind != TokenKind::Catch {
            return Err(Diagnostic::new(
                *line_index + 1,
                control[0].column,
                "expected 'catch:' after try",
            ));
        }

        if control[control.len() - 1].kind != TokenKind::Colon {
            return Err(Diagnostic::new(
                *line_index + 1,
                control[control.len() - 1].column,
                "missing ':' at end of catch",
            ));
        }

        let error_binding = if control.len() == 2 {
            None
        } else if control.len() == 5
            && control[1].kind == TokenKind::LeftParen
            && control[2].kind == TokenKind::Identifier
            && control[3].kind == TokenKind::RightParen
        {
            Some(control[2].lexeme.clone())
        } else {
            return Err(Diagnostic::new(
                *line_index + 1,
                control[0].column,
                "invalid catch format; use: catch: or catch(error):",
            ));
        };

        let mut catch_branch = Vec::new();
        *line_index += 1;
        self.parse_block(
            line_index,
            &[TokenKind::EndTry, TokenKind::Catch],
            &mut catch_branch,
        )?;

        if *line_index >= self.lines.len() {
            return Err(Diagnostic::new(
                *line_index,
                1,
                "missing 'endtry' to close try/catch block",
            ));
        }

        let control = tokenize_line(&self.lines[*line_index]);
        if control[0].kind == TokenKind::Catch {
            return Err(Diagnostic::new(
                *line_index + 1,
                control[0].column,
                "only one catch is allowed per try block",
            ));
        }

        if control.len() != 1 {
            return Err(Diagnostic::new(
                *line_index + 1,
                control[1].column,
                "'endtry' accepts no extra tokens",
            ));
        }

        out.push(Stmt::TryCatch {
            try_branch,
            error_binding,
            catch_branch,
        });
        *line_index += 1;
        Ok(())
    }

    fn parse_mutation(
        &self,
        line_index: &mut usize,
        tokens: &[Token],
        out: &mut Vec<Stmt>,
    ) -> Result<(), Diagnostic> {
        let line = *line_index + 1;

        if tokens.len() < 4 {
            return Err(Diagnostic::new(
                line,
                tokens[0].column,
                "incomplete mutation statement",
            ));
        }

        if tokens[tokens.len() - 1].kind != TokenKind::Semicolon {
            return Err(Diagnostic::new(
                line,
                tokens[tokens.len() - 1].column,
                "missing ';' at end of mutation",
            ));
        }

        let Some((operator_index, op)) = find_top_level_assignment_op(tokens) else {
            return Err(Diagnostic::new(
                line,
                tokens[0].column,
                "no assignment operator found for mutation",
            ));
        };

        if operator_index == 0 || operator_index + 1 >= tokens.len() - 1 {
            return Err(Diagnostic::new(
                line,
                tokens[operator_index].column,
                "mutation is missing an expression on one side of the assignment",
            ));
        }

        let target = self.parse_expression(line, &tokens[..operator_index])?;
        let expr = self.parse_expression(line, &tokens[operator_index + 1..tokens.len() - 1])?;

        if !matches!(target, Expr::Variable(_) | Expr::Index { .. }) {
            return Err(Diagnostic::new(
                line,
                tokens[0].column,
                "left side of a mutation must be a variable or index expression",
            ));
        }

        out.push(Stmt::Mutation { target, op, expr });
        *line_index += 1;
        Ok(())
    }

    fn parse_expression_statement(
        &self,
        line_index: &mut usize,
        tokens: &[Token],
        out: &mut Vec<Stmt>,
    ) -> Result<(), Diagnostic> {
        let line = *line_index + 1;

        let mut expression_tokens = tokens;
        if tokens[tokens.len() - 1].kind == TokenKind::Semicolon {
            expression_tokens = &tokens[..tokens.len() - 1];
        }

        if expression_tokens.is_empty() {
            return Err(Diagnostic::new(
                line,
                tokens[0].column,
                "empty expression statement",
            ));
        }

        let expr = self.parse_expression(line, expression_tokens)?;

        out.push(Stmt::Expression(expr));
        *line_index += 1;
        Ok(())
    }

    /// Parse one line's worth of tokens as an expression
    fn parse_expression(&self, line: usize, tokens: &[Token]) -> Result<Expr, Diagnostic> {
        ExprParser::new(line, tokens).parse()
    }
}

/// Map an assignment token to its operator
fn token_to_assignment_op(kind: TokenKind) -> Option<AssignOp> {
    match kind {
        TokenKind::Assign => Some(AssignOp::Set),
        TokenKind::PlusEqual => Some(AssignOp::AddAssign),
        TokenKind::MinusEqual => Some(AssignOp::SubAssign),
        _ => None,
    }
}

/// Scan for an assignment operator at bracket depth zero across `()`, `[]`
/// and `{}`. Used to tell a mutation statement from an expression statement.
fn find_top_level_assignment_op(tokens: &[Token]) -> Option<(usize, AssignOp)> {
    let mut paren_depth = 0i32;
    let mut bracket_depth = 0i32;
    let mut brace_depth = 0i32;

    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LeftParen => paren_depth += 1,
            TokenKind::RightParen => paren_depth -= 1,
            TokenKind::LeftBracket => bracket_depth += 1,
            TokenKind::RightBracket => bracket_depth -= 1,
            TokenKind::LeftBrace => brace_depth += 1,
            TokenKind::RightBrace => brace_depth -= 1,
            kind if paren_depth == 0 && bracket_depth == 0 && brace_depth == 0 => {
                if let Some(op) = token_to_assignment_op(kind) {
                    return Some((i, op));
                }
            }
            _ => {}
        }
    }

    None
}

/// Precedence-climbing expression parser over a single line's tokens
struct ExprParser<'a> {
    line: usize,
    tokens: &'a [Token],
    cursor: usize,
}

impl<'a> ExprParser<'a> {
    fn new(line: usize, tokens: &'a [Token]) -> Self {
        Self {
            line,
            tokens,
            cursor: 0,
        }
    }

    fn parse(mut self) -> Result<Expr, Diagnostic> {
        let expression = self.logical_or()?;

        if !self.at_end() {
            let token = self.peek();
            return Err(self.fail(
                token.column,
                format!("unexpected token in expression: '{}'", token.lexeme),
            ));
        }

        Ok(expression)
    }

    fn logical_or(&mut self) -> Result<Expr, Diagnostic> {
        let mut expression = self.logical_and()?;
        while self.match_kind(TokenKind::Or) {
            let rhs = self.logical_and()?;
            expression = binary(BinaryOp::LogicalOr, expression, rhs);
        }
        Ok(expression)
    }

    fn logical_and(&mut self) -> Result<Expr, Diagnostic> {
        let mut expression = self.equality()?;
        while self.match_kind(TokenKind::And) {
            let rhs = self.equality()?;
            expression = binary(BinaryOp::LogicalAnd, expression, rhs);
        }
        Ok(expression)
    }

    fn equality(&mut self) -> Result<Expr, Diagnostic> {
        let mut expression = self.comparison()?;
        loop {
            let op = if self.match_kind(TokenKind::EqualEqual) {
                BinaryOp::Equal
            } else if self.match_kind(TokenKind::BangEqual) {
                BinaryOp::NotEqual
            } else {
                break;
            };
            let rhs = self.comparison()?;
            expression = binary(op, expression, rhs);
        }
        Ok(expression)
    }

    fn comparison(&mut self) -> Result<Expr, Diagnostic> {
        let mut expression = self.term()?;
        loop {
            let op = if self.match_kind(TokenKind::Less) {
                BinaryOp::Less
            } else if self.match_kind(TokenKind::LessEqual) {
                BinaryOp::LessEqual
            } else if self.match_kind(TokenKind::Greater) {
                BinaryOp::Greater
            } else if self.match_kind(TokenKind::GreaterEqual) {
                BinaryOp::GreaterEqual
            } else {
                break;
            };
            let rhs = self.term()?;
            expression = binary(op, expression, rhs);
        }
        Ok(expression)
    }

    fn term(&mut self) -> Result<Expr, Diagnostic> {
        let mut expression = self.factor()?;
        loop {
            let op = if self.match_kind(TokenKind::Plus) {
                BinaryOp::Add
            } else if self.match_kind(TokenKind::Minus) {
                BinaryOp::Subtract
            } else {
                break;
            };
            let rhs = self.factor()?;
            expression = binary(op, expression, rhs);
        }
        Ok(expression)
    }

    fn factor(&mut self) -> Result<Expr, Diagnostic> {
        let mut expression = self.unary()?;
        loop {
            let op = if self.match_kind(TokenKind::Star) {
                BinaryOp::Multiply
            } else if self.match_kind(TokenKind::Slash) {
                BinaryOp::Divide
            } else if self.match_kind(TokenKind::Percent) {
                BinaryOp::Modulo
            } else {
                break;
            };
            let rhs = self.unary()?;
            expression = binary(op, expression, rhs);
        }
        Ok(expression)
    }

    fn unary(&mut self) -> Result<Expr, Diagnostic> {
        let op = if self.match_kind(TokenKind::Not) {
            Some(UnaryOp::LogicalNot)
        } else if self.match_kind(TokenKind::Minus) {
            Some(UnaryOp::Negate)
        } else if self.match_kind(TokenKind::Plus) {
            Some(UnaryOp::Plus)
        } else {
            None
        };

        if let Some(op) = op {
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }

        self.power()
    }

    /// `^` binds tighter than prefix unary and is right-associative; the
    /// exponent may itself carry a prefix (`2 ^ -3`).
    fn power(&mut self) -> Result<Expr, Diagnostic> {
        let expression = self.postfix()?;

        if self.match_kind(TokenKind::Caret) {
            let rhs = self.unary()?;
            return Ok(binary(BinaryOp::Power, expression, rhs));
        }

        Ok(expression)
    }

    fn postfix(&mut self) -> Result<Expr, Diagnostic> {
        let mut expression = self.primary()?;

        while !self.at_end() {
            if self.match_kind(TokenKind::LeftParen) {
                let Expr::Variable(callee) = expression else {
                    let token = self.previous();
                    return Err(self.fail(
                        token.column,
                        "only identifiers can be invoked as functions",
                    ));
                };

                let mut arguments = Vec::new();
                if !self.check(TokenKind::RightParen) {
                    loop {
                        let by_reference = self.match_kind(TokenKind::Ampersand);
                        let value = self.logical_or()?;
                        arguments.push(CallArgument {
                            by_reference,
                            value,
                        });

                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                }

                if !self.match_kind(TokenKind::RightParen) {
                    let column = self.error_column();
                    return Err(self.fail(column, "missing ')' to close function call"));
                }

                expression = Expr::Call(CallExpr { callee, arguments });
                continue;
            }

            if self.match_kind(TokenKind::LeftBracket) {
                let index = self.logical_or()?;

                if !self.match_kind(TokenKind::RightBracket) {
                    let column = self.error_column();
                    return Err(self.fail(column, "missing ']' to close list index"));
                }

                expression = Expr::Index {
                    collection: Box::new(expression),
                    index: Box::new(index),
                };
                continue;
            }

            break;
        }

        Ok(expression)
    }

    fn primary(&mut self) -> Result<Expr, Diagnostic> {
        if self.at_end() {
            return Err(self.fail(1, "incomplete expression"));
        }

        let token = self.advance().clone();

        match token.kind {
            TokenKind::Number => {
                let value: f64 = token.lexeme.parse().map_err(|_| {
                    self.fail(token.column, format!("invalid number: '{}'", token.lexeme))
                })?;
                let exact = if token.lexeme.contains('.') {
                    None
                } else {
                    token.lexeme.parse::<i64>().ok()
                };
                Ok(Expr::Number { value, exact })
            }
            TokenKind::Str => Ok(Expr::Str(token.lexeme)),
            TokenKind::Boolean => Ok(Expr::Bool(token.lexeme == "true")),
            TokenKind::Identifier => Ok(Expr::Variable(token.lexeme)),
            TokenKind::LeftParen => {
                let expression = self.logical_or()?;

                if !self.match_kind(TokenKind::RightParen) {
                    let column = self.error_column();
                    return Err(self.fail(column, "missing ')' in expression"));
                }

                Ok(expression)
            }
            TokenKind::LeftBracket => {
                let mut elements = Vec::new();

                if !self.check(TokenKind::RightBracket) {
                    loop {
                        elements.push(self.logical_or()?);
                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                }

                if !self.match_kind(TokenKind::RightBracket) {
                    let column = self.error_column();
                    return Err(self.fail(column, "missing ']' to close list literal"));
                }

                Ok(Expr::List(elements))
            }
            TokenKind::LeftBrace => {
                let mut entries = Vec::new();

                if !self.check(TokenKind::RightBrace) {
                    loop {
                        if self.at_end() {
                            return Err(self.fail(token.column, "incomplete object literal"));
                        }

                        let key_token = self.advance().clone();
                        if key_token.kind != TokenKind::Identifier
                            && key_token.kind != TokenKind::Str
                        {
                            return Err(self.fail(
                                key_token.column,
                                format!("invalid object key: '{}'", key_token.lexeme),
                            ));
                        }

                        if !self.match_kind(TokenKind::Colon) {
                            let column = self.error_column();
                            return Err(self.fail(column, "missing ':' after object key"));
                        }

                        let value = self.logical_or()?;
                        entries.push(ObjectEntry {
                            key: key_token.lexeme,
                            value,
                        });

                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                }

                if !self.match_kind(TokenKind::RightBrace) {
                    let column = self.error_column();
                    return Err(self.fail(column, "missing '}' to close object literal"));
                }

                Ok(Expr::Object(entries))
            }
            _ => Err(self.fail(
                token.column,
                format!("unsupported token in expression: '{}'", token.lexeme),
            )),
        }
    }

    fn at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.cursor]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.cursor - 1]
    }

    fn advance(&mut self) -> &Token {
        let token = &self.tokens[self.cursor];
        self.cursor += 1;
        token
    }

    fn check(&self, expected: TokenKind) -> bool {
        !self.at_end() && self.tokens[self.cursor].kind == expected
    }

    fn match_kind(&mut self, expected: TokenKind) -> bool {
        if !self.check(expected) {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Column to blame when the current position is missing a closer
    fn error_column(&self) -> usize {
        if self.at_end() {
            self.previous().column
        } else {
            self.peek().column
        }
    }

    fn fail(&self, column: usize, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(self.line, column, message)
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
